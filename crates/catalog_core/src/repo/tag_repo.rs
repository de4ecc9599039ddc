//! Tag store: tag root rows and assembled tag views.
//!
//! # Responsibility
//! - Read `tag` rows and assemble `{primary, synonyms, category}` views.
//! - Provide transaction-scoped writes for the tag root row.
//!
//! # Invariants
//! - A view's primary alias is the alias whose id equals
//!   `tag.primary_alias_id`; every other owned alias is a synonym.
//! - A tag without a resolvable primary alias or category is reported as
//!   invalid data instead of a partial view.

use crate::model::category::{Category, CategoryId};
use crate::model::tag::{AliasId, TagAlias, TagId, TagRecord, TagView};
use crate::repo::alias_repo::{AliasRepository, SqliteAliasRepository, ALIAS_COLUMNS};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository, CATEGORY_COLUMNS};
use crate::repo::{ensure_catalog_schema, RepoError, RepoResult, NOW_EPOCH_MS_SQL};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

const TAG_SELECT_SQL: &str =
    "SELECT id, date_modified, primary_alias_id, category_id, description FROM tag";
const TAG_COLUMNS: &[&str] = &[
    "id",
    "date_modified",
    "primary_alias_id",
    "category_id",
    "description",
];

/// Repository interface for tag reads.
pub trait TagRepository {
    /// Loads the raw tag row.
    fn get_record(&self, id: TagId) -> RepoResult<Option<TagRecord>>;
    /// Loads the assembled view of one tag.
    fn get_view(&self, id: TagId) -> RepoResult<Option<TagView>>;
    /// Loads the assembled view of the tag owning alias `name`.
    fn get_view_by_alias(&self, name: &str) -> RepoResult<Option<TagView>>;
    /// Returns the number of tag rows.
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    /// Wraps a connection already known to be migrated.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after verifying tag, alias and category schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_schema(
            conn,
            &[
                ("tag", TAG_COLUMNS),
                ("tag_alias", ALIAS_COLUMNS),
                ("tag_category", CATEGORY_COLUMNS),
            ],
        )?;
        Ok(Self::new(conn))
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn get_record(&self, id: TagId) -> RepoResult<Option<TagRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("{TAG_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_tag_row,
            )
            .optional()?;
        Ok(record)
    }

    fn get_view(&self, id: TagId) -> RepoResult<Option<TagView>> {
        let Some(record) = self.get_record(id)? else {
            return Ok(None);
        };

        let aliases = SqliteAliasRepository::new(self.conn).list_by_tag(record.id)?;
        let category = SqliteCategoryRepository::new(self.conn)
            .get_by_id(record.category_id)?
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "tag {} references missing category {}",
                    record.id, record.category_id
                ))
            })?;

        assemble_view(record, aliases, &category).map(Some)
    }

    fn get_view_by_alias(&self, name: &str) -> RepoResult<Option<TagView>> {
        match SqliteAliasRepository::new(self.conn).find_by_name(name)? {
            Some(alias) => self.get_view(alias.tag_id),
            None => Ok(None),
        }
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tag;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative tag count {count}")))
    }
}

/// Partitions a tag's aliases into primary and synonyms by id.
pub fn assemble_view(
    record: TagRecord,
    aliases: Vec<TagAlias>,
    category: &Category,
) -> RepoResult<TagView> {
    let primary_id = record.primary_alias_id.ok_or_else(|| {
        RepoError::InvalidData(format!("tag {} has no primary alias", record.id))
    })?;

    let mut primary_alias = None;
    let mut synonyms = Vec::with_capacity(aliases.len().saturating_sub(1));
    for alias in aliases {
        if alias.id == primary_id {
            primary_alias = Some(alias.name);
        } else {
            synonyms.push(alias.name);
        }
    }

    let primary_alias = primary_alias.ok_or_else(|| {
        RepoError::InvalidData(format!(
            "tag {} primary alias {primary_id} is not owned by the tag",
            record.id
        ))
    })?;

    Ok(TagView {
        id: record.id,
        primary_alias,
        aliases: synonyms,
        category: category.name.clone(),
        description: record.description,
        date_modified: record.date_modified,
    })
}

/// Inserts a tag row without a primary alias and returns its id.
///
/// The row is only valid once [`set_primary_alias`] runs in the same
/// transaction.
pub fn insert_bare_tag(
    tx: &Transaction<'_>,
    category_id: CategoryId,
    description: Option<&str>,
) -> RepoResult<TagId> {
    tx.execute(
        &format!(
            "INSERT INTO tag (date_modified, primary_alias_id, category_id, description)
             VALUES ({NOW_EPOCH_MS_SQL}, NULL, ?1, ?2);"
        ),
        params![category_id, description],
    )?;
    Ok(tx.last_insert_rowid())
}

/// Points `tag.primary_alias_id` at `alias_id`.
pub fn set_primary_alias(tx: &Transaction<'_>, tag_id: TagId, alias_id: AliasId) -> RepoResult<()> {
    let changed = tx.execute(
        "UPDATE tag SET primary_alias_id = ?1 WHERE id = ?2;",
        params![alias_id, tag_id],
    )?;
    ensure_tag_changed(changed, tag_id)
}

/// Writes category, primary alias and description in one statement.
///
/// `date_modified` is bumped only when `touch` is set.
pub fn write_tag_row(
    tx: &Transaction<'_>,
    tag_id: TagId,
    category_id: CategoryId,
    primary_alias_id: AliasId,
    description: Option<&str>,
    touch: bool,
) -> RepoResult<()> {
    let changed = tx.execute(
        &format!(
            "UPDATE tag
             SET
                category_id = ?1,
                primary_alias_id = ?2,
                description = ?3,
                date_modified = CASE WHEN ?4 = 1 THEN {NOW_EPOCH_MS_SQL} ELSE date_modified END
             WHERE id = ?5;"
        ),
        params![
            category_id,
            primary_alias_id,
            description,
            i64::from(touch),
            tag_id
        ],
    )?;
    ensure_tag_changed(changed, tag_id)
}

/// Deletes the tag root row. Aliases must be removed in the same transaction.
pub fn delete_tag_row(tx: &Transaction<'_>, tag_id: TagId) -> RepoResult<()> {
    let changed = tx.execute("DELETE FROM tag WHERE id = ?1;", [tag_id])?;
    ensure_tag_changed(changed, tag_id)
}

fn ensure_tag_changed(changed: usize, tag_id: TagId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::InvalidData(format!(
            "tag {tag_id} vanished during write"
        )));
    }
    Ok(())
}

fn parse_tag_row(row: &Row<'_>) -> rusqlite::Result<TagRecord> {
    Ok(TagRecord {
        id: row.get("id")?,
        date_modified: row.get("date_modified")?,
        primary_alias_id: row.get("primary_alias_id")?,
        category_id: row.get("category_id")?,
        description: row.get("description")?,
    })
}

#[cfg(test)]
mod tests {
    use super::assemble_view;
    use crate::model::category::Category;
    use crate::model::tag::{TagAlias, TagRecord};
    use crate::repo::RepoError;

    fn category() -> Category {
        Category {
            id: 1,
            name: "genre".to_string(),
            color: "#00FF00".to_string(),
            description: None,
        }
    }

    fn alias(id: i64, name: &str) -> TagAlias {
        TagAlias {
            id,
            tag_id: 7,
            name: name.to_string(),
        }
    }

    fn record(primary_alias_id: Option<i64>) -> TagRecord {
        TagRecord {
            id: 7,
            date_modified: 1_000,
            primary_alias_id,
            category_id: 1,
            description: Some("desc".to_string()),
        }
    }

    #[test]
    fn assemble_splits_primary_from_synonyms() {
        let view = assemble_view(
            record(Some(11)),
            vec![alias(10, "Shmup"), alias(11, "Shooter"), alias(12, "STG")],
            &category(),
        )
        .unwrap();
        assert_eq!(view.primary_alias, "Shooter");
        assert_eq!(view.aliases, vec!["Shmup".to_string(), "STG".to_string()]);
        assert_eq!(view.category, "genre");
    }

    #[test]
    fn assemble_rejects_primary_owned_elsewhere() {
        let err = assemble_view(record(Some(99)), vec![alias(10, "Shmup")], &category())
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn assemble_rejects_missing_primary() {
        let err = assemble_view(record(None), vec![alias(10, "Shmup")], &category()).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }
}
