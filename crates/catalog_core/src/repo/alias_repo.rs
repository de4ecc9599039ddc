//! Alias index: alias-name to owning-tag lookups and alias row writes.
//!
//! # Responsibility
//! - Resolve an alias string to its row (exact, case-sensitive match).
//! - Create and delete alias rows inside a caller-owned transaction.
//!
//! # Invariants
//! - `tag_alias.name` is unique across all tags; the UNIQUE index is the
//!   last line of defense behind service-level validation.
//! - Per-tag listing order is `id ASC` (creation order).

use crate::model::tag::{AliasId, TagAlias, TagId};
use crate::repo::{ensure_catalog_schema, is_unique_violation, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

const ALIAS_SELECT_SQL: &str = "SELECT id, tag_id, name FROM tag_alias";
pub(crate) const ALIAS_COLUMNS: &[&str] = &["id", "tag_id", "name"];

/// Repository interface for alias reads.
pub trait AliasRepository {
    /// Finds the alias row whose name equals `name` exactly.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<TagAlias>>;
    /// Lists all aliases owned by one tag.
    fn list_by_tag(&self, tag_id: TagId) -> RepoResult<Vec<TagAlias>>;
}

/// SQLite-backed alias repository.
///
/// Also usable on a `Transaction` (via deref) to observe uncommitted rows.
pub struct SqliteAliasRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAliasRepository<'conn> {
    /// Wraps a connection already known to be migrated.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after verifying the alias schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_schema(conn, &[("tag_alias", ALIAS_COLUMNS)])?;
        Ok(Self::new(conn))
    }
}

impl AliasRepository for SqliteAliasRepository<'_> {
    fn find_by_name(&self, name: &str) -> RepoResult<Option<TagAlias>> {
        let alias = self
            .conn
            .query_row(
                &format!("{ALIAS_SELECT_SQL} WHERE name = ?1;"),
                [name],
                parse_alias_row,
            )
            .optional()?;
        Ok(alias)
    }

    fn list_by_tag(&self, tag_id: TagId) -> RepoResult<Vec<TagAlias>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ALIAS_SELECT_SQL} WHERE tag_id = ?1 ORDER BY id ASC;"))?;
        let rows = stmt.query_map([tag_id], parse_alias_row)?;
        let mut aliases = Vec::new();
        for row in rows {
            aliases.push(row?);
        }
        Ok(aliases)
    }
}

/// Inserts one alias row for `tag_id` and returns its id.
///
/// Callers pre-check with [`AliasRepository::find_by_name`]; a name that
/// appeared in between fails with [`RepoError::DuplicateAlias`].
pub fn create_alias(tx: &Transaction<'_>, tag_id: TagId, name: &str) -> RepoResult<AliasId> {
    match tx.execute(
        "INSERT INTO tag_alias (tag_id, name) VALUES (?1, ?2);",
        params![tag_id, name],
    ) {
        Ok(_) => Ok(tx.last_insert_rowid()),
        Err(err) if is_unique_violation(&err, "tag_alias", "name") => {
            Err(RepoError::DuplicateAlias(name.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Deletes one alias row. Deleting an absent row is reported as invalid data.
pub fn delete_alias(tx: &Transaction<'_>, alias_id: AliasId) -> RepoResult<()> {
    let changed = tx.execute("DELETE FROM tag_alias WHERE id = ?1;", [alias_id])?;
    if changed == 0 {
        return Err(RepoError::InvalidData(format!(
            "alias {alias_id} vanished before delete"
        )));
    }
    Ok(())
}

/// Deletes every alias owned by `tag_id` and returns the number removed.
pub fn delete_aliases_for_tag(tx: &Transaction<'_>, tag_id: TagId) -> RepoResult<usize> {
    let removed = tx.execute("DELETE FROM tag_alias WHERE tag_id = ?1;", [tag_id])?;
    Ok(removed)
}

fn parse_alias_row(row: &Row<'_>) -> rusqlite::Result<TagAlias> {
    Ok(TagAlias {
        id: row.get("id")?,
        tag_id: row.get("tag_id")?,
        name: row.get("name")?,
    })
}
