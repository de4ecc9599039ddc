//! Tag write coordinator: validate-then-apply for create and update.
//!
//! # Responsibility
//! - Phase 1 ([`validate_update`]): pure reads that reject the request
//!   before anything is written.
//! - Phase 2 ([`apply_update`]): alias creation, reconciliation and the tag
//!   row write, all inside the caller's transaction.
//!
//! # Invariants
//! - Validation never mutates; a rejected request leaves every table as-is.
//! - Validation runs outside the write transaction. A concurrent writer can
//!   claim an alias between the phases; apply then fails with a conflict and
//!   the caller's transaction rolls back.
//! - After apply, `primary_alias_id` names an alias owned by the tag.

use crate::model::category::{CategoryId, DEFAULT_CATEGORY_NAME};
use crate::model::tag::{
    alias_names_match, normalize_alias_name, AliasId, TagAlias, TagRecord, TagUpdate,
};
use crate::repo::alias_repo::{create_alias, delete_alias, AliasRepository, SqliteAliasRepository};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::tag_repo::write_tag_row;
use crate::service::tag_service::TagServiceError;
use log::debug;
use rusqlite::{Connection, Transaction};

/// Update request after normalization and Phase 1 lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpdate {
    /// Normalized primary alias, when one was requested.
    pub primary_alias: Option<String>,
    /// Normalized, de-duplicated synonym set, when one was supplied.
    pub aliases: Option<Vec<String>>,
    /// Resolved category, when one was requested (or defaulted on create).
    pub category_id: Option<CategoryId>,
    pub description: Option<String>,
}

/// What Phase 2 actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub aliases_created: usize,
    pub aliases_deleted: usize,
    /// Whether any tag-row field or alias changed.
    pub changed: bool,
}

/// Phase 1: validates `update` against `target` (or a new tag when `None`).
///
/// # Errors
/// - `PrimaryAliasRequired` when creating without a primary alias.
/// - `BlankAlias` for names that normalize to nothing.
/// - `AliasConflict` when a new tag's primary alias already exists.
/// - `AliasOwnedByOtherTag` when any requested alias belongs to another tag.
/// - `UnknownCategory` when the category name does not resolve.
pub fn validate_update(
    conn: &Connection,
    target: Option<&TagRecord>,
    update: &TagUpdate,
) -> Result<ValidatedUpdate, TagServiceError> {
    let target_id = target.map(|tag| tag.id);
    let creating = target.is_none();

    let primary_alias = match update.primary_alias.as_deref() {
        Some(raw) => Some(normalize_requested(raw)?),
        None if creating => return Err(TagServiceError::PrimaryAliasRequired),
        None => None,
    };

    let aliases = match update.aliases.as_ref() {
        Some(raw) => {
            let mut normalized: Vec<String> = Vec::with_capacity(raw.len());
            for name in raw {
                let name = normalize_requested(name)?;
                if !normalized.contains(&name) {
                    normalized.push(name);
                }
            }
            Some(normalized)
        }
        None => None,
    };

    let alias_repo = SqliteAliasRepository::new(conn);
    if let Some(name) = primary_alias.as_deref() {
        if let Some(existing) = alias_repo.find_by_name(name)? {
            if creating {
                return Err(TagServiceError::AliasConflict(name.to_string()));
            }
            if Some(existing.tag_id) != target_id {
                return Err(TagServiceError::AliasOwnedByOtherTag {
                    alias: name.to_string(),
                    owner: existing.tag_id,
                });
            }
        }
    }
    for name in aliases.iter().flatten() {
        if let Some(existing) = alias_repo.find_by_name(name)? {
            if Some(existing.tag_id) != target_id {
                return Err(TagServiceError::AliasOwnedByOtherTag {
                    alias: name.clone(),
                    owner: existing.tag_id,
                });
            }
        }
    }

    let requested_category = match update.category.as_deref() {
        Some(name) => Some(name.trim()),
        None if creating => Some(DEFAULT_CATEGORY_NAME),
        None => None,
    };
    let category_id = match requested_category {
        Some(name) => Some(
            SqliteCategoryRepository::new(conn)
                .get_by_name(name)?
                .ok_or_else(|| TagServiceError::UnknownCategory(name.to_string()))?
                .id,
        ),
        None => None,
    };

    Ok(ValidatedUpdate {
        primary_alias,
        aliases,
        category_id,
        description: update.description.clone(),
    })
}

/// Phase 2: applies a validated update to `tag` inside `tx`.
///
/// Does not commit; the transaction owner commits or rolls back.
pub fn apply_update(
    tx: &Transaction<'_>,
    tag: &TagRecord,
    plan: &ValidatedUpdate,
) -> Result<ApplyOutcome, TagServiceError> {
    let alias_repo = SqliteAliasRepository::new(tx);
    let mut outcome = ApplyOutcome::default();

    let current_primary_id = tag
        .primary_alias_id
        .ok_or(TagServiceError::InconsistentState("tag has no primary alias"))?;
    let mut primary_alias_id = current_primary_id;

    if let Some(name) = plan.primary_alias.as_deref() {
        primary_alias_id = match alias_repo.find_by_name(name)? {
            Some(existing) if existing.tag_id == tag.id => existing.id,
            Some(_) => return Err(TagServiceError::AliasConflict(name.to_string())),
            None => {
                let alias_id = create_owned_alias(tx, tag, name)?;
                outcome.aliases_created += 1;
                alias_id
            }
        };
    }

    let category_id = plan.category_id.unwrap_or(tag.category_id);
    let description = plan
        .description
        .as_deref()
        .or(tag.description.as_deref());

    if let Some(requested) = plan.aliases.as_deref() {
        for name in requested {
            match alias_repo.find_by_name(name)? {
                Some(existing) if existing.tag_id == tag.id => {}
                Some(_) => return Err(TagServiceError::AliasConflict(name.clone())),
                None => {
                    create_owned_alias(tx, tag, name)?;
                    outcome.aliases_created += 1;
                }
            }
        }

        for alias in alias_repo.list_by_tag(tag.id)? {
            if !should_keep_alias(
                &alias,
                current_primary_id,
                plan.primary_alias.as_deref(),
                requested,
            ) {
                debug!(
                    "event=alias_delete module=tag_write status=ok tag_id={} alias_id={}",
                    tag.id, alias.id
                );
                delete_alias(tx, alias.id)?;
                outcome.aliases_deleted += 1;
            }
        }
    }

    outcome.changed = outcome.aliases_created > 0
        || outcome.aliases_deleted > 0
        || primary_alias_id != current_primary_id
        || category_id != tag.category_id
        || description != tag.description.as_deref();

    write_tag_row(
        tx,
        tag.id,
        category_id,
        primary_alias_id,
        description,
        outcome.changed,
    )?;

    Ok(outcome)
}

/// Reconciliation keep rule for one alias currently owned by the tag.
///
/// Keeps the alias when its name case-insensitively matches the requested
/// primary or a requested synonym, or when no new primary was requested and
/// it is the current primary.
pub fn should_keep_alias(
    alias: &TagAlias,
    current_primary_id: AliasId,
    requested_primary: Option<&str>,
    requested_aliases: &[String],
) -> bool {
    if let Some(primary) = requested_primary {
        if alias_names_match(primary, &alias.name) {
            return true;
        }
    }
    if requested_aliases
        .iter()
        .any(|name| alias_names_match(name, &alias.name))
    {
        return true;
    }
    requested_primary.is_none() && alias.id == current_primary_id
}

fn create_owned_alias(
    tx: &Transaction<'_>,
    tag: &TagRecord,
    name: &str,
) -> Result<AliasId, TagServiceError> {
    let alias_id = create_alias(tx, tag.id, name)?;
    debug!(
        "event=alias_create module=tag_write status=ok tag_id={} alias_id={alias_id}",
        tag.id
    );
    Ok(alias_id)
}

fn normalize_requested(raw: &str) -> Result<String, TagServiceError> {
    normalize_alias_name(raw).ok_or_else(|| TagServiceError::BlankAlias(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::should_keep_alias;
    use crate::model::tag::TagAlias;

    fn alias(id: i64, name: &str) -> TagAlias {
        TagAlias {
            id,
            tag_id: 1,
            name: name.to_string(),
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn keeps_current_primary_when_no_new_primary_requested() {
        let requested = names(&["b", "d"]);
        assert!(should_keep_alias(&alias(1, "a"), 1, None, &requested));
        assert!(should_keep_alias(&alias(2, "b"), 1, None, &requested));
        assert!(!should_keep_alias(&alias(3, "c"), 1, None, &requested));
    }

    #[test]
    fn drops_old_primary_when_replaced_and_not_requested() {
        let requested = names(&["b"]);
        assert!(!should_keep_alias(&alias(1, "a"), 1, Some("z"), &requested));
        assert!(should_keep_alias(&alias(9, "z"), 1, Some("z"), &requested));
    }

    #[test]
    fn keep_rule_is_case_insensitive() {
        let requested = names(&["Beat 'em up"]);
        assert!(should_keep_alias(&alias(2, "beat 'EM UP"), 1, None, &requested));
        assert!(should_keep_alias(&alias(3, "SHOOTER"), 1, Some("shooter"), &[]));
    }

    #[test]
    fn empty_request_keeps_only_primary() {
        assert!(should_keep_alias(&alias(1, "a"), 1, None, &[]));
        assert!(!should_keep_alias(&alias(2, "b"), 1, None, &[]));
    }
}
