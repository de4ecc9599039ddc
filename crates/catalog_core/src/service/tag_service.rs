//! Tag use-case service.
//!
//! # Responsibility
//! - Provide create/update/get/delete entry points for tags.
//! - Own the write transaction around the write coordinator and commit or
//!   roll it back.
//! - Classify failures into not-found, validation, conflict and storage.
//!
//! # Invariants
//! - Validation completes before the write transaction is opened.
//! - Every write either commits fully or rolls back fully.
//! - Successful writes return the view read back after commit.

use crate::model::tag::{TagId, TagRecord, TagRef, TagUpdate, TagView};
use crate::repo::alias_repo::{
    create_alias, delete_aliases_for_tag, AliasRepository, SqliteAliasRepository,
};
use crate::repo::tag_repo::{
    delete_tag_row, insert_bare_tag, set_primary_alias, SqliteTagRepository, TagRepository,
};
use crate::repo::RepoError;
use crate::service::tag_write::{apply_update, validate_update, ApplyOutcome, ValidatedUpdate};
use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Coarse failure classification for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Tag, alias or category is absent.
    NotFound,
    /// Request is malformed or references state it may not touch.
    Validation,
    /// Request collides with another tag's alias.
    Conflict,
    /// Storage failure; the outcome is indeterminate to the caller.
    Storage,
}

/// Service error for tag use-cases.
#[derive(Debug)]
pub enum TagServiceError {
    /// No tag matches the reference.
    TagNotFound(TagRef),
    /// No alias has this exact name.
    AliasNotFound(String),
    /// No category has this id or name.
    CategoryNotFound(String),
    /// Create request without a primary alias.
    PrimaryAliasRequired,
    /// Alias name is blank after normalization.
    BlankAlias(String),
    /// Requested alias already belongs to a different tag.
    AliasOwnedByOtherTag { alias: String, owner: TagId },
    /// Requested category name does not resolve.
    UnknownCategory(String),
    /// Alias already exists (create-time primary collision or a write race).
    AliasConflict(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl TagServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TagNotFound(_) | Self::AliasNotFound(_) | Self::CategoryNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::PrimaryAliasRequired
            | Self::BlankAlias(_)
            | Self::AliasOwnedByOtherTag { .. }
            | Self::UnknownCategory(_) => ErrorKind::Validation,
            Self::AliasConflict(_) => ErrorKind::Conflict,
            Self::Repo(_) | Self::InconsistentState(_) => ErrorKind::Storage,
        }
    }

    /// Whether the caller can fix the failure by changing the request.
    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::Storage
    }

    fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Storage => "storage",
        }
    }
}

impl Display for TagServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TagNotFound(tag_ref) => write!(f, "tag not found: {tag_ref}"),
            Self::AliasNotFound(name) => write!(f, "tag alias not found: `{name}`"),
            Self::CategoryNotFound(key) => write!(f, "tag category not found: `{key}`"),
            Self::PrimaryAliasRequired => write!(f, "primary alias is required"),
            Self::BlankAlias(value) => write!(f, "invalid alias: `{value}`"),
            Self::AliasOwnedByOtherTag { alias, owner } => {
                write!(f, "alias `{alias}` already belongs to tag {owner}")
            }
            Self::UnknownCategory(name) => write!(f, "unknown tag category: `{name}`"),
            Self::AliasConflict(name) => write!(f, "tag with alias `{name}` already exists"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent tag state: {details}"),
        }
    }
}

impl Error for TagServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TagServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateAlias(name) => Self::AliasConflict(name),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for TagServiceError {
    fn from(value: rusqlite::Error) -> Self {
        RepoError::from(value).into()
    }
}

/// Tag service facade over one catalog connection.
pub struct TagService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> TagService<'conn> {
    /// Wraps a connection already known to be migrated.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates a service after verifying the catalog schema.
    pub fn try_new(conn: &'conn mut Connection) -> Result<Self, TagServiceError> {
        SqliteTagRepository::try_new(conn)?;
        Ok(Self::new(conn))
    }

    /// Creates a new tag with its primary alias and optional synonyms.
    ///
    /// Category defaults to `default` when not requested.
    pub fn create_tag(&mut self, update: &TagUpdate) -> Result<TagView, TagServiceError> {
        let started_at = Instant::now();
        let plan = validate_update(self.conn, None, update)
            .inspect_err(|err| log_rejected("tag_create", err))?;
        let primary = plan
            .primary_alias
            .clone()
            .ok_or(TagServiceError::PrimaryAliasRequired)?;
        let category_id = plan
            .category_id
            .ok_or(TagServiceError::InconsistentState("create without category"))?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let written = (|| {
            let tag_id = insert_bare_tag(&tx, category_id, plan.description.as_deref())?;
            let alias_id = create_alias(&tx, tag_id, &primary)?;
            set_primary_alias(&tx, tag_id, alias_id)?;
            let record = load_record_in_tx(&tx, tag_id)?;
            let outcome = apply_update(&tx, &record, &plan)?;
            Ok::<_, TagServiceError>((tag_id, outcome))
        })();
        let (tag_id, outcome) = finish_write(tx, "tag_create", started_at, written)?;

        info!(
            "event=tag_create module=tag_service status=ok tag_id={tag_id} aliases_created={} duration_ms={}",
            outcome.aliases_created + 1,
            started_at.elapsed().as_millis()
        );
        self.read_back(tag_id)
    }

    /// Applies a partial update to the tag addressed by `target`.
    pub fn update_tag(
        &mut self,
        target: &TagRef,
        update: &TagUpdate,
    ) -> Result<TagView, TagServiceError> {
        let started_at = Instant::now();
        let record = self.resolve_record(target)?;
        let plan = validate_update(self.conn, Some(&record), update)
            .inspect_err(|err| log_rejected("tag_update", err))?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let written = apply_in_tx(&tx, record.id, &plan);
        let outcome = finish_write(tx, "tag_update", started_at, written)?;

        info!(
            "event=tag_update module=tag_service status=ok tag_id={} changed={} aliases_created={} aliases_deleted={} duration_ms={}",
            record.id,
            outcome.changed,
            outcome.aliases_created,
            outcome.aliases_deleted,
            started_at.elapsed().as_millis()
        );
        self.read_back(record.id)
    }

    /// Loads the assembled view of one tag.
    pub fn get_tag(&self, target: &TagRef) -> Result<TagView, TagServiceError> {
        load_tag_view(self.conn, target)
    }

    /// Deletes the tag owning `alias_name`, all of its aliases included.
    pub fn delete_tag(&mut self, alias_name: &str) -> Result<(), TagServiceError> {
        let started_at = Instant::now();
        let alias = SqliteAliasRepository::new(self.conn)
            .find_by_name(alias_name)?
            .ok_or_else(|| TagServiceError::AliasNotFound(alias_name.to_string()))?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let written = (|| {
            let removed = delete_aliases_for_tag(&tx, alias.tag_id)?;
            delete_tag_row(&tx, alias.tag_id)?;
            Ok::<_, TagServiceError>(removed)
        })();
        let removed = finish_write(tx, "tag_delete", started_at, written)?;

        info!(
            "event=tag_delete module=tag_service status=ok tag_id={} aliases_deleted={removed} duration_ms={}",
            alias.tag_id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn resolve_record(&self, target: &TagRef) -> Result<TagRecord, TagServiceError> {
        let tag_id = match target {
            TagRef::Id(id) => *id,
            TagRef::Alias(name) => {
                SqliteAliasRepository::new(self.conn)
                    .find_by_name(name)?
                    .ok_or_else(|| TagServiceError::AliasNotFound(name.clone()))?
                    .tag_id
            }
        };
        SqliteTagRepository::new(self.conn)
            .get_record(tag_id)?
            .ok_or_else(|| not_found(target))
    }

    fn read_back(&self, tag_id: TagId) -> Result<TagView, TagServiceError> {
        SqliteTagRepository::new(self.conn)
            .get_view(tag_id)?
            .ok_or(TagServiceError::InconsistentState(
                "written tag not found in read-back",
            ))
    }
}

/// Loads the assembled view addressed by `target` without a transaction.
pub fn load_tag_view(conn: &Connection, target: &TagRef) -> Result<TagView, TagServiceError> {
    let repo = SqliteTagRepository::new(conn);
    let view = match target {
        TagRef::Id(id) => repo.get_view(*id)?,
        TagRef::Alias(name) => repo.get_view_by_alias(name)?,
    };
    view.ok_or_else(|| not_found(target))
}

fn apply_in_tx(
    tx: &Transaction<'_>,
    tag_id: TagId,
    plan: &ValidatedUpdate,
) -> Result<ApplyOutcome, TagServiceError> {
    let record = load_record_in_tx(tx, tag_id)?;
    apply_update(tx, &record, plan)
}

fn load_record_in_tx(tx: &Transaction<'_>, tag_id: TagId) -> Result<TagRecord, TagServiceError> {
    SqliteTagRepository::new(tx)
        .get_record(tag_id)?
        .ok_or(TagServiceError::TagNotFound(TagRef::Id(tag_id)))
}

/// Commits on success, rolls back and logs on failure.
fn finish_write<T>(
    tx: Transaction<'_>,
    event: &'static str,
    started_at: Instant,
    written: Result<T, TagServiceError>,
) -> Result<T, TagServiceError> {
    match written {
        Ok(value) => match tx.commit() {
            Ok(()) => Ok(value),
            Err(err) => {
                error!(
                    "event={event} module=tag_service status=error error_code=commit_failed duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err.into())
            }
        },
        Err(err) => {
            warn!(
                "event={event} module=tag_service status=rollback error_code={} duration_ms={} error={err}",
                err.code(),
                started_at.elapsed().as_millis()
            );
            if let Err(rollback_err) = tx.rollback() {
                error!(
                    "event={event} module=tag_service status=error error_code=rollback_failed error={rollback_err}"
                );
            }
            Err(err)
        }
    }
}

fn log_rejected(event: &'static str, err: &TagServiceError) {
    warn!(
        "event={event} module=tag_service status=rejected error_code={} error={err}",
        err.code()
    );
}

fn not_found(target: &TagRef) -> TagServiceError {
    match target {
        TagRef::Id(_) => TagServiceError::TagNotFound(target.clone()),
        TagRef::Alias(name) => TagServiceError::AliasNotFound(name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, TagServiceError};
    use crate::model::tag::TagRef;
    use crate::repo::RepoError;

    #[test]
    fn kinds_separate_client_errors_from_storage() {
        assert_eq!(
            TagServiceError::TagNotFound(TagRef::Id(3)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            TagServiceError::UnknownCategory("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            TagServiceError::AliasConflict("x".to_string()).kind(),
            ErrorKind::Conflict
        );
        let storage = TagServiceError::Repo(RepoError::InvalidData("x".to_string()));
        assert_eq!(storage.kind(), ErrorKind::Storage);
        assert!(!storage.is_client_error());
    }

    #[test]
    fn duplicate_alias_maps_to_conflict() {
        let err = TagServiceError::from(RepoError::DuplicateAlias("Puzzle".to_string()));
        assert!(matches!(err, TagServiceError::AliasConflict(name) if name == "Puzzle"));
    }
}
