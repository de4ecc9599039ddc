//! Catalog context object.
//!
//! # Responsibility
//! - Own the single SQLite connection every catalog operation runs on.
//! - Expose the tag, category and search use-cases as one library surface.
//!
//! # Invariants
//! - No process-global store handle exists; callers construct and pass a
//!   `Catalog` explicitly.
//! - Reads never open transactions; writes go through `TagService`.

use crate::config::CatalogConfig;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::logging::init_logging;
use crate::model::category::{Category, CategoryId};
use crate::model::tag::{TagRef, TagUpdate, TagView};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::RepoError;
use crate::search::tag_search::{search_tags, SearchResult, TagSearchQuery};
use crate::service::tag_service::{load_tag_view, TagService, TagServiceError};
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Errors from opening or closing a catalog.
#[derive(Debug)]
pub enum CatalogOpenError {
    Db(DbError),
    Repo(RepoError),
    Logging(crate::logging::LoggingError),
}

impl Display for CatalogOpenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogOpenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Logging(err) => Some(err),
        }
    }
}

impl From<DbError> for CatalogOpenError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CatalogOpenError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Tag catalog bound to one migrated connection.
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Opens (or creates) a catalog database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogOpenError> {
        Self::from_connection(open_db(path)?)
    }

    /// Opens an empty in-memory catalog.
    pub fn open_in_memory() -> Result<Self, CatalogOpenError> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Starts logging when `log_dir` is configured, then opens `db_path`.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogOpenError> {
        if let Some(log_dir) = config.log_dir.as_deref() {
            init_logging(&config.log_level, log_dir).map_err(CatalogOpenError::Logging)?;
        }
        Self::open(&config.db_path)
    }

    fn from_connection(conn: Connection) -> Result<Self, CatalogOpenError> {
        SqliteTagRepository::try_new(&conn)?;
        info!("event=catalog_open module=catalog status=ok");
        Ok(Self { conn })
    }

    /// Closes the underlying connection, surfacing close failures.
    pub fn close(self) -> Result<(), CatalogOpenError> {
        self.conn.close().map_err(|(_, err)| {
            warn!("event=catalog_close module=catalog status=error error={err}");
            CatalogOpenError::Db(DbError::Sqlite(err))
        })?;
        info!("event=catalog_close module=catalog status=ok");
        Ok(())
    }

    /// Borrows the tag write/read service.
    pub fn tags(&mut self) -> TagService<'_> {
        TagService::new(&mut self.conn)
    }

    /// Creates a tag. `update.primary_alias` is required.
    pub fn create_tag(&mut self, update: &TagUpdate) -> Result<TagView, TagServiceError> {
        self.tags().create_tag(update)
    }

    /// Updates the tag addressed by id or alias name.
    pub fn update_tag(
        &mut self,
        target: &TagRef,
        update: &TagUpdate,
    ) -> Result<TagView, TagServiceError> {
        self.tags().update_tag(target, update)
    }

    /// Loads one tag by id or alias name.
    pub fn get_tag(&self, target: &TagRef) -> Result<TagView, TagServiceError> {
        load_tag_view(&self.conn, target)
    }

    /// Deletes the tag owning `alias_name` together with all of its aliases.
    pub fn delete_tag(&mut self, alias_name: &str) -> Result<(), TagServiceError> {
        self.tags().delete_tag(alias_name)
    }

    /// Number of tags in the catalog.
    pub fn tag_count(&self) -> Result<u64, TagServiceError> {
        Ok(SqliteTagRepository::new(&self.conn).count()?)
    }

    /// Lists every category in `id` order.
    pub fn list_categories(&self) -> Result<Vec<Category>, TagServiceError> {
        Ok(SqliteCategoryRepository::new(&self.conn).list_all()?)
    }

    pub fn get_category_by_id(&self, id: CategoryId) -> Result<Category, TagServiceError> {
        SqliteCategoryRepository::new(&self.conn)
            .get_by_id(id)?
            .ok_or_else(|| TagServiceError::CategoryNotFound(id.to_string()))
    }

    pub fn get_category_by_name(&self, name: &str) -> Result<Category, TagServiceError> {
        SqliteCategoryRepository::new(&self.conn)
            .get_by_name(name)?
            .ok_or_else(|| TagServiceError::CategoryNotFound(name.to_string()))
    }

    /// Partial alias-name search, one view per matching tag.
    pub fn search_tags(&self, query: &TagSearchQuery) -> SearchResult<Vec<TagView>> {
        search_tags(&self.conn, query)
    }
}
