//! Tag catalog core.
//! This crate owns the tag/alias/category invariants: one primary alias per
//! tag, globally unique alias names and one category per tag.

pub mod catalog;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use catalog::{Catalog, CatalogOpenError};
pub use config::{CatalogConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, CategoryId, DEFAULT_CATEGORY_NAME};
pub use model::tag::{AliasId, TagAlias, TagId, TagRecord, TagRef, TagUpdate, TagView};
pub use repo::alias_repo::{AliasRepository, SqliteAliasRepository};
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::tag_repo::{SqliteTagRepository, TagRepository};
pub use repo::{RepoError, RepoResult};
pub use search::tag_search::{search_tags, SearchError, SearchResult, TagSearchQuery};
pub use service::tag_service::{ErrorKind, TagService, TagServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
