//! Category store: read-only lookups over `tag_category`.
//!
//! # Invariants
//! - Listing order is `id ASC`, stable across unchanged state.
//! - No write path exists; categories are seeded by migrations or managed
//!   outside the catalog core.

use crate::model::category::{Category, CategoryId};
use crate::repo::{ensure_catalog_schema, RepoResult};
use rusqlite::{Connection, OptionalExtension, Row};

const CATEGORY_SELECT_SQL: &str = "SELECT id, name, color, description FROM tag_category";
pub(crate) const CATEGORY_COLUMNS: &[&str] = &["id", "name", "color", "description"];

/// Repository interface for category lookups.
pub trait CategoryRepository {
    /// Loads one category by row id.
    fn get_by_id(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// Loads one category by exact name.
    fn get_by_name(&self, name: &str) -> RepoResult<Option<Category>>;
    /// Lists every category.
    fn list_all(&self) -> RepoResult<Vec<Category>>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Wraps a connection already known to be migrated.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after verifying the category schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_schema(conn, &[("tag_category", CATEGORY_COLUMNS)])?;
        Ok(Self::new(conn))
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn get_by_id(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let category = self
            .conn
            .query_row(
                &format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_category_row,
            )
            .optional()?;
        Ok(category)
    }

    fn get_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        let category = self
            .conn
            .query_row(
                &format!("{CATEGORY_SELECT_SQL} WHERE name = ?1;"),
                [name],
                parse_category_row,
            )
            .optional()?;
        Ok(category)
    }

    fn list_all(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CATEGORY_SELECT_SQL} ORDER BY id ASC;"))?;
        let rows = stmt.query_map([], parse_category_row)?;
        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }
}

fn parse_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        description: row.get("description")?,
    })
}
