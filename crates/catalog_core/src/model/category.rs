//! Tag category model.

use serde::{Deserialize, Serialize};

/// Row id of a `tag_category` entry.
pub type CategoryId = i64;

/// Name of the category assigned to newly created tags that request none.
pub const DEFAULT_CATEGORY_NAME: &str = "default";

/// Grouping classification referenced by tags.
///
/// Categories are read-only from the catalog's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable row id.
    pub id: CategoryId,
    /// Unique display name.
    pub name: String,
    /// Display color, usually a `#RRGGBB` string.
    pub color: String,
    /// Optional free-form description.
    pub description: Option<String>,
}
