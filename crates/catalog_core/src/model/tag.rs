//! Tag, alias and update-request models.
//!
//! # Responsibility
//! - Represent raw `tag` and `tag_alias` rows.
//! - Represent the assembled `{primary, synonyms, category}` view.
//! - Normalize user-supplied alias names.
//!
//! # Invariants
//! - `TagRecord::primary_alias_id` names an alias whose `tag_id` is the tag id.
//! - Normalized alias names are never empty.

use crate::model::category::CategoryId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Row id of a `tag` entry.
pub type TagId = i64;

/// Row id of a `tag_alias` entry.
pub type AliasId = i64;

/// Raw `tag` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub id: TagId,
    /// Last modification time in epoch milliseconds.
    pub date_modified: i64,
    /// `None` only transiently, between bare-row insert and primary patch.
    pub primary_alias_id: Option<AliasId>,
    pub category_id: CategoryId,
    pub description: Option<String>,
}

/// Raw `tag_alias` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagAlias {
    pub id: AliasId,
    pub tag_id: TagId,
    pub name: String,
}

/// Assembled tag read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagView {
    /// Stable tag id.
    pub id: TagId,
    /// Canonical display name.
    #[serde(rename = "name")]
    pub primary_alias: String,
    /// Synonyms only, in alias creation order. Never contains the primary.
    pub aliases: Vec<String>,
    /// Category name.
    pub category: String,
    pub description: Option<String>,
    /// Last modification time in epoch milliseconds.
    pub date_modified: i64,
}

/// Partial create/update description.
///
/// Absent fields leave the corresponding state untouched (update) or fall
/// back to defaults (create).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUpdate {
    /// New canonical name. Required on create.
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub primary_alias: Option<String>,
    /// Full requested synonym set. Supplying it triggers reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    /// Category name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TagUpdate {
    /// Starts a create request for the given primary alias.
    pub fn named(primary_alias: impl Into<String>) -> Self {
        Self {
            primary_alias: Some(primary_alias.into()),
            ..Self::default()
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Addresses one tag either by row id or by any of its alias names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRef {
    Id(TagId),
    Alias(String),
}

impl TagRef {
    /// Interprets a path-style token: integers are ids, anything else is an alias.
    pub fn parse(token: &str) -> Self {
        match token.trim().parse::<TagId>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Alias(token.to_string()),
        }
    }
}

impl Display for TagRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Alias(name) => write!(f, "alias=`{name}`"),
        }
    }
}

/// Trims an alias name and collapses internal whitespace runs.
///
/// Returns `None` when nothing remains.
pub fn normalize_alias_name(name: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(name.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

/// Case-insensitive alias comparison used by reconciliation.
pub fn alias_names_match(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
