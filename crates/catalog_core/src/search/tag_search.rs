//! Partial-match tag search over alias names.
//!
//! # Invariants
//! - Each owning tag appears at most once, however many of its aliases match.
//! - Result ordering is deterministic: `tag.id ASC`.
//! - The search text is a literal substring; LIKE wildcards in it are escaped.

use crate::db::DbError;
use crate::model::tag::{TagId, TagView};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::RepoError;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for DB interaction and view assembly.
#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
    Repo(RepoError),
    /// A matched tag disappeared or could not be assembled.
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Search options for partial alias matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSearchQuery {
    /// Substring to look for in alias names. Blank matches every tag.
    pub text: String,
    /// Only return tags modified strictly after this epoch-ms instant.
    pub modified_after: Option<i64>,
}

impl TagSearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            modified_after: None,
        }
    }

    pub fn with_modified_after(mut self, epoch_ms: i64) -> Self {
        self.modified_after = Some(epoch_ms);
        self
    }
}

/// Finds tags owning at least one alias that contains `query.text`.
///
/// Case sensitivity follows SQLite `LIKE` (ASCII case-insensitive).
pub fn search_tags(conn: &Connection, query: &TagSearchQuery) -> SearchResult<Vec<TagView>> {
    let mut sql = String::from(
        "SELECT a.tag_id AS tag_id
         FROM tag_alias a
         INNER JOIN tag t ON t.id = a.tag_id
         WHERE a.name LIKE ? ESCAPE '\\'",
    );
    let mut bind_values: Vec<Value> = vec![Value::Text(like_contains_pattern(&query.text))];

    if let Some(after) = query.modified_after {
        sql.push_str(" AND t.date_modified > ?");
        bind_values.push(Value::Integer(after));
    }

    sql.push_str(" GROUP BY a.tag_id ORDER BY a.tag_id ASC;");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut tag_ids: Vec<TagId> = Vec::new();
    while let Some(row) = rows.next()? {
        tag_ids.push(row.get("tag_id")?);
    }

    let repo = SqliteTagRepository::new(conn);
    let mut views = Vec::with_capacity(tag_ids.len());
    for tag_id in tag_ids {
        let view = repo
            .get_view(tag_id)?
            .ok_or_else(|| SearchError::InvalidData(format!("matched tag {tag_id} vanished")))?;
        views.push(view);
    }

    Ok(views)
}

/// Builds a `%text%` LIKE pattern with `\`, `%` and `_` escaped.
fn like_contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::like_contains_pattern;

    #[test]
    fn pattern_wraps_plain_text() {
        assert_eq!(like_contains_pattern("oo"), "%oo%");
        assert_eq!(like_contains_pattern(""), "%%");
    }

    #[test]
    fn pattern_escapes_wildcards() {
        assert_eq!(like_contains_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }
}
