//! Catalog domain model for tags, their aliases and categories.
//!
//! # Responsibility
//! - Define the row shapes persisted by the repositories.
//! - Define the assembled read view and the partial update description.
//!
//! # Invariants
//! - Every tag has exactly one primary alias owned by that tag.
//! - Alias names are globally unique across all tags.
//! - Every tag references exactly one existing category.

pub mod category;
pub mod tag;
