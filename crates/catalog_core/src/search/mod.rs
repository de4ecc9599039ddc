//! Tag lookup by partial alias name.
//!
//! # Responsibility
//! - Match alias substrings and return assembled, de-duplicated tag views.

pub mod tag_search;
