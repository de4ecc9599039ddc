//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into tag use-case APIs.
//! - Own write transactions; repositories never commit on their own.

pub mod tag_service;
pub mod tag_write;
