//! Shared utilities, configuration, and error handling for Gagasan
//!
//! This crate provides common functionality used across the curation workflow:
//! - Configuration management following 12-factor principles
//! - The error taxonomy surfaced to callers
//! - Repository and state-machine error types
//! - Axum extractors for validated JSON bodies and pagination

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::{Config, CurationSettings, SeedUser, StoreProvider};
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use state::StateError;
