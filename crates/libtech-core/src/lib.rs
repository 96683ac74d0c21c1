//! Core types and traits for LibTech database backends.
//!
//! This crate provides the `DatabaseBackend` trait and the transient tabular
//! types every backend hands back, so the dashboard can run against Postgres
//! or an in-memory fixture without knowing which.

pub mod backend;
pub mod models;

// Re-export key types at crate root for convenience
pub use backend::{procedure_call_sql, quote_identifier, DatabaseBackend, DbError};
pub use models::params::{parse_date, SqlValue};
pub use models::{DataValue, ResultSet};
