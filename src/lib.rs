//! LibTech library database dashboard.
//!
//! Named SQL reports with chart descriptors, per-category table views and
//! data-entry forms over a PostgreSQL database, served over HTTP or run from
//! the command line.

pub mod about;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod charts;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod forms;

pub use dashboard::{Dashboard, DashboardError, FormOutcome, Inputs, ReportOutcome};
