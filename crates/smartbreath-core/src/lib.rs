//! SmartBreath Core Library
//!
//! Shared functionality for SmartBreath components:
//! - Typed error taxonomy carried structurally across layers
//! - SQLite pool helpers and the `define_database!` macro
//! - Pagination contract for the measurement log
//! - Vital-sign range validation

pub mod db;
pub mod error;
pub mod pagination;
pub mod tracing_init;
pub mod vitals;

pub use error::{Error, Result};
pub use pagination::{Page, PageRequest, SortKey, SortOrder};
pub use vitals::Vitals;
