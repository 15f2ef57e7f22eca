//! SQLite storage for the SmartBreath telemetry server.
//!
//! Provides persistence for users, tokens, machines, and measurement
//! records. Multi-step lifecycle operations (claim, reset, remove) run in a
//! single transaction each.

mod db;
mod models;
mod queries_machines;
mod queries_records;
mod queries_users;


pub use db::Database;
pub use models::*;
pub use queries_records::RecordQuery;
pub use queries_users::{CreateUserParams, UpdateUserParams};
pub use smartbreath_core::db::DatabaseError;
