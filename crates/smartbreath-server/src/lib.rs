//! SmartBreath Telemetry Server Library
//!
//! Core functionality for the SmartBreath backend:
//! - SQLite storage for users, tokens, machines, and measurement records
//! - JWT authentication and password hashing
//! - Ownership-scoped access control
//! - gRPC services (Auth, User, Machine, Record)
//! - PDF report rendering

pub mod access;
pub mod auth;
pub mod report;
pub mod server;
pub mod storage;
