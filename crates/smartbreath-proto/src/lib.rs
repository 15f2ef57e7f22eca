//! SmartBreath Protocol Buffers
//!
//! Generated protobuf code for the SmartBreath gRPC API.
//!
//! This crate contains:
//! - `AuthService` for registration, login, and token lifecycle
//! - `UserService` for self-service profile management
//! - `MachineService` for the device registry
//! - `RecordService` for the measurement log and report rendering

#![allow(clippy::derive_partial_eq_without_eq)]

/// SmartBreath v1 API definitions.
///
/// All generated types and services are included here.
pub mod v1 {
    tonic::include_proto!("smartbreath.v1");
}

// Re-export v1 as the default API version for convenience
pub use v1::*;

// Re-export prost_types for downstream crates that need Timestamp conversion
pub use prost_types;
