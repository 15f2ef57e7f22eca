//! Error types for the SmartBreath core library.

use thiserror::Error;

/// Result type alias using the SmartBreath core Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for SmartBreath operations.
///
/// Classification is carried in the variant, never inferred from message
/// text; the gRPC layer maps variants to status codes structurally.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),
}
