//! Shared gRPC utility helpers.
//!
//! Error classification is structural: status codes are chosen from typed
//! variants, never by inspecting message text. A denial from the access
//! guard is always `PERMISSION_DENIED`, kept distinct from `NOT_FOUND`
//! (resources are resolved before the guard runs).

use tonic::{Request, Status};
use tracing::warn;

use smartbreath_proto::prost_types;

use crate::access::{self, Access, Decision, Principal};
use crate::server::interceptor::extract_claims;
use crate::storage::DatabaseError;

/// Map a storage error to a gRPC status.
///
/// Full detail for unexpected failures goes to the server log only; the
/// caller sees a generic internal error.
#[allow(clippy::needless_pass_by_value)]
pub fn db_error_to_status(e: DatabaseError) -> Status {
    match e {
        DatabaseError::NotFound(what) => Status::not_found(format!("{what} not found")),
        DatabaseError::Conflict(what) => Status::already_exists(what),
        other => {
            warn!(error = %other, "Database error");
            Status::internal("Internal error")
        }
    }
}

/// Map a core validation error to `INVALID_ARGUMENT`.
#[allow(clippy::needless_pass_by_value)]
pub fn validation_to_status(e: smartbreath_core::Error) -> Status {
    match e {
        smartbreath_core::Error::Validation(msg) => Status::invalid_argument(msg),
    }
}

/// Resolve the authenticated principal from request extensions.
#[allow(clippy::result_large_err)]
pub fn principal<T>(req: &Request<T>) -> Result<Principal, Status> {
    Ok(Principal::from_claims(extract_claims(req)?))
}

/// Enforce a guard decision, mapping a denial to `PERMISSION_DENIED`.
#[allow(clippy::result_large_err)]
pub fn require(principal: &Principal, access: Access<'_>) -> Result<(), Status> {
    match access::authorize(principal, access) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(Status::permission_denied(reason)),
    }
}

/// Unix seconds as a protobuf timestamp.
pub const fn timestamp(secs: i64) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: secs,
        nanos: 0,
    }
}

#[cfg(test)]
mod tests {
    use tonic::Code;

    use super::*;

    #[test]
    fn not_found_maps_to_not_found() {
        let status = db_error_to_status(DatabaseError::NotFound("Machine m1".into()));
        assert_eq!(status.code(), Code::NotFound);
        assert!(status.message().contains("Machine m1"));
    }

    #[test]
    fn conflict_maps_to_already_exists() {
        let status = db_error_to_status(DatabaseError::Conflict("device_name taken".into()));
        assert_eq!(status.code(), Code::AlreadyExists);
    }

    #[test]
    fn query_errors_are_generic_internal() {
        let status = db_error_to_status(DatabaseError::Query("secret table detail".into()));
        assert_eq!(status.code(), Code::Internal);
        // Detail stays server-side
        assert_eq!(status.message(), "Internal error");
    }
}
