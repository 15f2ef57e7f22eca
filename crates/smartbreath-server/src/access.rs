//! Ownership-scoped access control.
//!
//! Every gated RPC funnels through [`authorize`], a pure policy decision
//! comparing the authenticated principal against resource ownership. The
//! guard never touches the store and never builds transport errors; the gRPC
//! layer resolves the resource first (so "missing" stays `NOT_FOUND`) and
//! maps [`Decision::Deny`] to `PERMISSION_DENIED`.
//!
//! Listing endpoints do not consult the guard at all: they are scoped by
//! `WHERE owner_id = ?` with the authenticated principal's id, so a caller
//! can never widen a listing by supplying someone else's filter.

use crate::auth::claims::Claims;

/// The class of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalClass {
    /// A human account.
    User,
    /// A designated ingestion/polling service credential. Grants a read-only
    /// bypass on record lookups, nothing more.
    Service,
}

/// The authenticated identity attached to an inbound request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub class: PrincipalClass,
}

impl Principal {
    pub fn from_claims(claims: &Claims) -> Self {
        let class = if claims.is_service() {
            PrincipalClass::Service
        } else {
            PrincipalClass::User
        };
        Self {
            id: claims.sub.clone(),
            class,
        }
    }

    pub fn is_service(&self) -> bool {
        self.class == PrincipalClass::Service
    }
}

/// A resource-scoped operation to be authorized.
///
/// `owner_id` is the owning user of the machine the resource hangs off;
/// `None` means the machine is unowned (reset or never claimed), which
/// denies everyone except where a bypass applies.
#[derive(Debug, Clone, Copy)]
pub enum Access<'a> {
    /// Self-service user operations: profile read, update, delete.
    UserSelf { user_id: &'a str },
    /// Machine read/rename/reset/delete, and record reports.
    MachineOwner { owner_id: Option<&'a str> },
    /// Record reads: the machine owner, or any service-class principal.
    RecordRead { owner_id: Option<&'a str> },
    /// Record deletion: the machine owner only, no service bypass.
    RecordDelete { owner_id: Option<&'a str> },
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Denied, with the reason surfaced to the caller.
    Deny(&'static str),
}

impl Decision {
    pub const fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }
}

fn owns(principal: &Principal, owner_id: Option<&str>) -> bool {
    owner_id == Some(principal.id.as_str())
}

/// Evaluate the access policy for one principal/resource pair.
pub fn authorize(principal: &Principal, access: Access<'_>) -> Decision {
    match access {
        Access::UserSelf { user_id } => {
            if principal.id == user_id {
                Decision::Allow
            } else {
                Decision::Deny("You may only access your own profile")
            }
        }
        Access::MachineOwner { owner_id } => {
            if owns(principal, owner_id) {
                Decision::Allow
            } else {
                Decision::Deny("Not your machine")
            }
        }
        Access::RecordRead { owner_id } => {
            if principal.is_service() || owns(principal, owner_id) {
                Decision::Allow
            } else {
                Decision::Deny("Not your machine's records")
            }
        }
        Access::RecordDelete { owner_id } => {
            if owns(principal, owner_id) {
                Decision::Allow
            } else {
                Decision::Deny("Only the machine owner may delete records")
            }
        }
    }
}
