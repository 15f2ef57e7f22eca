//! JWT claims structure for SmartBreath auth.

use serde::{Deserialize, Serialize};

/// `role` claim value for human accounts.
pub const ROLE_USER: &str = "user";

/// `role` claim value for the privileged ingestion/polling credential class.
pub const ROLE_SERVICE: &str = "service";

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Subject (user ID, or a client ID for service credentials).
    pub sub: String,
    /// Human-readable principal label (username or client name).
    pub username: String,
    /// Principal class: "user" or "service".
    pub role: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
    /// Token type: "access" or "refresh".
    pub token_type: String,
}

impl Claims {
    pub fn is_access(&self) -> bool {
        self.token_type == "access"
    }

    pub fn is_refresh(&self) -> bool {
        self.token_type == "refresh"
    }

    pub fn is_service(&self) -> bool {
        self.role == ROLE_SERVICE
    }
}
