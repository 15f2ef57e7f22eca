//! Data models for SmartBreath storage.

use serde::{Deserialize, Serialize};

/// Machine name applied by `reset_machine`.
pub const RESET_DEVICE_NAME: &str = "UNNAMED";

/// Machine name applied by `claim_machine` when the claimer supplies none.
pub const DEFAULT_DEVICE_NAME: &str = "MY-DEVICE";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// ISO date, YYYY-MM-DD.
    pub date_of_birth: String,
    pub weight: f64,
    pub height: f64,
    pub gender: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: i64,
    pub revoked: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Machine {
    pub id: String,
    pub device_name: String,
    pub model: String,
    /// None for unowned (reset or never-claimed) machines.
    pub owner_id: Option<String>,
    pub registered_at: i64,
    pub updated_at: i64,
}

/// A machine row joined with its owner's identity summary.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MachineWithOwner {
    pub id: String,
    pub device_name: String,
    pub model: String,
    pub owner_id: Option<String>,
    pub registered_at: i64,
    pub updated_at: i64,
    pub owner_username: Option<String>,
    pub owner_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    pub id: String,
    pub machine_id: String,
    pub spo2: i64,
    pub fev1: f64,
    pub fvc: f64,
    pub pef: f64,
    /// Derived FEV1/FVC ratio, computed at insert time.
    pub fev1_fvc: f64,
    pub measured_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
