//! Shared test helpers for the gRPC service test modules.
//!
//! Provides canned claims, pre-authenticated requests (as if they had passed
//! the interceptor), and seeded in-memory databases.

#![allow(clippy::unwrap_used)]

use tonic::Request;

use crate::auth::claims::{Claims, ROLE_SERVICE, ROLE_USER};
use crate::storage::{CreateUserParams, Database};

/// Claims for a human user, as the interceptor would inject them.
pub fn user_claims(user_id: &str, username: &str) -> Claims {
    Claims {
        jti: "test-jti".into(),
        sub: user_id.into(),
        username: username.into(),
        role: ROLE_USER.into(),
        iat: 0,
        exp: i64::MAX,
        token_type: "access".into(),
    }
}

/// Claims for a service-class ingestion credential.
pub fn service_claims(client_id: &str) -> Claims {
    Claims {
        role: ROLE_SERVICE.into(),
        ..user_claims(client_id, client_id)
    }
}

/// Build a request with claims already attached.
pub fn authed_request<T>(inner: T, claims: Claims) -> Request<T> {
    let mut req = Request::new(inner);
    req.extensions_mut().insert(claims);
    req
}

pub async fn test_db() -> Database {
    Database::open_in_memory().await.unwrap()
}

/// Seed user "alice" with id `u1`.
pub async fn seed_alice(db: &Database) {
    db.create_user(&CreateUserParams {
        id: "u1",
        username: "alice",
        email: "alice@example.com",
        password_hash: "hash123",
        first_name: "Alice",
        last_name: "Anders",
        date_of_birth: "1990-04-12",
        weight: 62.5,
        height: 168.0,
        gender: "Female",
    })
    .await
    .unwrap();
}

/// Seed user "bob" with id `u2`.
pub async fn seed_bob(db: &Database) {
    db.create_user(&CreateUserParams {
        id: "u2",
        username: "bob",
        email: "bob@example.com",
        password_hash: "hash456",
        first_name: "Bob",
        last_name: "Berg",
        date_of_birth: "1985-11-02",
        weight: 80.0,
        height: 181.0,
        gender: "Male",
    })
    .await
    .unwrap();
}

/// Seed machine `m1` ("bedside-01", model "SB-2000") owned by `u1`.
pub async fn seed_machine(db: &Database) {
    db.create_machine("m1", "bedside-01", "SB-2000", "u1")
        .await
        .unwrap();
}
