//! Tests for the `UserService` gRPC implementation.

#![allow(clippy::unwrap_used)]

use smartbreath_proto::v1::user_service_server::UserService;
use smartbreath_proto::v1::{DeleteUserRequest, GetUserRequest, UpdateUserRequest};

use super::test_helpers::{authed_request, seed_alice, seed_bob, seed_machine, test_db, user_claims};
use super::user_svc::UserServiceImpl;
use crate::storage::Database;

async fn setup() -> (UserServiceImpl, Database) {
    let db = test_db().await;
    seed_alice(&db).await;
    let svc = UserServiceImpl::new(db.clone());
    (svc, db)
}

fn get_req(user_id: &str) -> GetUserRequest {
    GetUserRequest {
        user_id: user_id.into(),
    }
}

fn update_req(user_id: &str) -> UpdateUserRequest {
    UpdateUserRequest {
        user_id: user_id.into(),
        username: None,
        email: None,
        first_name: None,
        last_name: None,
        date_of_birth: None,
        weight: None,
        height: None,
        gender: None,
    }
}

#[tokio::test]
async fn user_reads_own_profile() {
    let (svc, _db) = setup().await;

    let resp = svc
        .get_user(authed_request(get_req("u1"), user_claims("u1", "alice")))
        .await
        .unwrap()
        .into_inner();

    let profile = resp.user.unwrap();
    assert_eq!(profile.username, "alice");
    assert_eq!(profile.first_name, "Alice");
}

#[tokio::test]
async fn foreign_profile_is_forbidden() {
    let (svc, db) = setup().await;
    seed_bob(&db).await;

    let err = svc
        .get_user(authed_request(get_req("u1"), user_claims("u2", "bob")))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::PermissionDenied);
}

#[tokio::test]
async fn missing_own_profile_is_not_found() {
    let (svc, _db) = setup().await;

    // The guard passes (self id) but the account no longer exists
    let err = svc
        .get_user(authed_request(get_req("ghost"), user_claims("ghost", "ghost")))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::NotFound);
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() {
    let (svc, _db) = setup().await;

    let resp = svc
        .update_user(authed_request(
            UpdateUserRequest {
                weight: Some(64.0),
                ..update_req("u1")
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap()
        .into_inner();

    let profile = resp.user.unwrap();
    assert!((profile.weight - 64.0).abs() < f64::EPSILON);
    assert_eq!(profile.username, "alice");
}

#[tokio::test]
async fn update_foreign_profile_is_forbidden() {
    let (svc, db) = setup().await;
    seed_bob(&db).await;

    let err = svc
        .update_user(authed_request(
            update_req("u1"),
            user_claims("u2", "bob"),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::PermissionDenied);
}

#[tokio::test]
async fn update_to_taken_username_is_conflict() {
    let (svc, db) = setup().await;
    seed_bob(&db).await;

    let err = svc
        .update_user(authed_request(
            UpdateUserRequest {
                username: Some("alice".into()),
                ..update_req("u2")
            },
            user_claims("u2", "bob"),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::AlreadyExists);
}

#[tokio::test]
async fn update_rejects_out_of_range_weight() {
    let (svc, _db) = setup().await;

    let err = svc
        .update_user(authed_request(
            UpdateUserRequest {
                weight: Some(2.0),
                ..update_req("u1")
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::InvalidArgument);
}

#[tokio::test]
async fn delete_own_account_orphans_machines() {
    let (svc, db) = setup().await;
    seed_machine(&db).await;

    let resp = svc
        .delete_user(authed_request(
            DeleteUserRequest {
                user_id: "u1".into(),
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap()
        .into_inner();
    assert!(resp.deleted);

    // The machine survives, unowned and claimable
    let machine = db.get_machine("m1").await.unwrap();
    assert_eq!(machine.owner_id, None);
}

#[tokio::test]
async fn delete_foreign_account_is_forbidden() {
    let (svc, db) = setup().await;
    seed_bob(&db).await;

    let err = svc
        .delete_user(authed_request(
            DeleteUserRequest {
                user_id: "u1".into(),
            },
            user_claims("u2", "bob"),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::PermissionDenied);
}
