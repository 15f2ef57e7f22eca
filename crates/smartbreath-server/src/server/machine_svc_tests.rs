//! Tests for the `MachineService` gRPC implementation.

#![allow(clippy::unwrap_used)]

use tonic::Request;

use smartbreath_proto::v1::machine_service_server::MachineService;
use smartbreath_proto::v1::{
    CreateMachineRequest, GetMachineRequest, ListMachinesRequest, RegisterMachineRequest,
    RemoveMachineRequest, ResetMachineRequest, UpdateMachineRequest,
};

use super::machine_svc::MachineServiceImpl;
use super::test_helpers::{authed_request, seed_alice, seed_bob, seed_machine, test_db, user_claims};
use crate::storage::{DEFAULT_DEVICE_NAME, Database, RESET_DEVICE_NAME};

async fn setup() -> (MachineServiceImpl, Database) {
    let db = test_db().await;
    seed_alice(&db).await;
    let svc = MachineServiceImpl::new(db.clone());
    (svc, db)
}

fn create_req(device_name: &str, model: &str, owner_id: &str) -> CreateMachineRequest {
    CreateMachineRequest {
        device_name: device_name.into(),
        model: model.into(),
        owner_id: owner_id.into(),
    }
}

#[tokio::test]
async fn create_machine_joins_owner_summary() {
    let (svc, _db) = setup().await;

    let resp = svc
        .create_machine(Request::new(create_req("bedside-01", "SB-2000", "u1")))
        .await
        .unwrap()
        .into_inner();

    let machine = resp.machine.unwrap();
    assert_eq!(machine.device_name, "bedside-01");
    assert_eq!(machine.owner_id.as_deref(), Some("u1"));
    let owner = machine.owner.unwrap();
    assert_eq!(owner.username, "alice");
    assert_eq!(owner.email, "alice@example.com");
}

#[tokio::test]
async fn create_machine_for_missing_owner_is_not_found() {
    let (svc, _db) = setup().await;

    let err = svc
        .create_machine(Request::new(create_req("bedside-01", "SB-2000", "ghost")))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::NotFound);
}

#[tokio::test]
async fn duplicate_device_name_is_conflict() {
    let (svc, _db) = setup().await;

    svc.create_machine(Request::new(create_req("bedside-01", "SB-2000", "u1")))
        .await
        .unwrap();

    let err = svc
        .create_machine(Request::new(create_req("bedside-01", "SB-3000", "u1")))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::AlreadyExists);
}

#[tokio::test]
async fn duplicate_model_is_conflict() {
    let (svc, _db) = setup().await;

    svc.create_machine(Request::new(create_req("bedside-01", "SB-2000", "u1")))
        .await
        .unwrap();

    let err = svc
        .create_machine(Request::new(create_req("bedside-02", "SB-2000", "u1")))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::AlreadyExists);
}

#[tokio::test]
async fn short_device_name_is_invalid() {
    let (svc, _db) = setup().await;

    let err = svc
        .create_machine(Request::new(create_req("ab", "SB-2000", "u1")))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::InvalidArgument);
}

#[tokio::test]
async fn listing_is_scoped_to_the_caller() {
    let (svc, db) = setup().await;
    seed_bob(&db).await;
    seed_machine(&db).await;
    db.create_machine("m2", "bob-dev", "SB-3000", "u2")
        .await
        .unwrap();

    let resp = svc
        .list_machines(authed_request(
            ListMachinesRequest {},
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(resp.machines.len(), 1);
    assert_eq!(resp.machines[0].id, "m1");
}

#[tokio::test]
async fn owner_reads_machine_foreigner_is_forbidden() {
    let (svc, db) = setup().await;
    seed_bob(&db).await;
    seed_machine(&db).await;

    let resp = svc
        .get_machine(authed_request(
            GetMachineRequest {
                machine_id: "m1".into(),
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resp.machine.unwrap().device_name, "bedside-01");

    let err = svc
        .get_machine(authed_request(
            GetMachineRequest {
                machine_id: "m1".into(),
            },
            user_claims("u2", "bob"),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.code(), tonic::Code::PermissionDenied);
}

#[tokio::test]
async fn missing_machine_is_not_found_not_forbidden() {
    let (svc, _db) = setup().await;

    let err = svc
        .get_machine(authed_request(
            GetMachineRequest {
                machine_id: "no-such-machine".into(),
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::NotFound);
}

#[tokio::test]
async fn owner_renames_machine() {
    let (svc, db) = setup().await;
    seed_machine(&db).await;

    let resp = svc
        .update_machine(authed_request(
            UpdateMachineRequest {
                machine_id: "m1".into(),
                device_name: "ward-7".into(),
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(resp.machine.unwrap().device_name, "ward-7");
}

#[tokio::test]
async fn rename_collision_is_conflict() {
    let (svc, db) = setup().await;
    seed_machine(&db).await;
    db.create_machine("m2", "bedside-02", "SB-3000", "u1")
        .await
        .unwrap();

    let err = svc
        .update_machine(authed_request(
            UpdateMachineRequest {
                machine_id: "m2".into(),
                device_name: "bedside-01".into(),
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::AlreadyExists);
}

#[tokio::test]
async fn rename_by_non_owner_is_forbidden() {
    let (svc, db) = setup().await;
    seed_bob(&db).await;
    seed_machine(&db).await;

    let err = svc
        .update_machine(authed_request(
            UpdateMachineRequest {
                machine_id: "m1".into(),
                device_name: "stolen".into(),
            },
            user_claims("u2", "bob"),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::PermissionDenied);
}

#[tokio::test]
async fn reset_machine_purges_and_orphans() {
    let (svc, db) = setup().await;
    seed_machine(&db).await;
    let vitals = smartbreath_core::Vitals {
        spo2: 97,
        fev1: 3.2,
        fvc: 4.0,
        pef: 430.0,
    };
    db.create_record("r1", "m1", &vitals, None).await.unwrap();

    let resp = svc
        .reset_machine(authed_request(
            ResetMachineRequest {
                machine_id: "m1".into(),
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap()
        .into_inner();
    assert!(resp.reset);

    assert_eq!(db.count_records("m1").await.unwrap(), 0);
    let machine = db.get_machine("m1").await.unwrap();
    assert_eq!(machine.owner_id, None);
    assert_eq!(machine.device_name, RESET_DEVICE_NAME);
}

#[tokio::test]
async fn reset_by_non_owner_is_forbidden() {
    let (svc, db) = setup().await;
    seed_bob(&db).await;
    seed_machine(&db).await;

    let err = svc
        .reset_machine(authed_request(
            ResetMachineRequest {
                machine_id: "m1".into(),
            },
            user_claims("u2", "bob"),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::PermissionDenied);
}

#[tokio::test]
async fn unowned_machine_cannot_be_reset_again() {
    let (svc, db) = setup().await;
    seed_machine(&db).await;
    db.reset_machine("m1").await.unwrap();

    // Nobody owns it now, so even the former owner is refused
    let err = svc
        .reset_machine(authed_request(
            ResetMachineRequest {
                machine_id: "m1".into(),
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::PermissionDenied);
}

#[tokio::test]
async fn claim_takes_ownership_with_custom_name() {
    let (svc, db) = setup().await;
    seed_bob(&db).await;
    seed_machine(&db).await;
    db.reset_machine("m1").await.unwrap();

    let resp = svc
        .register_machine(authed_request(
            RegisterMachineRequest {
                machine_id: "m1".into(),
                device_name: Some("bobs-device".into()),
            },
            user_claims("u2", "bob"),
        ))
        .await
        .unwrap()
        .into_inner();

    let machine = resp.machine.unwrap();
    assert_eq!(machine.owner_id.as_deref(), Some("u2"));
    assert_eq!(machine.device_name, "bobs-device");
}

#[tokio::test]
async fn claim_defaults_the_device_name() {
    let (svc, db) = setup().await;
    seed_machine(&db).await;
    db.reset_machine("m1").await.unwrap();

    let resp = svc
        .register_machine(authed_request(
            RegisterMachineRequest {
                machine_id: "m1".into(),
                device_name: None,
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(resp.machine.unwrap().device_name, DEFAULT_DEVICE_NAME);
}

#[tokio::test]
async fn claim_missing_machine_is_not_found() {
    let (svc, _db) = setup().await;

    let err = svc
        .register_machine(authed_request(
            RegisterMachineRequest {
                machine_id: "ghost".into(),
                device_name: None,
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), tonic::Code::NotFound);
}

#[tokio::test]
async fn remove_machine_cascades_records() {
    let (svc, db) = setup().await;
    seed_machine(&db).await;
    let vitals = smartbreath_core::Vitals {
        spo2: 97,
        fev1: 3.2,
        fvc: 4.0,
        pef: 430.0,
    };
    db.create_record("r1", "m1", &vitals, None).await.unwrap();

    let resp = svc
        .remove_machine(authed_request(
            RemoveMachineRequest {
                machine_id: "m1".into(),
            },
            user_claims("u1", "alice"),
        ))
        .await
        .unwrap()
        .into_inner();
    assert!(resp.removed);

    assert!(db.get_machine("m1").await.is_err());
    assert!(db.get_record("r1").await.is_err());
}
