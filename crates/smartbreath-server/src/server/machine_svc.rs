//! `MachineService` gRPC implementation.

use tonic::{Request, Response, Status};
use tracing::{info, instrument};

use smartbreath_proto::v1::machine_service_server::MachineService;
use smartbreath_proto::v1::{
    CreateMachineRequest, CreateMachineResponse, GetMachineRequest, GetMachineResponse,
    ListMachinesRequest, ListMachinesResponse, MachineInfo, OwnerSummary, RegisterMachineRequest,
    RegisterMachineResponse, RemoveMachineRequest, RemoveMachineResponse, ResetMachineRequest,
    ResetMachineResponse, UpdateMachineRequest, UpdateMachineResponse,
};

use crate::access::Access;
use crate::server::grpc_util::{db_error_to_status, principal, require, timestamp};
use crate::storage::{DEFAULT_DEVICE_NAME, Database, Machine, MachineWithOwner};

pub struct MachineServiceImpl {
    db: Database,
}

impl MachineServiceImpl {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

pub(crate) fn machine_to_proto(m: &MachineWithOwner) -> MachineInfo {
    let owner = m.owner_id.as_ref().map(|id| OwnerSummary {
        id: id.clone(),
        username: m.owner_username.clone().unwrap_or_default(),
        email: m.owner_email.clone().unwrap_or_default(),
    });
    MachineInfo {
        id: m.id.clone(),
        device_name: m.device_name.clone(),
        model: m.model.clone(),
        owner_id: m.owner_id.clone(),
        registered_at: Some(timestamp(m.registered_at)),
        updated_at: Some(timestamp(m.updated_at)),
        owner,
    }
}

/// Conversion for contexts where the owner summary is not joined in.
pub(crate) fn machine_row_to_proto(m: &Machine) -> MachineInfo {
    MachineInfo {
        id: m.id.clone(),
        device_name: m.device_name.clone(),
        model: m.model.clone(),
        owner_id: m.owner_id.clone(),
        registered_at: Some(timestamp(m.registered_at)),
        updated_at: Some(timestamp(m.updated_at)),
        owner: None,
    }
}

#[allow(clippy::result_large_err)]
fn validate_device_field(field: &str, value: &str) -> Result<(), Status> {
    if value.len() < 3 || value.len() > 100 {
        return Err(Status::invalid_argument(format!(
            "{field} must be between 3 and 100 characters"
        )));
    }
    Ok(())
}

#[tonic::async_trait]
impl MachineService for MachineServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "CreateMachine"))]
    async fn create_machine(
        &self,
        request: Request<CreateMachineRequest>,
    ) -> Result<Response<CreateMachineResponse>, Status> {
        let req = request.into_inner();

        validate_device_field("deviceName", &req.device_name)?;
        validate_device_field("model", &req.model)?;

        let machine_id = uuid::Uuid::new_v4().to_string();
        let machine = self
            .db
            .create_machine(&machine_id, &req.device_name, &req.model, &req.owner_id)
            .await
            .map_err(db_error_to_status)?;

        info!(machine_id = %machine_id, device_name = %req.device_name, "Machine registered");

        Ok(Response::new(CreateMachineResponse {
            machine: Some(machine_to_proto(&machine)),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "ListMachines"))]
    async fn list_machines(
        &self,
        request: Request<ListMachinesRequest>,
    ) -> Result<Response<ListMachinesResponse>, Status> {
        // Always scoped to the caller; a client-supplied owner filter is
        // never trusted for authorization.
        let caller = principal(&request)?;

        let machines = self
            .db
            .list_machines(&caller.id)
            .await
            .map_err(db_error_to_status)?;

        Ok(Response::new(ListMachinesResponse {
            machines: machines.iter().map(machine_to_proto).collect(),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "GetMachine"))]
    async fn get_machine(
        &self,
        request: Request<GetMachineRequest>,
    ) -> Result<Response<GetMachineResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        let machine = self
            .db
            .get_machine_with_owner(&req.machine_id)
            .await
            .map_err(db_error_to_status)?;

        require(
            &caller,
            Access::MachineOwner {
                owner_id: machine.owner_id.as_deref(),
            },
        )?;

        Ok(Response::new(GetMachineResponse {
            machine: Some(machine_to_proto(&machine)),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "UpdateMachine"))]
    async fn update_machine(
        &self,
        request: Request<UpdateMachineRequest>,
    ) -> Result<Response<UpdateMachineResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        validate_device_field("deviceName", &req.device_name)?;

        let machine = self
            .db
            .get_machine(&req.machine_id)
            .await
            .map_err(db_error_to_status)?;

        require(
            &caller,
            Access::MachineOwner {
                owner_id: machine.owner_id.as_deref(),
            },
        )?;

        if self
            .db
            .device_name_taken(&req.device_name, &req.machine_id)
            .await
            .map_err(db_error_to_status)?
        {
            return Err(Status::already_exists("Device name already in use"));
        }

        let machine = self
            .db
            .rename_machine(&req.machine_id, &req.device_name)
            .await
            .map_err(db_error_to_status)?;

        info!(machine_id = %req.machine_id, device_name = %req.device_name, "Machine renamed");

        Ok(Response::new(UpdateMachineResponse {
            machine: Some(machine_to_proto(&machine)),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "RegisterMachine"))]
    async fn register_machine(
        &self,
        request: Request<RegisterMachineRequest>,
    ) -> Result<Response<RegisterMachineResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        let device_name = req.device_name.as_deref().unwrap_or(DEFAULT_DEVICE_NAME);
        validate_device_field("deviceName", device_name)?;

        let machine = self
            .db
            .claim_machine(&req.machine_id, &caller.id, device_name)
            .await
            .map_err(db_error_to_status)?;

        info!(machine_id = %req.machine_id, user_id = %caller.id, "Machine claimed");

        Ok(Response::new(RegisterMachineResponse {
            machine: Some(machine_to_proto(&machine)),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "ResetMachine"))]
    async fn reset_machine(
        &self,
        request: Request<ResetMachineRequest>,
    ) -> Result<Response<ResetMachineResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        let machine = self
            .db
            .get_machine(&req.machine_id)
            .await
            .map_err(db_error_to_status)?;

        require(
            &caller,
            Access::MachineOwner {
                owner_id: machine.owner_id.as_deref(),
            },
        )?;

        self.db
            .reset_machine(&req.machine_id)
            .await
            .map_err(db_error_to_status)?;

        info!(machine_id = %req.machine_id, "Machine reset");

        Ok(Response::new(ResetMachineResponse { reset: true }))
    }

    #[instrument(skip(self, request), fields(rpc = "RemoveMachine"))]
    async fn remove_machine(
        &self,
        request: Request<RemoveMachineRequest>,
    ) -> Result<Response<RemoveMachineResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        let machine = self
            .db
            .get_machine(&req.machine_id)
            .await
            .map_err(db_error_to_status)?;

        require(
            &caller,
            Access::MachineOwner {
                owner_id: machine.owner_id.as_deref(),
            },
        )?;

        self.db
            .remove_machine(&req.machine_id)
            .await
            .map_err(db_error_to_status)?;

        info!(machine_id = %req.machine_id, "Machine removed");

        Ok(Response::new(RemoveMachineResponse { removed: true }))
    }
}
