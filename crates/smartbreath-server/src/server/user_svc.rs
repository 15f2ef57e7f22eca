//! `UserService` gRPC implementation.
//!
//! Every RPC here is self-only: the guard compares the target user id
//! against the authenticated principal before the store is touched.

use tonic::{Request, Response, Status};
use tracing::{info, instrument};

use smartbreath_proto::v1::user_service_server::UserService;
use smartbreath_proto::v1::{
    DeleteUserRequest, DeleteUserResponse, Gender, GetUserRequest, GetUserResponse, UserProfile,
    UpdateUserRequest, UpdateUserResponse,
};

use crate::access::Access;
use crate::server::auth_svc::{
    validate_date_of_birth, validate_email, validate_height, validate_person_name,
    validate_username, validate_weight,
};
use crate::server::grpc_util::{db_error_to_status, principal, require, timestamp};
use crate::storage::{Database, UpdateUserParams, User};

pub struct UserServiceImpl {
    db: Database,
}

impl UserServiceImpl {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Project a user row into the API profile. The password hash never leaves
/// the storage layer through here.
pub(crate) fn user_to_profile(user: &User) -> UserProfile {
    UserProfile {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        date_of_birth: user.date_of_birth.clone(),
        weight: user.weight,
        height: user.height,
        gender: gender_to_proto(&user.gender) as i32,
        created_at: Some(timestamp(user.created_at)),
        updated_at: Some(timestamp(user.updated_at)),
    }
}

pub(crate) fn gender_to_proto(gender: &str) -> Gender {
    match gender {
        "Male" => Gender::Male,
        "Female" => Gender::Female,
        "Other" => Gender::Other,
        _ => Gender::Unspecified,
    }
}

#[allow(clippy::result_large_err)]
pub(crate) fn gender_from_proto(raw: i32) -> Result<&'static str, Status> {
    match Gender::try_from(raw) {
        Ok(Gender::Male) => Ok("Male"),
        Ok(Gender::Female) => Ok("Female"),
        Ok(Gender::Other) => Ok("Other"),
        _ => Err(Status::invalid_argument(
            "Gender must be one of Male, Female, Other",
        )),
    }
}

#[tonic::async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "GetUser"))]
    async fn get_user(
        &self,
        request: Request<GetUserRequest>,
    ) -> Result<Response<GetUserResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        require(&caller, Access::UserSelf { user_id: &req.user_id })?;

        let user = self
            .db
            .get_user(&req.user_id)
            .await
            .map_err(db_error_to_status)?;

        Ok(Response::new(GetUserResponse {
            user: Some(user_to_profile(&user)),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "UpdateUser"))]
    async fn update_user(
        &self,
        request: Request<UpdateUserRequest>,
    ) -> Result<Response<UpdateUserResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        require(&caller, Access::UserSelf { user_id: &req.user_id })?;

        if let Some(username) = &req.username {
            validate_username(username)?;
            if let Ok(existing) = self.db.get_user_by_username(username).await {
                if existing.id != req.user_id {
                    return Err(Status::already_exists("Username already taken"));
                }
            }
        }
        if let Some(email) = &req.email {
            validate_email(email)?;
            if let Ok(existing) = self.db.get_user_by_email(email).await {
                if existing.id != req.user_id {
                    return Err(Status::already_exists("Email already in use"));
                }
            }
        }
        if let Some(first_name) = &req.first_name {
            validate_person_name("firstName", first_name)?;
        }
        if let Some(last_name) = &req.last_name {
            validate_person_name("lastName", last_name)?;
        }
        if let Some(dob) = &req.date_of_birth {
            validate_date_of_birth(dob)?;
        }
        if let Some(weight) = req.weight {
            validate_weight(weight)?;
        }
        if let Some(height) = req.height {
            validate_height(height)?;
        }
        let gender = req.gender.map(gender_from_proto).transpose()?;

        let user = self
            .db
            .update_user(
                &req.user_id,
                &UpdateUserParams {
                    username: req.username.as_deref(),
                    email: req.email.as_deref(),
                    first_name: req.first_name.as_deref(),
                    last_name: req.last_name.as_deref(),
                    date_of_birth: req.date_of_birth.as_deref(),
                    weight: req.weight,
                    height: req.height,
                    gender,
                },
            )
            .await
            .map_err(db_error_to_status)?;

        info!(user_id = %req.user_id, "User profile updated");

        Ok(Response::new(UpdateUserResponse {
            user: Some(user_to_profile(&user)),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "DeleteUser"))]
    async fn delete_user(
        &self,
        request: Request<DeleteUserRequest>,
    ) -> Result<Response<DeleteUserResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        require(&caller, Access::UserSelf { user_id: &req.user_id })?;

        let deleted = self
            .db
            .delete_user(&req.user_id)
            .await
            .map_err(db_error_to_status)?;

        if !deleted {
            return Err(Status::not_found(format!("User {} not found", req.user_id)));
        }

        info!(user_id = %req.user_id, "User deleted");

        Ok(Response::new(DeleteUserResponse { deleted }))
    }
}
