//! `AuthService` gRPC implementation.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{info, instrument, warn};

use smartbreath_proto::v1::auth_service_server::AuthService;
use smartbreath_proto::v1::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
    RegisterResponse, RevokeTokenRequest, RevokeTokenResponse,
};

use crate::auth::jwt::JwtManager;
use crate::auth::password;
use crate::server::grpc_util::db_error_to_status;
use crate::server::user_svc::{gender_from_proto, user_to_profile};
use crate::storage::{CreateUserParams, Database};

pub struct AuthServiceImpl {
    db: Database,
    jwt: Arc<JwtManager>,
}

impl AuthServiceImpl {
    pub const fn new(db: Database, jwt: Arc<JwtManager>) -> Self {
        Self { db, jwt }
    }

    /// Issue the access/refresh pair for a user and persist the refresh
    /// token hash.
    async fn issue_tokens(
        &self,
        user_id: &str,
        username: &str,
    ) -> Result<(String, String, i64), Status> {
        let (access_token, expires_in) = self
            .jwt
            .issue_access_token(user_id, username)
            .map_err(|e| Status::internal(format!("Token creation failed: {e}")))?;

        let (refresh_token, refresh_exp) = self
            .jwt
            .issue_refresh_token(user_id, username)
            .map_err(|e| Status::internal(format!("Token creation failed: {e}")))?;

        let token_id = uuid::Uuid::new_v4().to_string();
        let token_hash = JwtManager::hash_token(&refresh_token);
        self.db
            .create_token(&token_id, user_id, &token_hash, refresh_exp)
            .await
            .map_err(|e| Status::internal(format!("Token storage failed: {e}")))?;

        Ok((access_token, refresh_token, expires_in))
    }
}

#[tonic::async_trait]
impl AuthService for AuthServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "Register"))]
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let req = request.into_inner();

        validate_username(&req.username)?;
        validate_password(&req.password)?;
        validate_email(&req.email)?;
        validate_person_name("firstName", &req.first_name)?;
        validate_person_name("lastName", &req.last_name)?;
        validate_date_of_birth(&req.date_of_birth)?;
        validate_weight(req.weight)?;
        validate_height(req.height)?;
        let gender = gender_from_proto(req.gender)?;

        if let Some(existing) = self
            .db
            .find_user_by_username_or_email(&req.username, &req.email)
            .await
            .map_err(db_error_to_status)?
        {
            if existing.username == req.username {
                return Err(Status::already_exists("Username already taken"));
            }
            return Err(Status::already_exists("Email already in use"));
        }

        let hash = password::hash_password(&req.password)
            .map_err(|e| Status::internal(format!("Password hashing failed: {e}")))?;

        let user_id = uuid::Uuid::new_v4().to_string();
        let user = self
            .db
            .create_user(&CreateUserParams {
                id: &user_id,
                username: &req.username,
                email: &req.email,
                password_hash: &hash,
                first_name: &req.first_name,
                last_name: &req.last_name,
                date_of_birth: &req.date_of_birth,
                weight: req.weight,
                height: req.height,
                gender,
            })
            .await
            .map_err(db_error_to_status)?;

        let (access_token, refresh_token, expires_in) =
            self.issue_tokens(&user_id, &req.username).await?;

        info!(user_id = %user_id, username = %req.username, "User registered");

        Ok(Response::new(RegisterResponse {
            user: Some(user_to_profile(&user)),
            access_token,
            refresh_token,
            expires_in_secs: expires_in,
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "Login"))]
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();

        let user = self
            .db
            .get_user_by_username(&req.username)
            .await
            .map_err(|_| Status::unauthenticated("Invalid credentials"))?;

        let valid = password::verify_password(&req.password, &user.password_hash)
            .map_err(|_| Status::internal("Password verification failed"))?;

        if !valid {
            warn!(username = %req.username, "Failed login attempt");
            return Err(Status::unauthenticated("Invalid credentials"));
        }

        let (access_token, refresh_token, expires_in) =
            self.issue_tokens(&user.id, &user.username).await?;

        info!(user_id = %user.id, username = %user.username, "User logged in");

        Ok(Response::new(LoginResponse {
            user: Some(user_to_profile(&user)),
            access_token,
            refresh_token,
            expires_in_secs: expires_in,
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "RefreshToken"))]
    async fn refresh_token(
        &self,
        request: Request<RefreshTokenRequest>,
    ) -> Result<Response<RefreshTokenResponse>, Status> {
        let req = request.into_inner();

        let claims = self
            .jwt
            .validate(&req.refresh_token)
            .map_err(|_| Status::unauthenticated("Invalid refresh token"))?;

        if !claims.is_refresh() {
            return Err(Status::invalid_argument("Not a refresh token"));
        }

        let token_hash = JwtManager::hash_token(&req.refresh_token);
        let stored = self
            .db
            .get_token_by_hash(&token_hash)
            .await
            .map_err(|e| Status::internal(format!("Token lookup failed: {e}")))?
            .ok_or_else(|| Status::unauthenticated("Refresh token revoked or expired"))?;

        // Revoke old refresh token (rotation)
        self.db
            .revoke_token(&stored.id)
            .await
            .map_err(|e| Status::internal(format!("Token revocation failed: {e}")))?;

        let (access_token, refresh_token, expires_in) =
            self.issue_tokens(&claims.sub, &claims.username).await?;

        Ok(Response::new(RefreshTokenResponse {
            access_token,
            refresh_token,
            expires_in_secs: expires_in,
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "RevokeToken"))]
    async fn revoke_token(
        &self,
        request: Request<RevokeTokenRequest>,
    ) -> Result<Response<RevokeTokenResponse>, Status> {
        let req = request.into_inner();

        let token_hash = JwtManager::hash_token(&req.refresh_token);
        let stored = self
            .db
            .get_token_by_hash(&token_hash)
            .await
            .map_err(|e| Status::internal(format!("Token lookup failed: {e}")))?;

        let revoked = if let Some(token) = stored {
            self.db
                .revoke_token(&token.id)
                .await
                .map_err(|e| Status::internal(format!("Revocation failed: {e}")))?
        } else {
            false
        };

        Ok(Response::new(RevokeTokenResponse { revoked }))
    }
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

#[allow(clippy::result_large_err)]
pub(crate) fn validate_username(username: &str) -> Result<(), Status> {
    if username.len() < 3 || username.len() > 30 {
        return Err(Status::invalid_argument(
            "Username must be between 3 and 30 characters",
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Status::invalid_argument("Username must be alphanumeric"));
    }
    Ok(())
}

#[allow(clippy::result_large_err)]
pub(crate) fn validate_password(password: &str) -> Result<(), Status> {
    if password.len() < 8 {
        return Err(Status::invalid_argument(
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

#[allow(clippy::result_large_err)]
pub(crate) fn validate_email(email: &str) -> Result<(), Status> {
    let valid = email.len() <= 100
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(Status::invalid_argument("Email address is not valid"))
    }
}

#[allow(clippy::result_large_err)]
pub(crate) fn validate_person_name(field: &str, value: &str) -> Result<(), Status> {
    if value.len() < 2 || value.len() > 50 {
        return Err(Status::invalid_argument(format!(
            "{field} must be between 2 and 50 characters"
        )));
    }
    Ok(())
}

#[allow(clippy::result_large_err)]
pub(crate) fn validate_date_of_birth(value: &str) -> Result<(), Status> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| Status::invalid_argument("dateOfBirth must be a YYYY-MM-DD date"))
}

#[allow(clippy::result_large_err)]
pub(crate) fn validate_weight(weight: f64) -> Result<(), Status> {
    if !weight.is_finite() || !(10.0..=500.0).contains(&weight) {
        return Err(Status::invalid_argument(
            "Weight must be between 10 and 500 kg",
        ));
    }
    Ok(())
}

#[allow(clippy::result_large_err)]
pub(crate) fn validate_height(height: f64) -> Result<(), Status> {
    if !height.is_finite() || !(50.0..=300.0).contains(&height) {
        return Err(Status::invalid_argument(
            "Height must be between 50 and 300 cm",
        ));
    }
    Ok(())
}
