//! Health service for the SmartBreath server.

use tonic::{Request, Response, Status};

use smartbreath_proto::v1::health_server::Health;
use smartbreath_proto::v1::{HealthCheckRequest, HealthCheckResponse, ServingStatus};

use crate::storage::Database;

#[derive(Clone)]
pub struct HealthServiceImpl {
    db: Database,
}

impl HealthServiceImpl {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

#[tonic::async_trait]
impl Health for HealthServiceImpl {
    async fn check(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        // Probe the store; the server is only "serving" while SQLite answers.
        let status = match sqlx::query("SELECT 1").execute(self.db.pool()).await {
            Ok(_) => ServingStatus::Serving,
            Err(_) => ServingStatus::NotServing,
        };

        Ok(Response::new(HealthCheckResponse {
            status: status as i32,
        }))
    }
}
