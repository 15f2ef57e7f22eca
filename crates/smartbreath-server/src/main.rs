//! SmartBreath Telemetry Server
//!
//! Multi-tenant backend for breathing-measurement devices: registration,
//! device registry, measurement log, and PDF reports over gRPC.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tonic::transport::Server;
use tracing::info;

use smartbreath_core::tracing_init::init_tracing;

use smartbreath_proto::v1::auth_service_server::AuthServiceServer;
use smartbreath_proto::v1::health_server::HealthServer;
use smartbreath_proto::v1::machine_service_server::MachineServiceServer;
use smartbreath_proto::v1::record_service_server::RecordServiceServer;
use smartbreath_proto::v1::user_service_server::UserServiceServer;

use smartbreath_server::auth::JwtManager;
use smartbreath_server::server::{
    AuthServiceImpl, HealthServiceImpl, MachineServiceImpl, RecordServiceImpl, UserServiceImpl,
    jwt_interceptor,
};
use smartbreath_server::storage::Database;

#[derive(Parser, Debug)]
#[command(name = "smartbreath-server")]
#[command(
    version,
    about = "SmartBreath telemetry server - device registry and measurement log"
)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:50051")]
    addr: SocketAddr,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JWT secret key.
    #[arg(
        long,
        env = "SMARTBREATH_JWT_SECRET",
        default_value = "dev-secret-change-me"
    )]
    jwt_secret: String,

    /// Access token TTL in seconds.
    #[arg(long, default_value_t = 3600)]
    access_ttl: i64,

    /// Refresh token TTL in seconds.
    #[arg(long, default_value_t = 604_800)]
    refresh_ttl: i64,

    /// Mint a service-class ingestion token for the given client ID, print
    /// it, and exit. Service credentials may read records on any machine.
    #[arg(long, value_name = "CLIENT_ID")]
    issue_service_token: Option<String>,

    /// TTL in seconds for tokens minted via --issue-service-token.
    #[arg(long, default_value_t = 31_536_000)]
    service_ttl: i64,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing("smartbreath_server=info", args.log_json);

    let jwt = Arc::new(JwtManager::new(
        args.jwt_secret.as_bytes(),
        args.access_ttl,
        args.refresh_ttl,
    ));

    if let Some(client_id) = &args.issue_service_token {
        let token = jwt.issue_service_token(client_id, args.service_ttl)?;
        #[allow(clippy::print_stdout)]
        {
            println!("{token}");
        }
        return Ok(());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        "Starting smartbreath-server"
    );

    let db = match &args.db_path {
        Some(path) => {
            info!(path = %path.display(), "Opening telemetry database");
            Database::open(path).await?
        }
        None => {
            let default_path = default_db_path()?;
            info!(path = %default_path.display(), "Opening telemetry database (default path)");
            Database::open(&default_path).await?
        }
    };

    // Build services
    let auth = AuthServiceImpl::new(db.clone(), Arc::clone(&jwt));
    let users = UserServiceImpl::new(db.clone());
    let machines = MachineServiceImpl::new(db.clone());
    let records = RecordServiceImpl::new(db.clone());
    let health = HealthServiceImpl::new(db);

    let jwt_check = jwt_interceptor(Arc::clone(&jwt));

    let grpc_router = Server::builder()
        .add_service(AuthServiceServer::new(auth))
        .add_service(HealthServer::new(health))
        .add_service(UserServiceServer::with_interceptor(users, jwt_check.clone()))
        .add_service(MachineServiceServer::with_interceptor(
            machines,
            jwt_check.clone(),
        ))
        .add_service(RecordServiceServer::with_interceptor(records, jwt_check));

    tokio::select! {
        result = grpc_router.serve(args.addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Server stopped");
    Ok(())
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".smartbreath").join("telemetry.db"))
}
