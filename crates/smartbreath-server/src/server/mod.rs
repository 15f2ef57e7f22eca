//! gRPC server implementations for the SmartBreath telemetry API.

pub mod auth_svc;
pub mod grpc_util;
pub mod health;
pub mod interceptor;
pub mod machine_svc;
pub mod record_svc;
pub mod user_svc;

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod machine_svc_tests;
#[cfg(test)]
mod user_svc_tests;

pub use auth_svc::AuthServiceImpl;
pub use health::HealthServiceImpl;
pub use interceptor::jwt_interceptor;
pub use machine_svc::MachineServiceImpl;
pub use record_svc::RecordServiceImpl;
pub use user_svc::UserServiceImpl;
