//! Build script for smartbreath-proto
//!
//! Compiles protobuf definitions using tonic-build.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_root = "../../proto";

    let protos = [
        "smartbreath/v1/common.proto",
        "smartbreath/v1/auth.proto",
        "smartbreath/v1/user.proto",
        "smartbreath/v1/machine.proto",
        "smartbreath/v1/record.proto",
        "smartbreath/v1/health.proto",
    ];

    let proto_paths: Vec<_> = protos
        .iter()
        .map(|p| format!("{}/{}", proto_root, p))
        .collect();

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&proto_paths, &[proto_root.to_string()])?;

    Ok(())
}
