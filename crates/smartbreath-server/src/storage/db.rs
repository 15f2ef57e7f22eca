//! Database handle for the SmartBreath telemetry server.

smartbreath_core::define_database!(Database, "Telemetry database migrations complete");
