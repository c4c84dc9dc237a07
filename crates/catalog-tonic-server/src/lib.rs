//! Server library for the laptop catalog gRPC service.
//!
//! The binary in `main.rs` wires this together; the modules under
//! [`server`] hold the actual machinery and are exercised directly by the
//! integration tests.

pub mod server;
