//! Shared contract crate for the laptop catalog gRPC service.
//!
//! This crate holds everything the server and client binaries must agree on
//! at compile time: the generated protobuf/gRPC bindings, the unified
//! [`Error`] taxonomy with its [`tonic::Status`] mapping, and the shared
//! constants (method paths, metadata keys, upload limits).

mod common;
pub use common::*;

/// Generated protobuf messages and gRPC service bindings for the `catalog`
/// package.
pub mod proto {
    include!(concat!(env!("OUT_DIR"), "/catalog.rs"));

    /// Encoded file descriptor set, registered with the gRPC reflection
    /// service by the server binary.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        include_bytes!(concat!(env!("OUT_DIR"), "/catalog_descriptor.bin"));
}
