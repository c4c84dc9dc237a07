//! gRPC service implementation.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`CatalogService`).

pub mod handler;

pub use handler::CatalogService;
