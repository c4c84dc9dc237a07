//! Server-side implementation of the catalog gRPC service.
//!
//! ## Structure
//!
//! - [`auth`] - token issuing/verification, the role gate, the login RPC.
//! - [`config`] - CLI/env configuration.
//! - [`context`] - per-call deadline and cancellation tracking.
//! - [`service`] - gRPC service entry point (`CatalogService`).
//! - [`store`] - catalog, rating, identity and image content stores.
//! - [`streaming`] - helpers for the streaming call shapes.
//! - [`telemetry`] - tracing subscriber setup.

pub mod auth;
pub mod config;
pub mod context;
pub mod service;
pub mod store;
pub mod streaming;
pub mod telemetry;
