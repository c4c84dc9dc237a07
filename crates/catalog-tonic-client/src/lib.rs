//! Client library for the laptop catalog gRPC service.
//!
//! [`auth`] holds the login client and the token-attaching interceptor with
//! its background refresh loop; [`catalog`] wraps the generated catalog
//! client with convenience calls for the four call shapes.

pub mod auth;
pub mod catalog;

pub use auth::{AuthClient, AuthInterceptor, Credentials, RefreshHandle, auth_methods};
pub use catalog::CatalogClient;
