//! Authentication and authorization.
//!
//! ## Structure
//!
//! - [`token`] - signed-token issuer/verifier ([`TokenManager`]).
//! - [`authorize`] - per-method role gate installed as a tower layer.
//! - [`service`] - the `Login` RPC handler ([`AuthService`]).

pub mod authorize;
pub mod service;
pub mod token;

pub use authorize::{AccessPolicy, AuthorizationLayer, catalog_access_policy};
pub use service::AuthService;
pub use token::{Claims, TokenManager};
