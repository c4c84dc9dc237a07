//! # Shared Catalog Contract Constants
//!
//! Constants both sides of the wire must agree on: the size ceiling for
//! image uploads, the metadata key carrying access tokens, and the full
//! gRPC method paths used by the server's access policy and the client's
//! token-attaching interceptor.

/// Maximum accepted size for one uploaded image, in bytes (1 MiB).
///
/// The upload pipeline aborts with `InvalidArgument` as soon as the
/// accumulated chunk sizes exceed this value; nothing is persisted.
pub const MAX_IMAGE_SIZE: usize = 1 << 20;

/// Metadata key carrying the access token on gated calls.
pub const AUTHORIZATION_KEY: &str = "authorization";

/// Scheme prefix expected in front of the token in [`AUTHORIZATION_KEY`].
pub const BEARER_PREFIX: &str = "Bearer ";

/// Full gRPC method paths for the `catalog` package.
///
/// The server builds its method → allowed-roles policy from these, and the
/// client uses the same constants to decide which outgoing calls need a
/// token attached. Keeping them here prevents the two sides from drifting.
pub mod methods {
    pub const CREATE_LAPTOP: &str = "/catalog.Catalog/CreateLaptop";
    pub const SEARCH_LAPTOP: &str = "/catalog.Catalog/SearchLaptop";
    pub const UPLOAD_IMAGE: &str = "/catalog.Catalog/UploadImage";
    pub const RATE_LAPTOP: &str = "/catalog.Catalog/RateLaptop";
    pub const LOGIN: &str = "/catalog.Auth/Login";
}
