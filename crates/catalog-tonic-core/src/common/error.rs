//! Error types for the catalog service.
//!
//! This module defines the central `Error` enum, which captures every
//! reportable failure in the catalog system. It implements `From<Error>` for
//! `tonic::Status` so errors propagate to gRPC clients with the right status
//! code; nothing below this taxonomy ever crosses the RPC surface.
//!
//! ## Error Cases
//! - `InvalidRequest` / `InvalidId` / `ImageTooLarge`: the client request was
//!   malformed or exceeded bounds.
//! - `AlreadyExists` / `NotFound`: catalog lookups against the store.
//! - `InvalidCredentials`: login with an unknown user or a wrong password.
//! - `Unauthenticated` / `TokenExpired` / `TokenInvalid`: the authorization
//!   gate rejected the call. Expired and invalid tokens are distinct
//!   variants even though both surface as `UNAUTHENTICATED`.
//! - `PermissionDenied`: a verified token whose role may not call the method.
//! - `Cancelled` / `DeadlineExceeded`: the caller context died mid-call.
//! - `StreamRecv` / `ChannelError` / `Internal`: transport and
//!   infrastructure failures.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the catalog service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// The client request was invalid or incomplete.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// A caller-assigned laptop id failed to parse as a UUID.
    #[error("laptop id is not a valid UUID: {id}")]
    InvalidId { id: String },

    /// An image upload exceeded the configured size ceiling.
    #[error("image size {size} exceeds the maximum of {max} bytes")]
    ImageTooLarge { size: usize, max: usize },

    /// A record with this id is already stored.
    #[error("already exists: {id}")]
    AlreadyExists { id: String },

    /// No laptop with this id is stored.
    #[error("laptop not found: {id}")]
    NotFound { id: String },

    /// Login failed; the message does not reveal which half was wrong.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// The call carried no usable authorization metadata.
    #[error("unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    /// The token verified but its expiry is in the past.
    #[error("access token is expired")]
    TokenExpired,

    /// The token is malformed or its signature does not match.
    #[error("access token is invalid")]
    TokenInvalid,

    /// The token's role may not call this method.
    #[error("role {role} is not allowed to call {method}")]
    PermissionDenied { role: String, method: String },

    /// The client aborted the call.
    #[error("request cancelled by client")]
    Cancelled,

    /// The call's deadline passed before the work finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Receiving from an inbound stream failed, or the stream violated the
    /// expected message sequence.
    #[error("stream receive failed: {context}")]
    StreamRecv { context: String },

    /// Internal channel send/receive failure (e.g. closed channel).
    #[error("channel error: {context}")]
    ChannelError { context: String },

    /// Infrastructure failure with no more specific classification.
    #[error("internal error: {context}")]
    Internal { context: String },
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::InvalidRequest { .. } | Error::InvalidId { .. } | Error::ImageTooLarge { .. } => {
                Status::invalid_argument(message)
            }
            Error::AlreadyExists { .. } => Status::already_exists(message),
            Error::NotFound { .. } | Error::InvalidCredentials => Status::not_found(message),
            Error::Unauthenticated { .. } | Error::TokenExpired | Error::TokenInvalid => {
                Status::unauthenticated(message)
            }
            Error::PermissionDenied { .. } => Status::permission_denied(message),
            Error::Cancelled => Status::cancelled(message),
            Error::DeadlineExceeded => Status::deadline_exceeded(message),
            Error::StreamRecv { .. } => Status::unknown(message),
            Error::ChannelError { .. } | Error::Internal { .. } => Status::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn status_codes_match_taxonomy() {
        let cases = [
            (
                Error::InvalidRequest {
                    reason: "laptop is required".into(),
                },
                Code::InvalidArgument,
            ),
            (
                Error::InvalidId {
                    id: "invalid-id".into(),
                },
                Code::InvalidArgument,
            ),
            (
                Error::ImageTooLarge {
                    size: 2 << 20,
                    max: 1 << 20,
                },
                Code::InvalidArgument,
            ),
            (Error::AlreadyExists { id: "a".into() }, Code::AlreadyExists),
            (Error::NotFound { id: "a".into() }, Code::NotFound),
            (Error::InvalidCredentials, Code::NotFound),
            (
                Error::Unauthenticated {
                    reason: "authorization token is not provided".into(),
                },
                Code::Unauthenticated,
            ),
            (Error::TokenExpired, Code::Unauthenticated),
            (Error::TokenInvalid, Code::Unauthenticated),
            (
                Error::PermissionDenied {
                    role: "user".into(),
                    method: "/catalog.Catalog/CreateLaptop".into(),
                },
                Code::PermissionDenied,
            ),
            (Error::Cancelled, Code::Cancelled),
            (Error::DeadlineExceeded, Code::DeadlineExceeded),
            (
                Error::StreamRecv {
                    context: "broken".into(),
                },
                Code::Unknown,
            ),
            (
                Error::ChannelError {
                    context: "closed".into(),
                },
                Code::Internal,
            ),
            (
                Error::Internal {
                    context: "signing failure".into(),
                },
                Code::Internal,
            ),
        ];

        for (err, code) in cases {
            let status = Status::from(err);
            assert_eq!(status.code(), code, "{}", status.message());
        }
    }

    #[test]
    fn expired_and_invalid_tokens_stay_distinct() {
        // Both map to UNAUTHENTICATED on the wire but must remain separate
        // variants with separate messages for callers of the token manager.
        assert_ne!(
            Status::from(Error::TokenExpired).message(),
            Status::from(Error::TokenInvalid).message()
        );
    }
}
