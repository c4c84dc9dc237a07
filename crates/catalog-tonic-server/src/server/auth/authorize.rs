//! Role-based authorization gate for inbound calls.
//!
//! Every inbound request passes through [`Authorization`] before it reaches
//! a handler, for all four call shapes identically: the check happens once,
//! before any stream body is processed. Methods listed in the
//! [`AccessPolicy`] require a verified token whose role appears in the
//! method's allowed set; methods absent from the policy are public.
//!
//! The gate is pure: on success the request is forwarded unchanged, with
//! nothing injected into the handler context. Rejections are written as
//! trailers-only gRPC responses carrying the status in the
//! `grpc-status`/`grpc-message` headers.

use crate::server::auth::token::TokenManager;
use catalog_tonic_core::{Error, types};
use http::{HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::Status;
use tonic::body::Body;
use tower::{Layer, Service};

/// Explicit method-path → allowed-roles table, built once at startup.
#[derive(Clone, Debug, Default)]
pub struct AccessPolicy {
    rules: HashMap<String, Vec<String>>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires one of `roles` for calls to `method` (a full gRPC path such
    /// as `/catalog.Catalog/CreateLaptop`).
    pub fn allow<I, S>(mut self, method: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules
            .insert(method.to_owned(), roles.into_iter().map(Into::into).collect());
        self
    }

    fn allowed_roles(&self, method: &str) -> Option<&[String]> {
        self.rules.get(method).map(Vec::as_slice)
    }
}

/// Default policy for the catalog service: mutating calls need `admin`,
/// rating needs any signed-in role, search and login stay public.
pub fn catalog_access_policy() -> AccessPolicy {
    AccessPolicy::new()
        .allow(types::methods::CREATE_LAPTOP, ["admin"])
        .allow(types::methods::UPLOAD_IMAGE, ["admin"])
        .allow(types::methods::RATE_LAPTOP, ["admin", "user"])
}

struct Gate {
    tokens: Arc<TokenManager>,
    policy: AccessPolicy,
}

impl Gate {
    /// Checks one call; `Ok(())` means forward the request unchanged.
    fn authorize(&self, method: &str, headers: &HeaderMap) -> Result<(), Error> {
        let Some(allowed) = self.policy.allowed_roles(method) else {
            // Public method.
            return Ok(());
        };

        let value = headers
            .get(types::AUTHORIZATION_KEY)
            .ok_or_else(|| Error::Unauthenticated {
                reason: "authorization token is not provided".to_owned(),
            })?;
        let value = value.to_str().map_err(|_| Error::Unauthenticated {
            reason: "authorization metadata is not valid ASCII".to_owned(),
        })?;
        let token = value
            .strip_prefix(types::BEARER_PREFIX)
            .ok_or_else(|| Error::Unauthenticated {
                reason: "authorization scheme must be Bearer".to_owned(),
            })?;

        let claims = self.tokens.verify(token)?;

        if allowed.iter().any(|role| *role == claims.role) {
            Ok(())
        } else {
            Err(Error::PermissionDenied {
                role: claims.role,
                method: method.to_owned(),
            })
        }
    }
}

/// Tower layer installing the authorization gate in front of a server.
#[derive(Clone)]
pub struct AuthorizationLayer {
    gate: Arc<Gate>,
}

impl AuthorizationLayer {
    pub fn new(tokens: Arc<TokenManager>, policy: AccessPolicy) -> Self {
        Self {
            gate: Arc::new(Gate { tokens, policy }),
        }
    }
}

impl<S> Layer<S> for AuthorizationLayer {
    type Service = Authorization<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Authorization {
            inner,
            gate: Arc::clone(&self.gate),
        }
    }
}

/// Service wrapper produced by [`AuthorizationLayer`].
#[derive(Clone)]
pub struct Authorization<S> {
    inner: S,
    gate: Arc<Gate>,
}

impl<S> Service<http::Request<Body>> for Authorization<S>
where
    S: Service<http::Request<Body>, Response = http::Response<Body>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future =
        futures::future::Either<S::Future, std::future::Ready<Result<S::Response, S::Error>>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<Body>) -> Self::Future {
        match self.gate.authorize(req.uri().path(), req.headers()) {
            Ok(()) => futures::future::Either::Left(self.inner.call(req)),
            Err(err) => {
                tracing::debug!(method = req.uri().path(), %err, "rejected call");
                futures::future::Either::Right(std::future::ready(Ok(reject(err.into()))))
            }
        }
    }
}

/// Builds a trailers-only gRPC response carrying the rejection status.
fn reject(status: Status) -> http::Response<Body> {
    let mut response = http::Response::new(Body::empty());
    let headers = response.headers_mut();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/grpc"),
    );
    headers.insert("grpc-status", HeaderValue::from(status.code() as i32));
    if let Ok(message) = HeaderValue::from_str(status.message()) {
        headers.insert("grpc-message", message);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn gate() -> Gate {
        Gate {
            tokens: Arc::new(TokenManager::new("test-secret", Duration::from_secs(900))),
            policy: catalog_access_policy(),
        }
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            types::AUTHORIZATION_KEY,
            HeaderValue::from_str(&format!("{}{token}", types::BEARER_PREFIX)).unwrap(),
        );
        headers
    }

    fn token_for_role(gate: &Gate, role: &str) -> String {
        let user = crate::server::store::User {
            username: format!("{role}1"),
            hashed_password: String::new(),
            role: role.to_owned(),
        };
        gate.tokens.issue(&user).unwrap()
    }

    #[test]
    fn unlisted_methods_are_public() {
        let gate = gate();
        assert!(
            gate.authorize(types::methods::SEARCH_LAPTOP, &HeaderMap::new())
                .is_ok()
        );
        assert!(gate.authorize(types::methods::LOGIN, &HeaderMap::new()).is_ok());
        assert!(
            gate.authorize("/grpc.health.v1.Health/Check", &HeaderMap::new())
                .is_ok()
        );
    }

    #[test]
    fn missing_token_is_unauthenticated() {
        let gate = gate();
        let err = gate
            .authorize(types::methods::CREATE_LAPTOP, &HeaderMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[test]
    fn missing_bearer_prefix_is_unauthenticated() {
        let gate = gate();
        let mut headers = HeaderMap::new();
        headers.insert(
            types::AUTHORIZATION_KEY,
            HeaderValue::from_static("raw-token-without-scheme"),
        );
        let err = gate
            .authorize(types::methods::CREATE_LAPTOP, &headers)
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let gate = gate();
        let mut token = token_for_role(&gate, "admin");
        token.pop();
        let err = gate
            .authorize(types::methods::CREATE_LAPTOP, &bearer_headers(&token))
            .unwrap_err();
        assert!(matches!(err, Error::TokenInvalid));
    }

    #[test]
    fn wrong_role_is_permission_denied() {
        let gate = gate();
        let token = token_for_role(&gate, "user");
        let err = gate
            .authorize(types::methods::CREATE_LAPTOP, &bearer_headers(&token))
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[test]
    fn allowed_role_passes() {
        let gate = gate();
        let admin = token_for_role(&gate, "admin");
        assert!(
            gate.authorize(types::methods::CREATE_LAPTOP, &bearer_headers(&admin))
                .is_ok()
        );

        // RateLaptop admits both roles.
        let user = token_for_role(&gate, "user");
        assert!(
            gate.authorize(types::methods::RATE_LAPTOP, &bearer_headers(&user))
                .is_ok()
        );
    }

    #[test]
    fn reject_builds_a_trailers_only_response() {
        let response = reject(Status::permission_denied("role user is not allowed"));
        assert_eq!(
            response.headers().get("grpc-status").unwrap(),
            &HeaderValue::from(tonic::Code::PermissionDenied as i32)
        );
        assert!(response.headers().get("grpc-message").is_some());
    }
}
