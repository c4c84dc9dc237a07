//! Signed, time-limited access tokens.

use crate::server::store::User;
use catalog_tonic_core::{Error, Result};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Claims carried by a verified access token.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// Subject username.
    pub sub: String,
    /// Role tag checked by the authorization gate.
    pub role: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: u64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

/// Issues and verifies HMAC-SHA256 signed access tokens.
///
/// The manager owns the signing secret and the duration policy and is
/// stateless beyond them: validity is re-derived from the signature and
/// the embedded expiry on every [`verify`](TokenManager::verify). There is
/// no session table and no revocation list.
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_duration: Duration,
}

impl TokenManager {
    pub fn new(secret: &str, token_duration: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Exact expiry: a token is rejected the moment `exp` passes.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_duration,
        }
    }

    /// Issues a token for the user, expiring after the configured duration.
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = jsonwebtoken::get_current_timestamp();
        let claims = Claims {
            sub: user.username.clone(),
            role: user.role.clone(),
            iat: now,
            exp: now + self.token_duration.as_secs(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            Error::Internal {
                context: format!("cannot sign token: {e}"),
            }
        })
    }

    /// Verifies signature and expiry, returning the embedded claims.
    ///
    /// An expired token fails with [`Error::TokenExpired`]; any other
    /// defect (bad signature, malformed structure) fails with
    /// [`Error::TokenInvalid`]. There is no partially-trusted outcome.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Error::TokenExpired,
                _ => Error::TokenInvalid,
            })
    }
}
