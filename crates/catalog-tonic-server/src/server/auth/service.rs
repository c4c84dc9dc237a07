//! Login service.

use crate::server::auth::token::TokenManager;
use crate::server::store::UserStore;
use catalog_tonic_core::Error;
use catalog_tonic_core::proto::auth_server::Auth;
use catalog_tonic_core::proto::{LoginRequest, LoginResponse};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// gRPC authentication service: exchanges credentials for access tokens.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenManager>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenManager>) -> Self {
        Self { users, tokens }
    }
}

#[tonic::async_trait]
impl Auth for AuthService {
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();

        // One failure path for unknown user and wrong password; the caller
        // cannot probe which half was wrong.
        let user = self
            .users
            .find(&req.username)
            .filter(|user| user.is_correct_password(&req.password))
            .ok_or(Error::InvalidCredentials)?;

        let access_token = self.tokens.issue(&user)?;
        tracing::debug!(username = %user.username, "issued access token");

        Ok(Response::new(LoginResponse { access_token }))
    }
}
