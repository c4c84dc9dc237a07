//! Client-side authentication.
//!
//! [`AuthClient`] performs the login RPC with fixed credentials.
//! [`AuthInterceptor`] attaches the current access token to every outgoing
//! call whose method is in the gated set, and a background task refreshes
//! the token on a timer, falling back to a short retry interval after a
//! failed login. The token value is shared behind a reader/writer lock so
//! attachment reads and refresh writes never race or tear.

use catalog_tonic_core::proto::LoginRequest;
use catalog_tonic_core::proto::auth_client;
use catalog_tonic_core::types::{AUTHORIZATION_KEY, BEARER_PREFIX, methods};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::metadata::AsciiMetadataValue;
use tonic::service::Interceptor;
use tonic::transport::Channel;
use tonic::{GrpcMethod, Request, Status};

/// How long the refresh loop waits after a failed login before retrying.
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Credentials presented at login and on every refresh.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Thin wrapper around the generated auth client bound to one set of
/// credentials.
#[derive(Clone)]
pub struct AuthClient {
    inner: auth_client::AuthClient<Channel>,
    credentials: Credentials,
}

impl AuthClient {
    pub fn new(channel: Channel, credentials: Credentials) -> Self {
        Self {
            inner: auth_client::AuthClient::new(channel),
            credentials,
        }
    }

    /// Logs in and returns a fresh access token.
    pub async fn login(&mut self) -> Result<String, Status> {
        let request = Request::new(LoginRequest {
            username: self.credentials.username.clone(),
            password: self.credentials.password.clone(),
        });
        let response = self.inner.login(request).await?;
        Ok(response.into_inner().access_token)
    }
}

/// Returns the set of method paths that require a token attached.
///
/// Derived from the same shared constants the server's access policy is
/// built from, so the two sides cannot drift.
pub fn auth_methods() -> HashSet<&'static str> {
    HashSet::from([
        methods::CREATE_LAPTOP,
        methods::UPLOAD_IMAGE,
        methods::RATE_LAPTOP,
    ])
}

/// Client interceptor attaching the current access token to gated calls.
///
/// Calls to methods outside the gated set pass through unmodified.
#[derive(Clone)]
pub struct AuthInterceptor {
    token: Arc<RwLock<AsciiMetadataValue>>,
    gated: Arc<HashSet<&'static str>>,
}

impl AuthInterceptor {
    /// Builds an interceptor around an already-obtained token value.
    pub fn new(token: AsciiMetadataValue, gated: HashSet<&'static str>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
            gated: Arc::new(gated),
        }
    }

    /// Performs the initial login and starts the background refresh loop.
    ///
    /// A failing first login is fatal: without a token every gated call
    /// would be rejected anyway. After that the loop re-logs-in every
    /// `refresh_interval`; login failures are logged and retried after
    /// [`RETRY_BACKOFF`], never fatal. Stop the loop through the returned
    /// [`RefreshHandle`]; dropping the handle detaches it for the process
    /// lifetime.
    pub async fn with_refresh(
        mut auth: AuthClient,
        gated: HashSet<&'static str>,
        refresh_interval: Duration,
    ) -> Result<(Self, RefreshHandle), Status> {
        let token = bearer_value(&auth.login().await?)?;
        let interceptor = Self::new(token, gated);

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(refresh_loop(
            auth,
            Arc::clone(&interceptor.token),
            refresh_interval,
            shutdown.clone(),
        ));

        Ok((interceptor, RefreshHandle { shutdown, task }))
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let gated = request
            .extensions()
            .get::<GrpcMethod>()
            .map(|method| format!("/{}/{}", method.service(), method.method()))
            .is_some_and(|path| self.gated.contains(path.as_str()));

        if gated {
            let token = self.token.read().clone();
            request.metadata_mut().insert(AUTHORIZATION_KEY, token);
        }

        Ok(request)
    }
}

/// Handle over the background refresh task.
pub struct RefreshHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stops the refresh loop and waits for it to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.task.await;
    }
}

async fn refresh_loop(
    mut auth: AuthClient,
    token: Arc<RwLock<AsciiMetadataValue>>,
    refresh_interval: Duration,
    shutdown: CancellationToken,
) {
    let mut wait = refresh_interval;
    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            () = tokio::time::sleep(wait) => {}
        }

        match auth.login().await {
            Ok(fresh) => match bearer_value(&fresh) {
                Ok(value) => {
                    *token.write() = value;
                    wait = refresh_interval;
                    tracing::debug!("refreshed access token");
                }
                Err(status) => {
                    wait = RETRY_BACKOFF;
                    tracing::warn!(%status, "refreshed token is unusable");
                }
            },
            Err(status) => {
                wait = RETRY_BACKOFF;
                tracing::warn!(%status, "token refresh failed");
            }
        }
    }
}

fn bearer_value(token: &str) -> Result<AsciiMetadataValue, Status> {
    format!("{BEARER_PREFIX}{token}")
        .parse()
        .map_err(|_| Status::internal("access token contains non-ASCII characters"))
}
