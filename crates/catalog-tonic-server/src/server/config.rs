use anyhow::bail;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the catalog server binary.
///
/// All values are parsed from CLI arguments or environment variables, with
/// defaults suitable for local development. Each field is independently
/// tunable at runtime.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "catalog-tonic-server",
    version,
    about = "A gRPC service for a laptop catalog with token-gated access"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Example: "0.0.0.0:50051"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// HMAC secret used to sign and verify access tokens.
    ///
    /// Every instance that must accept the same tokens has to share this
    /// value. The default is only suitable for local development.
    ///
    /// Environment variable: `TOKEN_SECRET`
    #[arg(long, env = "TOKEN_SECRET", default_value_t = String::from("insecure-dev-secret"))]
    pub token_secret: String,

    /// Lifetime of issued access tokens, in seconds.
    ///
    /// Clients are expected to refresh their token well within this window;
    /// expired tokens are rejected outright.
    ///
    /// Environment variable: `TOKEN_DURATION_SECS`
    #[arg(long, env = "TOKEN_DURATION_SECS", default_value_t = 900)]
    pub token_duration_secs: u64,

    /// Directory where uploaded images are written.
    ///
    /// Created on first upload if it does not exist.
    ///
    /// Environment variable: `IMAGE_DIR`
    #[arg(long, env = "IMAGE_DIR", default_value_t = String::from("img"))]
    pub image_dir: String,

    /// Capacity of the response buffer for streaming calls.
    ///
    /// This affects how many responses can be buffered before a producer
    /// must wait for the client to consume more data. Lower values increase
    /// backpressure responsiveness; higher values enable deeper pipelining.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 8)]
    pub stream_buffer_size: usize,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub token_secret: String,
    pub token_duration: Duration,
    pub image_dir: PathBuf,
    pub stream_buffer_size: usize,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.token_secret.is_empty() {
            bail!("TOKEN_SECRET must not be empty");
        }

        if args.token_duration_secs == 0 {
            bail!("TOKEN_DURATION_SECS must be greater than 0");
        }

        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        Ok(Self {
            server_addr: args.server_addr,
            token_secret: args.token_secret,
            token_duration: Duration::from_secs(args.token_duration_secs),
            image_dir: PathBuf::from(args.image_dir),
            stream_buffer_size: args.stream_buffer_size,
        })
    }
}
