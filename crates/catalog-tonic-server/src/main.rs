//! Catalog server binary.

use catalog_tonic_core::proto::FILE_DESCRIPTOR_SET;
use catalog_tonic_core::proto::auth_server::AuthServer;
use catalog_tonic_core::proto::catalog_server::CatalogServer;
use catalog_tonic_server::server::auth::{
    AuthService, AuthorizationLayer, TokenManager, catalog_access_policy,
};
use catalog_tonic_server::server::config::{CliArgs, ServerConfig};
use catalog_tonic_server::server::service::CatalogService;
use catalog_tonic_server::server::store::{
    DiskImageStore, ImageStore, InMemoryLaptopStore, InMemoryRatingStore, InMemoryUserStore,
    LaptopStore, RatingStore, User, UserStore,
};
use catalog_tonic_server::server::telemetry::init_telemetry;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::codec::CompressionEncoding;
use tonic::transport::Server;
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry();

    let tokens = Arc::new(TokenManager::new(
        &config.token_secret,
        config.token_duration,
    ));

    let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    seed_users(users.as_ref())?;

    let laptops: Arc<dyn LaptopStore> = Arc::new(InMemoryLaptopStore::new());
    let images: Arc<dyn ImageStore> = Arc::new(DiskImageStore::new(&config.image_dir));
    let ratings: Arc<dyn RatingStore> = Arc::new(InMemoryRatingStore::new());

    let catalog = CatalogService::new(config.clone(), laptops, images, ratings);
    let auth = AuthService::new(users, Arc::clone(&tokens));

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<CatalogServer<CatalogService>>()
        .await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    let authorization = AuthorizationLayer::new(Arc::clone(&tokens), catalog_access_policy());

    let listener = TcpListener::bind(&config.server_addr).await?;
    let incoming = TcpListenerStream::new(listener);
    tracing::info!("starting catalog service on {}", config.server_addr);

    Server::builder()
        .http2_adaptive_window(Some(true))
        .layer(authorization)
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_catalog_service(catalog))
        .add_service(AuthServer::new(auth))
        .serve_with_incoming_shutdown(incoming, shutdown_signal(health_reporter))
        .await?;

    tracing::info!("service shut down successfully");
    Ok(())
}

/// Provisions the two fixed local identities; real deployments provision
/// out of band.
fn seed_users(users: &dyn UserStore) -> anyhow::Result<()> {
    for (username, password, role) in [
        ("admin1", "secret", "admin"),
        ("user1", "secret", "user"),
    ] {
        users.save(&User::new(username, password, role)?)?;
    }
    Ok(())
}

fn build_catalog_service(service: CatalogService) -> CatalogServer<CatalogService> {
    CatalogServer::new(service)
        .send_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Gzip)
}

async fn shutdown_signal(health_reporter: HealthReporter) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("received SIGTERM signal");
        },
    }

    tracing::info!("shutdown signal received, terminating gracefully...");

    // Publish the status before the listener closes.
    health_reporter
        .set_not_serving::<CatalogServer<CatalogService>>()
        .await;
}
