//! Demo client for the catalog service: logs in, creates a handful of
//! laptops, then exercises search, image upload and rating.

use anyhow::Context;
use bytes::Bytes;
use catalog_tonic_client::auth::{AuthClient, AuthInterceptor, Credentials, auth_methods};
use catalog_tonic_client::catalog::CatalogClient;
use catalog_tonic_core::proto::{
    Cpu, Laptop, LaptopFilter, Memory, RateLaptopRequest, memory::Unit,
};
use clap::Parser;
use std::time::Duration;
use tonic::transport::Channel;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "catalog-tonic-client",
    version,
    about = "Demo client for the laptop catalog service"
)]
struct CliArgs {
    /// Server URL, e.g. "http://127.0.0.1:50051".
    ///
    /// Environment variable: `SERVER_URL`
    #[arg(long, env = "SERVER_URL", default_value_t = String::from("http://127.0.0.1:50051"))]
    server_url: String,

    /// Username presented at login.
    ///
    /// Environment variable: `CATALOG_USERNAME`
    #[arg(long, env = "CATALOG_USERNAME", default_value_t = String::from("admin1"))]
    username: String,

    /// Password presented at login.
    ///
    /// Environment variable: `CATALOG_PASSWORD`
    #[arg(long, env = "CATALOG_PASSWORD", default_value_t = String::from("secret"))]
    password: String,

    /// Seconds between access-token refreshes.
    ///
    /// Environment variable: `REFRESH_INTERVAL_SECS`
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value_t = 30)]
    refresh_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let channel = Channel::from_shared(args.server_url.clone())
        .context("invalid server URL")?
        .connect()
        .await
        .context("cannot connect to server")?;

    let auth = AuthClient::new(
        channel.clone(),
        Credentials {
            username: args.username,
            password: args.password,
        },
    );
    let (interceptor, refresh) = AuthInterceptor::with_refresh(
        auth,
        auth_methods(),
        Duration::from_secs(args.refresh_interval_secs),
    )
    .await
    .context("initial login failed")?;

    let mut catalog = CatalogClient::new(channel, interceptor);

    let mut ids = Vec::new();
    for index in 0..10 {
        let id = catalog.create_laptop(sample_laptop(index)).await?;
        tracing::info!(%id, "created laptop");
        ids.push(id);
    }

    let filter = LaptopFilter {
        max_price_usd: 3000.0,
        min_cpu_cores: 4,
        min_cpu_ghz: 2.5,
        min_ram: Some(Memory {
            value: 8,
            unit: Unit::Gigabyte as i32,
        }),
    };
    for laptop in catalog.search_laptop(filter).await? {
        tracing::info!(
            id = %laptop.id,
            name = %laptop.name,
            price_usd = laptop.price_usd,
            "found laptop"
        );
    }

    let image = Bytes::from(vec![0u8; 64 * 1024]);
    let uploaded = catalog.upload_image(&ids[0], ".jpg", image).await?;
    tracing::info!(id = %uploaded.id, size = uploaded.size, "uploaded image");

    let ratings = ids
        .iter()
        .map(|id| RateLaptopRequest {
            laptop_id: id.clone(),
            score: 8.0,
        })
        .collect();
    for response in catalog.rate_laptop(ratings).await? {
        tracing::info!(
            id = %response.laptop_id,
            count = response.rated_count,
            average = response.average_score,
            "rated laptop"
        );
    }

    refresh.shutdown().await;
    Ok(())
}

fn sample_laptop(index: usize) -> Laptop {
    let cores = 2 + (index as u32 % 4) * 2;
    Laptop {
        id: Uuid::new_v4().to_string(),
        brand: "Lenovo".to_owned(),
        name: format!("Thinkpad X{index}"),
        cpu: Some(Cpu {
            brand: "Intel".to_owned(),
            name: "Core i7".to_owned(),
            num_cores: cores,
            num_threads: cores * 2,
            min_ghz: 2.0 + index as f64 * 0.2,
            max_ghz: 4.0 + index as f64 * 0.1,
        }),
        ram: Some(Memory {
            value: 8 + (index as u64 % 3) * 8,
            unit: Unit::Gigabyte as i32,
        }),
        weight_kg: 1.5,
        price_usd: 1500.0 + index as f64 * 200.0,
        release_year: 2024,
        ..Default::default()
    }
}
