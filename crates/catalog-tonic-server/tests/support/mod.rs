//! In-process server harness for the integration tests.
//!
//! Each test gets its own server on a random loopback port, with direct
//! handles to the backing stores so effects can be asserted without going
//! back over the wire.

use catalog_tonic_core::proto::auth_server::AuthServer;
use catalog_tonic_core::proto::catalog_server::CatalogServer;
use catalog_tonic_core::proto::keyboard::Layout;
use catalog_tonic_core::proto::memory::Unit;
use catalog_tonic_core::proto::screen::{Panel, Resolution};
use catalog_tonic_core::proto::storage::Driver;
use catalog_tonic_core::proto::{Cpu, Gpu, Keyboard, Laptop, Memory, Screen, Storage};
use catalog_tonic_server::server::auth::{
    AuthService, AuthorizationLayer, TokenManager, catalog_access_policy,
};
use catalog_tonic_server::server::config::ServerConfig;
use catalog_tonic_server::server::service::CatalogService;
use catalog_tonic_server::server::store::{
    InMemoryLaptopStore, InMemoryRatingStore, InMemoryUserStore, MemoryImageStore, User, UserStore,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Channel, Server};
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret";

pub struct TestServer {
    pub addr: SocketAddr,
    pub laptops: Arc<InMemoryLaptopStore>,
    pub images: Arc<MemoryImageStore>,
    pub ratings: Arc<InMemoryRatingStore>,
    pub tokens: Arc<TokenManager>,
}

impl TestServer {
    pub async fn channel(&self) -> Channel {
        Channel::from_shared(format!("http://{}", self.addr))
            .unwrap()
            .connect()
            .await
            .unwrap()
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        server_addr: String::new(),
        token_secret: TEST_SECRET.to_owned(),
        token_duration: Duration::from_secs(900),
        image_dir: std::env::temp_dir(),
        stream_buffer_size: 8,
    }
}

/// Starts a server without the authorization layer.
pub async fn start_server() -> TestServer {
    start(false).await
}

/// Starts a server with the authorization layer installed.
pub async fn start_secured_server() -> TestServer {
    start(true).await
}

async fn start(secured: bool) -> TestServer {
    let tokens = Arc::new(TokenManager::new(TEST_SECRET, Duration::from_secs(900)));
    let laptops = Arc::new(InMemoryLaptopStore::new());
    let images = Arc::new(MemoryImageStore::new());
    let ratings = Arc::new(InMemoryRatingStore::new());

    let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    users
        .save(&User::new("admin1", "secret", "admin").unwrap())
        .unwrap();
    users
        .save(&User::new("user1", "secret", "user").unwrap())
        .unwrap();

    let catalog = CatalogService::new(
        test_config(),
        laptops.clone(),
        images.clone(),
        ratings.clone(),
    );
    let auth = AuthService::new(users, Arc::clone(&tokens));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let incoming = TcpListenerStream::new(listener);

    if secured {
        let authorization = AuthorizationLayer::new(Arc::clone(&tokens), catalog_access_policy());
        tokio::spawn(
            Server::builder()
                .layer(authorization)
                .add_service(CatalogServer::new(catalog))
                .add_service(AuthServer::new(auth))
                .serve_with_incoming(incoming),
        );
    } else {
        tokio::spawn(
            Server::builder()
                .add_service(CatalogServer::new(catalog))
                .add_service(AuthServer::new(auth))
                .serve_with_incoming(incoming),
        );
    }

    TestServer {
        addr,
        laptops,
        images,
        ratings,
        tokens,
    }
}

/// A fully populated laptop with a fresh UUID.
pub fn sample_laptop() -> Laptop {
    Laptop {
        id: Uuid::new_v4().to_string(),
        brand: "Lenovo".to_owned(),
        name: "Thinkpad X1".to_owned(),
        cpu: Some(Cpu {
            brand: "Intel".to_owned(),
            name: "Core i7-1185G7".to_owned(),
            num_cores: 4,
            num_threads: 8,
            min_ghz: 3.0,
            max_ghz: 4.8,
        }),
        ram: Some(Memory {
            value: 16,
            unit: Unit::Gigabyte as i32,
        }),
        gpus: vec![Gpu {
            brand: "NVIDIA".to_owned(),
            name: "GTX 1660-Ti".to_owned(),
            min_ghz: 1.2,
            max_ghz: 1.8,
            memory: Some(Memory {
                value: 6,
                unit: Unit::Gigabyte as i32,
            }),
        }],
        storages: vec![Storage {
            driver: Driver::Ssd as i32,
            memory: Some(Memory {
                value: 512,
                unit: Unit::Gigabyte as i32,
            }),
        }],
        screen: Some(Screen {
            size_inch: 14.0,
            resolution: Some(Resolution {
                width: 1920,
                height: 1080,
            }),
            panel: Panel::Ips as i32,
            multitouch: false,
        }),
        keyboard: Some(Keyboard {
            layout: Layout::Qwerty as i32,
            backlit: true,
        }),
        weight_kg: 1.1,
        price_usd: 1700.0,
        release_year: 2023,
    }
}

/// A laptop tailored for the search fixtures.
pub fn filter_laptop(price_usd: f64, num_cores: u32, min_ghz: f64, ram_gb: u64) -> Laptop {
    let mut laptop = sample_laptop();
    laptop.price_usd = price_usd;
    if let Some(cpu) = laptop.cpu.as_mut() {
        cpu.num_cores = num_cores;
        cpu.min_ghz = min_ghz;
    }
    laptop.ram = Some(Memory {
        value: ram_gb,
        unit: Unit::Gigabyte as i32,
    });
    laptop
}
