//! Tracing setup for the server binary.
//!
//! Log output goes through `tracing-subscriber`'s fmt layer. The filter is
//! taken from `RUST_LOG` and falls back to `info`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
