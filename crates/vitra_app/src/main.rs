//! Liquid glass demo
//!
//! Run with: cargo run -p vitra_app
//! Logging follows RUST_LOG (default `vitra=info`).

use tracing_subscriber::EnvFilter;
use vitra_app::AppConfig;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vitra=info")),
        )
        .init();

    vitra_app::run(AppConfig::from_env())
}
