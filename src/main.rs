//! battery-runtime: tracks how long the machine has run on battery since it
//! was last unplugged, and keeps the count across restarts.
//!
//! Run with:  `RUST_LOG=info battery-runtime`

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Structured logging. RUST_LOG controls verbosity (default: info).
    // Logs go to stderr; stdout carries the panel output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("battery-runtime v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match brt_config::load(brt_config::default_path()) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{e}; using defaults");
            brt_config::Config::default()
        }
    };

    brt_daemon::run(config).await
}
