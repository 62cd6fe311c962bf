//! # Server Binary Entry Point
//!
//! Thin wrapper that loads configuration and serves the watermarking API.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin server -- --config config/markora.toml
//! ```
//!
//! The server will:
//! 1. Load configuration from the specified TOML file (defaults if omitted)
//! 2. Initialize the server core (marker policy + LSB codec)
//! 3. Serve `/api/upload`, `/api/detect` and `/api/health`

use clap::Parser;
use log::info;

// Import from the library crate
use markora::common::config::MarkoraConfig;
use markora::common::logging::init_logger;
use markora::processing::MarkerPolicy;
use markora::server::{router, ServerCore};

/// Command-line arguments for the server binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (TOML format)
    ///
    /// Example: config/markora.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address, overriding `server.address` from the config file
    #[arg(short, long)]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logger();

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = MarkoraConfig::load(args.config.as_deref())?;
    if let Some(address) = args.address {
        config.server.address = address;
    }

    let policy = MarkerPolicy::new(config.watermark.detector_config());
    let core = ServerCore::new(policy);
    let app = router(core, &config.server);

    info!("🚀 Marker: {:?}", config.watermark.marker);
    info!("🌐 Web server running on http://{}", config.server.address);
    info!(
        "📡 API endpoints: /api/upload, /api/detect (max upload {} bytes)",
        config.server.max_upload_bytes
    );

    let listener = tokio::net::TcpListener::bind(&config.server.address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
