//! api-mocker server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ mount 1 ──▶ mount 2 ──▶ ... ──▶ 404
//!                       (request id,    │            │
//!                        trace, timeout) ▼           ▼
//!                                   routing (path → index → resolver)
//!                                        │
//!                                        ▼
//!     Client Response              dispatch
//!     ◀──────────────────────────  data file bytes | handler chain
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_mocker::config::validation::validate_config;
use api_mocker::config::{load_config, ConfigError, MockServerConfig, MountConfig};
use api_mocker::lifecycle::{shutdown_on_signal, Shutdown};
use api_mocker::observability::{init_tracing, metrics};
use api_mocker::MockServer;

#[derive(Parser)]
#[command(name = "api-mocker")]
#[command(about = "Serve HTTP mocks from a directory tree", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// Default log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Mount a mock directory as BASE=DIR (repeatable)
    #[arg(short, long = "mount", value_parser = parse_mount)]
    mounts: Vec<MountConfig>,
}

fn parse_mount(arg: &str) -> Result<MountConfig, String> {
    let (base, dir) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected BASE=DIR, got '{arg}'"))?;
    if dir.is_empty() {
        return Err(format!("missing directory in '{arg}'"));
    }
    Ok(MountConfig::new(dir).base_url(base))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MockServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    config.mounts.extend(cli.mounts);

    init_tracing(&config.observability.log_level);
    tracing::info!("api-mocker v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(error = %error, "Invalid configuration");
        }
        return Err(ConfigError::Validation(errors).into());
    }
    if config.mounts.is_empty() {
        tracing::warn!("No mounts configured, every request will get 404");
    }

    for mount in &config.mounts {
        tracing::info!(
            base_url = mount.base_url.as_deref().unwrap_or("/"),
            dir = %mount.target.display(),
            response_type = %mount.response_type,
            "Mount configured"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let server = MockServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
