//! QuietCool Bridge Server
//!
//! Discovers the fans behind one QuietCool controller and publishes them
//! as accessories over a REST API.
//!
//! The controller endpoint comes from the config file and can be
//! overridden with `--endpoint`. With `--mock`, a simulated controller
//! with two demo fans is used instead.

use anyhow::Result;
use clap::Parser;
use quietcool_controller::{ControllerClient, HttpControllerClient, MockController};
use quietcoold::api::{self, AppState};
use quietcoold::shutdown::shutdown_signal;
use quietcoold::{config, AccessoryRegistry, BridgeHost, Platform};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// QuietCool Bridge Server
#[derive(Parser, Debug)]
#[command(name = "quietcoold")]
#[command(version, about = "QuietCool Accessory Bridge Server", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server bind address (defaults to the configured hostname)
    #[arg(short, long)]
    bind: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Controller address, host or host:port (overrides config)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Use a simulated controller with two demo fans
    #[arg(long)]
    mock: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose);

    info!("QuietCool Bridge starting...");

    let config_path = config::resolve_config_path(args.config);
    info!("Configuration file: {}", config_path.display());

    let mut static_config = config::load_static_config(&config_path).await?;
    if let Some(endpoint) = args.endpoint {
        static_config.controller.endpoint = endpoint;
    }
    info!("Configuration loaded successfully");

    let client: Arc<dyn ControllerClient> = if args.mock {
        info!("Mock mode: using simulated controller");
        Arc::new(MockController::demo())
    } else {
        let timeout = Duration::from_secs(static_config.controller.communication_timeout);
        Arc::new(HttpControllerClient::new(timeout)?)
    };

    // Discovery runs once; the accessory set is fixed for the process lifetime
    let mut platform = Platform::new(&static_config.controller, client)?;
    let adapters = platform.accessories().await?;

    let host = BridgeHost::new();
    let registry = AccessoryRegistry::publish(&host, &adapters);

    let state = AppState::new(registry, platform.endpoint().to_string(), args.mock);
    let app = api::create_router(state);

    let server_config = &static_config.server;
    let bind = args.bind.unwrap_or_else(|| server_config.hostname.clone());
    let port = args.port.unwrap_or(server_config.port);
    let bind_addr = format!("{}:{}", bind, port);

    info!("Starting server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("QuietCool Bridge listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
