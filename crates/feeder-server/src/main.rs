//! Pet-feeder hub server.

use anyhow::Result;
use clap::Parser;
use feeder_server::{build_router, config, heartbeat, logging};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use feeder_server::state::AppState;
use logging::{LogConfig, LogFormat};

/// Message hub for pet-feeder devices and their dashboards.
#[derive(Parser, Debug)]
#[command(name = "feeder-server")]
#[command(about = "WebSocket message hub for IoT pet feeders")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Override the front-end asset directory
    #[arg(long, value_name = "DIR")]
    static_dir: Option<PathBuf>,

    /// Enable verbose logging (INFO level for every target)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging (DEBUG level, excludes ping traces)
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "dispatch=debug" or "ws::ping=trace").
    /// Can be specified multiple times. Targets are prefixed with "feeder::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(static_dir) = cli.static_dir {
        config.static_dir = static_dir;
    }

    tracing::info!(
        target: "feeder::startup",
        "Loaded configuration (port: {}, static dir: {})",
        config.port,
        config.static_dir.display()
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(AppState::new(config));

    heartbeat::spawn_heartbeat(state.clone());
    tracing::info!(
        target: "feeder::startup",
        "Started heartbeat (every {}s)",
        state.config.ping_interval().as_secs()
    );

    let app = build_router(state);

    tracing::info!(target: "feeder::startup", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
