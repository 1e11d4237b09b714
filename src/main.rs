//! # Streamlake Gateway
//!
//! Streaming chat-completion gateway in front of the Streamlake provider.
//!
//! ## Features
//!
//! - `POST /chat` relaying normalized SSE frames or an aggregated answer
//! - Optional shared-credential access control
//! - Prometheus metrics and structured logging
//!
//! ## Usage
//!
//! ```bash
//! # Start with environment configuration (a .env file is honored)
//! STREAMLAKE_API_KEY=sk-... streamlake-gateway
//!
//! # Start with a config file and a port override
//! streamlake-gateway --config gateway.yaml --port 9000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use gateway_config::{ConfigLoader, GatewayConfig, LogFormat};
use gateway_providers::{StreamlakeClient, StreamlakeConfig};
use gateway_server::{AppState, Server, ServerConfig};
use gateway_telemetry::init_logging;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Streamlake Gateway - streaming chat completions over SSE
#[derive(Parser, Debug)]
#[command(name = "streamlake-gateway")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (YAML or TOML)
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Bind host
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level or filter directive
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env file: {e}");
        }
    }

    let cli = Cli::parse();

    let config = match load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging.to_logging_config()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Streamlake Gateway"
    );

    if let Err(e) = run(config).await {
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

/// Main application logic
async fn run(config: GatewayConfig) -> Result<()> {
    info!(
        host = %config.server.host,
        port = config.server.port,
        upstream = %config.upstream.base_url,
        read_timeout = ?config.upstream.read_timeout,
        "Configuration loaded"
    );

    if !config.upstream.is_configured() {
        warn!("STREAMLAKE_API_KEY not set, chat requests will be refused with 503");
    }

    let client_config = StreamlakeConfig::new(&config.upstream.base_url)
        .with_secret(config.upstream.api_key.clone())
        .with_read_timeout(config.upstream.read_timeout);
    let upstream = StreamlakeClient::new(client_config).context("Failed to create upstream client")?;

    let server_config = ServerConfig::new()
        .with_host(&config.server.host)
        .with_port(config.server.port);

    let state = AppState::builder()
        .config(config)
        .upstream(Arc::new(upstream))
        .build()
        .context("Failed to build application state")?;

    Server::new(server_config, state)
        .run()
        .await
        .context("Server error")?;

    Ok(())
}

/// Load configuration and apply command-line overrides
async fn load_config(cli: &Cli) -> Result<GatewayConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }

    let mut config = loader
        .load()
        .await
        .context("Failed to load configuration")?;

    if let Some(host) = &cli.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if cli.json_logs {
        config.logging.format = LogFormat::Json;
    }

    Ok(config)
}
