//! HTTP server lifecycle.

use std::{future::IntoFuture, net::SocketAddr, time::Duration};
use tokio::{net::TcpListener, sync::watch};
use tracing::{info, warn};

use crate::{routes::create_router, shutdown::shutdown_signal, state::AppState};

/// Default time allowed for in-flight streams to finish after a shutdown signal
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Listener address is not a valid socket address
    #[error("Invalid listen address {addr}: {message}")]
    InvalidAddress {
        /// Address as configured
        addr: String,
        /// Parse failure
        message: String,
    },

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address being bound
        addr: SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Server failed while running
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Drain period after a shutdown signal
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind host
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the bind port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the drain period
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Socket address to bind
    ///
    /// # Errors
    /// Returns error if host and port do not form a socket address
    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|e: std::net::AddrParseError| ServerError::InvalidAddress {
            addr,
            message: e.to_string(),
        })
    }
}

/// The gateway HTTP server
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a server
    #[must_use]
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Serve until a shutdown signal arrives and in-flight requests drain.
    ///
    /// Streams still open when the drain period ends are aborted.
    ///
    /// # Errors
    /// Returns error if the listener cannot be bound or the server fails
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        info!(
            addr = %addr,
            upstream = self.state.upstream.id(),
            upstream_configured = self.state.upstream.is_configured(),
            auth_required = self.state.gate.requires_key(),
            "Gateway listening"
        );

        let (signalled_tx, mut signalled_rx) = watch::channel(false);
        let app = create_router(self.state);
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(true);
            })
            .into_future();

        let mut server = tokio::spawn(serve);

        tokio::select! {
            result = &mut server => return flatten(result),
            _ = signalled_rx.wait_for(|signalled| *signalled) => {}
        }

        info!(timeout = ?self.config.shutdown_timeout, "Draining in-flight requests");

        match tokio::time::timeout(self.config.shutdown_timeout, &mut server).await {
            Ok(result) => {
                info!("Server stopped");
                flatten(result)
            }
            Err(_) => {
                warn!("Drain period elapsed, aborting open connections");
                server.abort();
                Ok(())
            }
        }
    }
}

fn flatten(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    match result {
        Ok(inner) => inner.map_err(ServerError::from),
        Err(e) => Err(ServerError::Serve(std::io::Error::new(
            std::io::ErrorKind::Other,
            e.to_string(),
        ))),
    }
}
