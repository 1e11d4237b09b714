//! # Gateway Server
//!
//! HTTP server implementation for the Streamlake gateway.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - `POST /chat` with streaming (SSE) and aggregated responses
//! - Credential and request admission checks
//! - Health and Prometheus metrics endpoints
//! - Graceful shutdown handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod composer;
pub mod error;
pub mod extractors;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;

// Re-export main types
pub use composer::ExchangeRecorder;
pub use error::ApiError;
pub use gate::{RequestGate, API_KEY_HEADER};
pub use routes::create_router;
pub use server::{Server, ServerConfig, ServerError};
pub use shutdown::shutdown_signal;
pub use state::{AppState, AppStateBuilder};
