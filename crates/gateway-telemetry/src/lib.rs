//! # Gateway Telemetry
//!
//! Observability for the Streamlake gateway.
//!
//! This crate provides:
//! - Structured logging via `tracing-subscriber`
//! - Prometheus metrics for chat requests and normalized events

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod metrics;

// Re-export main types
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingError};
pub use metrics::{Metrics, MetricsConfig, ResponseMode};
