//! # Gateway Core
//!
//! Core types and error handling for the Streamlake gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - Inbound request and outbound upstream payload types
//! - Normalized streaming events
//! - The aggregated non-streaming response
//! - The gateway error taxonomy

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod request;
pub mod response;
pub mod streaming;

/// Identifier of the single supported upstream provider
pub const PROVIDER_ID: &str = "streamlake";

// Re-export commonly used types
pub use error::{GatewayError, GatewayResult};
pub use request::{ChatMessage, ChatRequest, MessageRole, UpstreamRequest};
pub use response::{AggregatedResult, HealthResponse};
pub use streaming::{provider_metadata, EventStream, NormalizedEvent};
