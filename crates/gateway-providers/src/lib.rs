//! # Gateway Providers
//!
//! Upstream provider integration for the Streamlake gateway.
//!
//! This crate provides:
//! - The [`ChatUpstream`] seam the server talks to
//! - The Streamlake HTTP transport, yielding raw body lines
//! - Line normalization into [`gateway_core::NormalizedEvent`]s

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod lines;
pub mod normalizer;
pub mod streamlake;
pub mod upstream;

// Re-export main types
pub use lines::LineSplitter;
pub use normalizer::LineNormalizer;
pub use streamlake::{StreamlakeClient, StreamlakeConfig, DEFAULT_BASE_URL, DEFAULT_READ_TIMEOUT};
pub use upstream::{ChatUpstream, LineStream};
