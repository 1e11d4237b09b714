//! Response types for the gateway.

use serde::{Deserialize, Serialize};

/// Consolidated result returned to non-streaming clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Concatenated chunk content, in arrival order
    pub content: String,
    /// Provider that produced the content
    pub provider: String,
}

impl AggregatedResult {
    /// Create a new aggregated result
    #[must_use]
    pub fn new(content: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            provider: provider.into(),
        }
    }
}

/// Health check response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status, always `ok` while the process serves requests
    pub status: String,
}

impl HealthResponse {
    /// The healthy response
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
