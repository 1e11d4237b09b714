//! Error taxonomy for the gateway.
//!
//! Every failure the gateway can produce is a [`GatewayError`]. Variants map
//! one-to-one onto the HTTP status a client observes when the failure is
//! surfaced before a streaming response has started.

use std::time::Duration;

/// Result alias used across the gateway crates
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Malformed or out-of-range request, rejected before any upstream call
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable description
        message: String,
        /// Offending field, if known
        field: Option<String>,
        /// Machine readable code
        code: String,
    },

    /// Gateway credential missing or mismatched
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Human readable description
        message: String,
    },

    /// Upstream integration is not configured
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human readable description
        message: String,
    },

    /// Connection, read, or non-success status failure talking to the upstream
    #[error("Transport error from {provider}: {message}")]
    Transport {
        /// Provider identifier
        provider: String,
        /// Human readable description
        message: String,
        /// Upstream HTTP status, when the upstream answered
        status_code: Option<u16>,
    },

    /// The upstream stayed silent longer than the read timeout
    #[error("Upstream {provider} timed out after {duration:?}")]
    Timeout {
        /// Provider identifier
        provider: String,
        /// Configured read timeout
        duration: Duration,
    },

    /// The upstream reported an error in the middle of its event stream
    #[error("Upstream error: {message}")]
    UpstreamProtocol {
        /// Error text carried by the terminal error event
        message: String,
    },

    /// Unexpected internal failure
    #[error("Internal error: {message}")]
    Internal {
        /// Human readable description
        message: String,
    },
}

impl GatewayError {
    /// Create a validation error
    pub fn validation(
        message: impl Into<String>,
        field: Option<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field,
            code: code.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(
        provider: impl Into<String>,
        message: impl Into<String>,
        status_code: Option<u16>,
    ) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
            status_code,
        }
    }

    /// Create a timeout error
    pub fn timeout(provider: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            provider: provider.into(),
            duration,
        }
    }

    /// Create an upstream protocol error
    pub fn upstream_protocol(message: impl Into<String>) -> Self {
        Self::UpstreamProtocol {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Authentication { .. } => 401,
            Self::Configuration { .. } => 503,
            Self::Transport { .. } | Self::UpstreamProtocol { .. } => 502,
            Self::Timeout { .. } => 504,
            Self::Internal { .. } => 500,
        }
    }

    /// Short error type used in API error bodies
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "invalid_request_error",
            Self::Authentication { .. } => "authentication_error",
            Self::Configuration { .. } => "service_unavailable",
            Self::Transport { .. } => "upstream_transport_error",
            Self::Timeout { .. } => "upstream_timeout",
            Self::UpstreamProtocol { .. } => "upstream_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Message without the variant prefix added by `Display`
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message, .. }
            | Self::Authentication { message }
            | Self::Configuration { message }
            | Self::Transport { message, .. }
            | Self::UpstreamProtocol { message }
            | Self::Internal { message } => message.clone(),
            Self::Timeout { .. } => self.to_string(),
        }
    }

    /// Whether the error was raised before any upstream call was made
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::Authentication { .. } | Self::Configuration { .. }
        )
    }
}
