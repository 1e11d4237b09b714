//! Configuration types for the gateway.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::{ConfigError, Result};

pub use gateway_telemetry::LogFormat;
use gateway_telemetry::LoggingConfig;

/// Default upstream base URL
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.streamlake.ai/v1";

/// Default upstream read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Root gateway configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP listener settings
    pub server: ServerSettings,
    /// Upstream provider settings
    pub upstream: UpstreamSettings,
    /// Access control settings
    pub security: SecuritySettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl GatewayConfig {
    /// Validate the loaded configuration
    ///
    /// # Errors
    /// Returns the first invalid setting
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.upstream.base_url).map_err(|e| ConfigError::Invalid {
            field: "upstream.base_url",
            message: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "upstream.base_url",
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.upstream.read_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "upstream.read_timeout",
                message: "must be greater than zero".to_string(),
            });
        }

        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "server.host",
                message: "cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Upstream provider settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    /// Bearer credential; the integration is disabled when unset
    pub api_key: Option<SecretString>,
    /// Longest silence tolerated while waiting for upstream data
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            api_key: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl UpstreamSettings {
    /// Whether a non-empty upstream credential is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty())
    }
}

/// Access control settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Shared credential expected in `X-API-Key`; open access when unset
    pub gateway_api_key: Option<SecretString>,
    /// Allowed CORS origins, `*` allows any
    pub cors_origins: Vec<String>,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            gateway_api_key: None,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingSettings {
    /// Subscriber configuration for these settings
    #[must_use]
    pub fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig::new()
            .with_level(&self.level)
            .with_format(self.format)
    }
}
