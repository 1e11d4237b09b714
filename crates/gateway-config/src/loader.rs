//! Layered configuration loading.
//!
//! Values are resolved in order: built-in defaults, then an optional YAML or
//! TOML file, then environment variables.

use secrecy::SecretString;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::config::{GatewayConfig, LogFormat};
use crate::error::{ConfigError, Result};

/// Upstream base URL
pub const ENV_UPSTREAM_URL: &str = "STREAMLAKE_API_URL";
/// Upstream bearer credential
pub const ENV_UPSTREAM_KEY: &str = "STREAMLAKE_API_KEY";
/// Shared gateway credential
pub const ENV_GATEWAY_KEY: &str = "GATEWAY_API_KEY";
/// Comma separated CORS origins
pub const ENV_CORS_ORIGINS: &str = "GATEWAY_CORS_ORIGINS";
/// Bind host
pub const ENV_HOST: &str = "GATEWAY_HOST";
/// Bind port
pub const ENV_PORT: &str = "GATEWAY_PORT";
/// Upstream read timeout, humantime syntax (`60s`, `2m`)
pub const ENV_UPSTREAM_TIMEOUT: &str = "GATEWAY_UPSTREAM_TIMEOUT";
/// Log filter directive
pub const ENV_LOG_LEVEL: &str = "GATEWAY_LOG_LEVEL";
/// Log output format
pub const ENV_LOG_FORMAT: &str = "GATEWAY_LOG_FORMAT";

/// Configuration loader
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    vars: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Create a loader reading the process environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a configuration file before applying the environment
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Resolve environment variables from the given map instead of the process
    #[must_use]
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Load and validate the configuration
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// value is malformed, or the result fails validation
    pub async fn load(&self) -> Result<GatewayConfig> {
        let mut config = match &self.file {
            Some(path) => {
                debug!(path = %path.display(), "Reading configuration file");
                let contents = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ConfigError::Io {
                        path: path.clone(),
                        source,
                    })?;
                parse_file(path, &contents)?
            }
            None => GatewayConfig::default(),
        };

        self.apply_env(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    fn var(&self, name: &str) -> Option<String> {
        let value = match &self.vars {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        value.map(|v| v.trim().to_string())
    }

    fn apply_env(&self, config: &mut GatewayConfig) -> Result<()> {
        if let Some(url) = self.var(ENV_UPSTREAM_URL).filter(|v| !v.is_empty()) {
            config.upstream.base_url = url;
        }

        // An empty credential means "unset", not "empty password".
        if let Some(key) = self.var(ENV_UPSTREAM_KEY) {
            config.upstream.api_key = non_empty_secret(key);
        }

        if let Some(key) = self.var(ENV_GATEWAY_KEY) {
            config.security.gateway_api_key = non_empty_secret(key);
        }

        if let Some(origins) = self.var(ENV_CORS_ORIGINS).filter(|v| !v.is_empty()) {
            config.security.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(host) = self.var(ENV_HOST).filter(|v| !v.is_empty()) {
            config.server.host = host;
        }

        if let Some(port) = self.var(ENV_PORT).filter(|v| !v.is_empty()) {
            config.server.port = port.parse().map_err(|e| ConfigError::InvalidEnv {
                name: ENV_PORT,
                message: format!("{e}"),
            })?;
        }

        if let Some(timeout) = self.var(ENV_UPSTREAM_TIMEOUT).filter(|v| !v.is_empty()) {
            config.upstream.read_timeout = parse_duration(ENV_UPSTREAM_TIMEOUT, &timeout)?;
        }

        if let Some(level) = self.var(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
            config.logging.level = level;
        }

        if let Some(format) = self.var(ENV_LOG_FORMAT).filter(|v| !v.is_empty()) {
            config.logging.format = format
                .parse::<LogFormat>()
                .map_err(|message| ConfigError::InvalidEnv {
                    name: ENV_LOG_FORMAT,
                    message,
                })?;
        }

        Ok(())
    }
}

/// Load configuration from the process environment only
///
/// # Errors
/// See [`ConfigLoader::load`]
pub async fn load_config() -> Result<GatewayConfig> {
    ConfigLoader::new().load().await
}

fn non_empty_secret(value: String) -> Option<SecretString> {
    if value.is_empty() {
        None
    } else {
        Some(SecretString::new(value))
    }
}

fn parse_duration(name: &'static str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value).map_err(|e| ConfigError::InvalidEnv {
        name,
        message: e.to_string(),
    })
}

fn parse_file(path: &Path, contents: &str) -> Result<GatewayConfig> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        other => Err(ConfigError::UnsupportedFormat(if other.is_empty() {
            path.display().to_string()
        } else {
            other.to_string()
        })),
    }
}
