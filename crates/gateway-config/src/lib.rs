//! # Gateway Config
//!
//! Configuration management for the Streamlake gateway.
//!
//! Configuration is read once at startup from built-in defaults, an optional
//! YAML/TOML file, and environment variables, in that order of precedence.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod loader;

pub use config::{
    GatewayConfig, LogFormat, LoggingSettings, SecuritySettings, ServerSettings, UpstreamSettings,
};
pub use error::{ConfigError, Result};
pub use loader::{load_config, ConfigLoader};
