//! Configuration error types.

use std::path::PathBuf;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration error type.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file {path}: {message}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Unsupported configuration file extension.
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// An environment variable held an unusable value.
    #[error("Invalid value for environment variable {name}: {message}")]
    InvalidEnv {
        /// Variable name
        name: &'static str,
        /// Reason the value was rejected
        message: String,
    },

    /// A loaded value failed validation.
    #[error("Invalid configuration for {field}: {message}")]
    Invalid {
        /// Dotted field path
        field: &'static str,
        /// Reason the value was rejected
        message: String,
    },
}
