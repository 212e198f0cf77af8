//! Error types for kantan-cms-mcp configuration.
//!
//! # Security Note
//!
//! Error messages are carefully crafted to NEVER include credentials.
//! Variants describing a missing or invalid credential name the variable,
//! never its value.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while assembling the process configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is absent or empty.
    #[error("{name} environment variable is not set.")]
    MissingEnvVar {
        /// Name of the environment variable.
        name: &'static str,
    },

    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

impl ConfigError {
    /// Returns `true` if this error is caused by a missing credential variable.
    #[must_use]
    pub const fn is_missing_env(&self) -> bool {
        matches!(self, Self::MissingEnvVar { .. })
    }
}
