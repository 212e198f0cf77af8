//! Configuration loading and parsing.
//!
//! Two sources feed the runtime configuration:
//!
//! - **Environment**: `PROJECT_ID` and `CMS_API_KEY` (required, see [`Credentials`])
//! - **Settings file** (optional): base URL, template locations, log level
//!
//! Both are combined once at process entry into a [`CmsConfig`] that is passed
//! explicitly to every component.
//!
//! # Configuration File Locations
//!
//! The settings file is searched in the following order:
//!
//! 1. Path given on the command line
//! 2. Default location:
//!    - **Linux/macOS:** `~/.kantan-cms-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.kantan-cms-mcp\config.json`
//!
//! A missing default file is not an error; built-in defaults apply.

mod cms_config;
mod credentials;
mod settings;

pub use cms_config::CmsConfig;
pub use credentials::{Credentials, API_KEY_VAR, PROJECT_ID_VAR};
pub use settings::{
    Config, LoggingConfig, TemplateConfig, DEFAULT_BASE_URL, DEFAULT_BUN_TEMPLATE_URL,
    DEFAULT_PYTHON_TEMPLATE_URL,
};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.kantan-cms-mcp/`
/// - **Windows:** `%USERPROFILE%\.kantan-cms-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".kantan-cms-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses the settings file.
///
/// If `path` is `None`, uses the platform-specific default location and
/// falls back to defaults when no file exists there.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - Fields are invalid
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                tracing::debug!("No settings file found, using defaults");
                return Ok(Config::default());
            }
        },
    };

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    // Validate the configuration
    config.validate()?;

    Ok(config)
}
