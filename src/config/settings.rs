//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.
//! Credentials are deliberately absent: they only ever come from the
//! environment (see [`super::Credentials`]).

use serde::Deserialize;

use crate::error::ConfigError;

/// Production CMS endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.kantan-cms.com";

/// Starter template archive for the Python builder.
pub const DEFAULT_PYTHON_TEMPLATE_URL: &str =
    "https://github.com/kantan-cms/website-base-py/archive/refs/tags/v0.0.0.zip";

/// Starter template archive for the Bun builder.
pub const DEFAULT_BUN_TEMPLATE_URL: &str =
    "https://github.com/kantan-cms/website-base-bun/archive/refs/tags/v0.0.0.zip";

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Base URL of the CMS (API and documentation live below it).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Starter template download locations.
    #[serde(default)]
    pub templates: TemplateConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            _schema: None,
            _comment: None,
            base_url: default_base_url(),
            templates: TemplateConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("base_url", &self.base_url)?;
        validate_url("templates.python_url", &self.templates.python_url)?;
        validate_url("templates.bun_url", &self.templates.bun_url)?;
        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        message: format!("Invalid {field} '{value}'. Must start with http:// or https://"),
    })
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Starter template configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    /// Archive URL for the `python` flavor.
    #[serde(default = "default_python_url")]
    pub python_url: String,

    /// Archive URL for the `bun` flavor.
    #[serde(default = "default_bun_url")]
    pub bun_url: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            python_url: default_python_url(),
            bun_url: default_bun_url(),
        }
    }
}

fn default_python_url() -> String {
    DEFAULT_PYTHON_TEMPLATE_URL.to_string()
}

fn default_bun_url() -> String {
    DEFAULT_BUN_TEMPLATE_URL.to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
