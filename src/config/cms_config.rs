//! The immutable runtime configuration handed to every component.

use super::credentials::{Credentials, API_KEY_VAR, PROJECT_ID_VAR};
use super::settings::{Config, TemplateConfig};

/// Everything the CMS-facing components need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct CmsConfig {
    /// Authentication values.
    pub credentials: Credentials,
    /// CMS base URL without a trailing slash.
    pub base_url: String,
    /// Starter template download locations.
    pub templates: TemplateConfig,
}

impl CmsConfig {
    /// Creates a configuration from credentials and a base URL, with the
    /// default template locations.
    #[must_use]
    pub fn new(credentials: Credentials, base_url: impl Into<String>) -> Self {
        Self {
            credentials,
            base_url: normalise_base_url(base_url.into()),
            templates: TemplateConfig::default(),
        }
    }

    /// Combines credentials with the settings file.
    #[must_use]
    pub fn from_settings(credentials: Credentials, settings: &Config) -> Self {
        Self {
            credentials,
            base_url: normalise_base_url(settings.base_url.clone()),
            templates: settings.templates.clone(),
        }
    }

    /// Replaces the template download locations.
    #[must_use]
    pub fn with_templates(mut self, templates: TemplateConfig) -> Self {
        self.templates = templates;
        self
    }

    /// Renders `.env` content for a project integrating with the CMS.
    ///
    /// The API key is always rendered empty.
    #[must_use]
    pub fn env_file_content(&self) -> String {
        format!(
            "{PROJECT_ID_VAR}={}\n{API_KEY_VAR}=",
            self.credentials.project_id()
        )
    }
}

fn normalise_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
