//! CMS credentials sourced from the process environment.

use std::fmt;

use crate::error::ConfigError;

/// Environment variable holding the project identifier.
pub const PROJECT_ID_VAR: &str = "PROJECT_ID";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "CMS_API_KEY";

/// Project identifier and API key used to authenticate every CMS request.
///
/// Both values are guaranteed non-empty once constructed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    project_id: String,
    api_key: String,
}

impl Credentials {
    /// Creates credentials from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if either value is empty.
    /// The project identifier is checked first.
    pub fn new(
        project_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let project_id = project_id.into();
        let api_key = api_key.into();

        if project_id.is_empty() {
            return Err(ConfigError::MissingEnvVar {
                name: PROJECT_ID_VAR,
            });
        }
        if api_key.is_empty() {
            return Err(ConfigError::MissingEnvVar { name: API_KEY_VAR });
        }

        Ok(Self {
            project_id,
            api_key,
        })
    }

    /// Reads `PROJECT_ID` and `CMS_API_KEY` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if either variable is absent,
    /// empty, or not valid Unicode.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the credential variables through an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Credentials::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_id = lookup(PROJECT_ID_VAR).unwrap_or_default();
        let api_key = lookup(API_KEY_VAR).unwrap_or_default();
        Self::new(project_id, api_key)
    }

    /// The project identifier.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

// The API key must never reach logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
