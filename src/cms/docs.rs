//! Client for the Kantan CMS documentation endpoints.
//!
//! Documentation is plain text. Every fetch is preceded by an attempt to
//! load a version-tagged notification banner; that attempt is allowed to
//! fail and simply yields no banner.

use crate::cms::error::{CmsError, CmsResult};
use crate::config::{CmsConfig, Credentials};

/// Header carrying the project identifier on documentation requests.
pub const DOCS_PROJECT_ID_HEADER: &str = "X-Project-ID";

/// Header carrying the API key on documentation requests.
pub const DOCS_API_KEY_HEADER: &str = "X-API-Key";

/// Documentation path of the API table of contents.
pub const TOC_PATH: &str = "api/";

/// Documentation path of the build instructions.
pub const BUILD_INSTRUCTIONS_PATH: &str = "instruction/build";

/// Documentation path of the form integration instructions.
pub const FORM_INSTRUCTIONS_PATH: &str = "instruction/form";

/// Documentation path of the notification banner.
pub const NOTIFICATION_PATH: &str = "updates";

/// Client for `{base_url}/v1/docs`.
#[derive(Debug, Clone)]
pub struct DocsClient {
    http: reqwest::Client,
    docs_root: String,
    credentials: Credentials,
}

impl DocsClient {
    /// Creates a client from the runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CmsError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &CmsConfig) -> CmsResult<Self> {
        Ok(Self::with_http_client(crate::cms::http_client()?, config))
    }

    /// Creates a client around an existing HTTP client.
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, config: &CmsConfig) -> Self {
        Self {
            http,
            docs_root: format!("{}/v1/docs", config.base_url),
            credentials: config.credentials.clone(),
        }
    }

    /// Fetches one documentation page as text.
    ///
    /// # Errors
    ///
    /// Returns [`CmsError::Transport`] or [`CmsError::Http`] on failure.
    pub async fn fetch(&self, path: &str) -> CmsResult<String> {
        self.get(path, &[]).await
    }

    /// Fetches the notification banner for this server version.
    ///
    /// Returns the banner prefixed with `Note: `.
    ///
    /// # Errors
    ///
    /// Returns [`CmsError::Transport`] or [`CmsError::Http`] on failure.
    pub async fn notification(&self) -> CmsResult<String> {
        let text = self
            .get(NOTIFICATION_PATH, &[("version", env!("CARGO_PKG_VERSION"))])
            .await?;
        Ok(format!("Note: {text}"))
    }

    /// Fetches a documentation page with the notification banner prepended.
    ///
    /// A failed notification fetch degrades to no banner; only a failure of
    /// the page itself is an error.
    ///
    /// # Errors
    ///
    /// Returns [`CmsError::Transport`] or [`CmsError::Http`] if the page
    /// cannot be fetched.
    pub async fn fetch_text(&self, path: &str) -> CmsResult<String> {
        let notification = match self.notification().await {
            Ok(note) => Some(note),
            Err(e) => {
                tracing::warn!(error = %e.to_chain_string(), "Skipping documentation notification");
                None
            }
        };

        let body = self.fetch(path).await?;

        Ok(notification
            .into_iter()
            .chain(std::iter::once(body))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// The API table of contents.
    ///
    /// # Errors
    ///
    /// See [`DocsClient::fetch_text`].
    pub async fn table_of_contents(&self) -> CmsResult<String> {
        self.fetch_text(TOC_PATH).await
    }

    /// Documentation for one API category.
    ///
    /// # Errors
    ///
    /// See [`DocsClient::fetch_text`].
    pub async fn category(&self, category_name: &str) -> CmsResult<String> {
        self.fetch_text(&format!("api/{category_name}")).await
    }

    /// Instructions for writing a build script.
    ///
    /// # Errors
    ///
    /// See [`DocsClient::fetch_text`].
    pub async fn build_instructions(&self) -> CmsResult<String> {
        self.fetch_text(BUILD_INSTRUCTIONS_PATH).await
    }

    /// Instructions for sending form submissions to the CMS.
    ///
    /// # Errors
    ///
    /// See [`DocsClient::fetch_text`].
    pub async fn form_instructions(&self) -> CmsResult<String> {
        self.fetch_text(FORM_INSTRUCTIONS_PATH).await
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> CmsResult<String> {
        let url = format!("{}/{path}", self.docs_root);
        tracing::debug!(url = %url, "Fetching documentation");

        let mut builder = self
            .http
            .get(&url)
            .header(DOCS_PROJECT_ID_HEADER, self.credentials.project_id())
            .header(DOCS_API_KEY_HEADER, self.credentials.api_key());
        if !query.is_empty() {
            builder = builder.query(query);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CmsError::transport(url.as_str(), e))?;
        crate::cms::read_checked(response, &url).await
    }
}
