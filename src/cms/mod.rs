//! Kantan CMS HTTP clients.
//!
//! - [`CmsClient`]: authenticated JSON calls against `{base_url}/v1/api`
//! - [`DocsClient`]: plain-text documentation under `{base_url}/v1/docs`
//!
//! Every call is a single request/response round trip. A status of 400 or
//! above is always a [`CmsError::Http`]; nothing is retried.

pub mod client;
pub mod docs;
pub mod error;

pub use client::{ApiRequest, CmsClient};
pub use docs::DocsClient;
pub use error::{CmsError, CmsResult};

/// `User-Agent` sent with every outbound request.
pub const USER_AGENT: &str = concat!("kantan-cms-mcp/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by the CMS-facing components.
///
/// # Errors
///
/// Returns [`CmsError::Client`] if the TLS backend cannot be initialised.
pub fn http_client() -> CmsResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|source| CmsError::Client { source })
}

/// Any status from 400 up, including non-standard codes above 599.
fn is_error_status(status: reqwest::StatusCode) -> bool {
    status.as_u16() >= 400
}

/// Passes a response through unless its status is a client or server error,
/// in which case the body is read into a [`CmsError::Http`].
pub(crate) async fn check_status(
    response: reqwest::Response,
    url: &str,
) -> CmsResult<reqwest::Response> {
    let status = response.status();

    if is_error_status(status) {
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, url, "Failed to read error response body");
                String::new()
            }
        };
        tracing::debug!(status = status.as_u16(), url, "Server rejected request");
        return Err(CmsError::Http {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        });
    }

    Ok(response)
}

/// Reads a response body, turning error statuses into [`CmsError::Http`].
pub(crate) async fn read_checked(response: reqwest::Response, url: &str) -> CmsResult<String> {
    check_status(response, url)
        .await?
        .text()
        .await
        .map_err(|e| CmsError::transport(url, e))
}
