//! Error types for CMS, documentation and staging operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for CMS operations.
pub type CmsResult<T> = Result<T, CmsError>;

/// Errors that can occur while talking to the CMS or staging a template.
#[derive(Debug, Error)]
pub enum CmsError {
    /// The server answered with a client or server error status.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        /// Status code.
        status: u16,
        /// Request URL (without query string).
        url: String,
        /// Response body as text.
        body: String,
    },

    /// The request could not be sent or the response not received.
    #[error("Request to {url} failed")]
    Transport {
        /// Request URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client")]
    Client {
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not valid JSON.
    #[error("Invalid JSON in response from {url}")]
    Decode {
        /// Request URL.
        url: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Unsupported template flavor.
    #[error("Invalid language '{flavor}'. Supported languages are 'python' or 'bun'.")]
    InvalidFlavor {
        /// The rejected flavor string.
        flavor: String,
    },

    /// Local filesystem operation failed.
    #[error("I/O error at {path}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The downloaded archive could not be read.
    #[error("Invalid zip archive")]
    Archive {
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },
}

impl CmsError {
    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a transport error.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Returns the HTTP status if the server rejected the request.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Renders the error with its full source chain on one line.
    #[must_use]
    pub fn to_chain_string(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

impl From<zip::result::ZipError> for CmsError {
    fn from(source: zip::result::ZipError) -> Self {
        Self::Archive { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_carries_status_and_body() {
        let err = CmsError::Http {
            status: 404,
            url: "https://api.kantan-cms.com/v1/api/collections/x".to_string(),
            body: r#"{"detail":"not found"}"#.to_string(),
        };
        assert_eq!(err.status(), Some(404));
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn invalid_flavor_message() {
        let err = CmsError::InvalidFlavor {
            flavor: "ruby".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid language 'ruby'. Supported languages are 'python' or 'bun'."
        );
        assert_eq!(err.status(), None);
    }

    #[test]
    fn chain_includes_source() {
        let err = CmsError::io(
            "/tmp/x",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let chain = err.to_chain_string();
        assert!(chain.starts_with("I/O error at /tmp/x"));
        assert!(chain.ends_with("denied"));
    }
}
