//! Error types for pr-review

use std::time::Duration;

use thiserror::Error;

/// Result type alias for pr-review operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pr-review operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP failure talking to the completion API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Completion API answered with a non-success status
    #[error("Completion API error ({status}): {body}")]
    CompletionApi {
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the API
        body: String,
    },

    /// Completion API answered but the payload was unusable
    #[error("Completion error: {0}")]
    Completion(String),

    /// Error reported by the source-control host
    #[error("Host API error: {message}")]
    Host {
        /// Human readable description
        message: String,
        /// Whether retrying the same call may succeed
        transient: bool,
    },

    /// A call did not finish in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a non-transient host error
    pub fn host(message: impl Into<String>) -> Self {
        Error::Host {
            message: message.into(),
            transient: false,
        }
    }

    /// Prefix the error with what was being attempted
    ///
    /// Used for fatal errors, where the retry classification no longer matters.
    pub fn context(self, what: impl std::fmt::Display) -> Self {
        Error::Other(format!("{}: {}", what, self))
    }

    /// Whether the failed operation is worth retrying
    ///
    /// Timeouts, connection failures, HTTP 429 and 5xx responses count as
    /// transient. Everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::CompletionApi { status, .. } => *status == 429 || *status >= 500,
            Error::Host { transient, .. } => *transient,
            Error::Timeout(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_status_classification() {
        let rate_limited = Error::CompletionApi {
            status: 429,
            body: "slow down".to_string(),
        };
        let unavailable = Error::CompletionApi {
            status: 503,
            body: String::new(),
        };
        let bad_request = Error::CompletionApi {
            status: 400,
            body: "context length exceeded".to_string(),
        };

        assert!(rate_limited.is_transient());
        assert!(unavailable.is_transient());
        assert!(!bad_request.is_transient());
    }

    #[test]
    fn test_host_and_timeout_classification() {
        assert!(!Error::host("Not Found").is_transient());
        assert!(Error::Host {
            message: "secondary rate limit".to_string(),
            transient: true
        }
        .is_transient());
        assert!(Error::Timeout(Duration::from_secs(5)).is_transient());
        assert!(!Error::Config("bad".to_string()).is_transient());
    }

    #[test]
    fn test_context_prefixes_message() {
        let err = Error::host("Not Found").context("Failed to list files for acme/widget#42");
        assert_eq!(
            err.to_string(),
            "Failed to list files for acme/widget#42: Host API error: Not Found"
        );
    }

    #[test]
    fn test_display_includes_status() {
        let err = Error::CompletionApi {
            status: 401,
            body: "invalid api key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Completion API error (401): invalid api key"
        );
    }
}
