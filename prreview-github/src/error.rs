//! Error types for GitHub operations

use std::time::Duration;

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API error
    #[error("GitHub API error: {}", api_message(.0))]
    Api(#[from] octocrab::Error),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// Repository not found or not accessible
    #[error("Repository {0} not found or not accessible")]
    RepoNotFound(String),

    /// File content could not be decoded
    #[error("Failed to decode content of {path}: {reason}")]
    Decode {
        /// File path
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Request did not complete in time
    #[error("GitHub request timed out after {0:?}")]
    Timeout(Duration),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether retrying the same request may succeed
    ///
    /// GitHub answers 429 or a 403 mentioning the rate limit when throttling.
    /// Server errors and transport failures are retried too.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Api(octocrab::Error::GitHub { source, .. }) => {
                let status = source.status_code;
                status.as_u16() == 429
                    || status.is_server_error()
                    || (status.as_u16() == 403
                        && source.message.to_ascii_lowercase().contains("rate limit"))
            }
            Error::Api(
                octocrab::Error::Hyper { .. }
                | octocrab::Error::Http { .. }
                | octocrab::Error::Service { .. },
            ) => true,
            Error::Timeout(_) => true,
            _ => false,
        }
    }
}

/// GitHub's own message and status, or the transport error
fn api_message(err: &octocrab::Error) -> String {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            format!("{} (HTTP {})", source.message, source.status_code.as_u16())
        }
        other => other.to_string(),
    }
}

impl From<Error> for prreview_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Timeout(after) => prreview_core::Error::Timeout(after),
            other => prreview_core::Error::Host {
                transient: other.is_transient(),
                message: other.to_string(),
            },
        }
    }
}
