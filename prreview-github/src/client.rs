//! GitHub API client using octocrab

use std::future::Future;
use std::time::Duration;

use octocrab::service::middleware::retry::RetryConfig;
use octocrab::{Octocrab, Page};
use prreview_core::{GitHubConfig, RepoSlug};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::{Error, Result};

/// GitHub API client for pull request review operations
pub struct GitHubClient {
    client: Octocrab,
    timeout: Duration,
}

impl GitHubClient {
    /// Create an authenticated client
    ///
    /// `config.api_url` points the client at GitHub Enterprise; public GitHub
    /// is used otherwise. octocrab's built-in retries are disabled: retries
    /// are decided by the pipeline, and review creation must never be resent.
    pub fn new(token: impl Into<String>, config: &GitHubConfig) -> Result<Self> {
        let mut builder = Octocrab::builder()
            .personal_token(token.into())
            .add_retry_config(RetryConfig::None);

        if let Some(api_url) = &config.api_url {
            url::Url::parse(api_url)
                .map_err(|e| Error::Other(format!("Invalid GitHub API URL {}: {}", api_url, e)))?;
            builder = builder
                .base_uri(api_url.as_str())
                .map_err(|e| Error::Auth(format!("Invalid GitHub API URL {}: {}", api_url, e)))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        info!(api_url = ?config.api_url, "Created GitHub client");

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    /// Get the underlying octocrab client
    pub fn client(&self) -> &Octocrab {
        &self.client
    }

    /// Await an octocrab call, bounded by the configured timeout
    pub(crate) async fn timed<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, octocrab::Error>>,
    {
        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
            .map_err(Error::Api)
    }

    /// Collect a first page and every page its `Link` header points to
    pub(crate) async fn collect_pages<T>(&self, first: Page<T>) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let items = self.timed(self.client.all_pages(first)).await?;
        debug!(items = items.len(), "Fetched all pages");
        Ok(items)
    }

    /// Look up a repository and return its canonical owner and name
    pub async fn get_repository(&self, repo: &RepoSlug) -> Result<RepoSlug> {
        debug!(repo = %repo, "Fetching repository");

        let entry = self
            .timed(self.client.repos(&repo.owner, &repo.name).get())
            .await
            .map_err(|e| match e {
                Error::Api(octocrab::Error::GitHub { source, .. })
                    if source.status_code.as_u16() == 404 =>
                {
                    Error::RepoNotFound(repo.to_string())
                }
                Error::Api(octocrab::Error::GitHub { source, .. })
                    if source.status_code.as_u16() == 401 =>
                {
                    Error::Auth(format!("Invalid GitHub token: {}", source.message))
                }
                other => other,
            })?;

        let owner = entry
            .owner
            .map(|o| o.login)
            .unwrap_or_else(|| repo.owner.clone());
        Ok(RepoSlug::new(owner, entry.name))
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
