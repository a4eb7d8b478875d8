//! Source-control host abstraction
//!
//! The pipeline stages only see this trait. `prreview-github` implements it
//! on top of octocrab; tests use an in-memory fake.

use async_trait::async_trait;

use crate::review::{ChangedFile, ExistingReview, NewReview};
use crate::target::{RepoSlug, TargetContext};
use crate::Result;

/// Operations a review run needs from the hosting service
#[async_trait]
pub trait ReviewHost: Send + Sync {
    /// Look up a repository and return its canonical owner/name
    async fn resolve_repository(&self, repo: &RepoSlug) -> Result<RepoSlug>;

    /// List every file changed by the pull request
    async fn list_changed_files(&self, target: &TargetContext) -> Result<Vec<ChangedFile>>;

    /// Fetch and decode the current text content of a changed file
    async fn fetch_file_content(&self, file: &ChangedFile) -> Result<String>;

    /// List every review on the pull request
    async fn list_reviews(&self, target: &TargetContext) -> Result<Vec<ExistingReview>>;

    /// Remove a review previously posted by this tool
    async fn remove_review(&self, target: &TargetContext, review: &ExistingReview) -> Result<()>;

    /// Create a new review on the pull request
    async fn create_review(&self, target: &TargetContext, review: &NewReview) -> Result<()>;
}
