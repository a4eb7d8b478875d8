//! [`ReviewHost`] implementation for GitHub

use async_trait::async_trait;
use prreview_core::{
    ChangedFile, ExistingReview, NewReview, RepoSlug, ReviewHost, ReviewState, TargetContext,
};

use crate::GitHubClient;

#[async_trait]
impl ReviewHost for GitHubClient {
    async fn resolve_repository(&self, repo: &RepoSlug) -> prreview_core::Result<RepoSlug> {
        Ok(self.get_repository(repo).await?)
    }

    async fn list_changed_files(
        &self,
        target: &TargetContext,
    ) -> prreview_core::Result<Vec<ChangedFile>> {
        Ok(self.list_pr_files(target).await?)
    }

    async fn fetch_file_content(&self, file: &ChangedFile) -> prreview_core::Result<String> {
        Ok(self.fetch_content(file).await?)
    }

    async fn list_reviews(
        &self,
        target: &TargetContext,
    ) -> prreview_core::Result<Vec<ExistingReview>> {
        Ok(self.list_pr_reviews(target).await?)
    }

    async fn remove_review(
        &self,
        target: &TargetContext,
        review: &ExistingReview,
    ) -> prreview_core::Result<()> {
        // Submitted reviews cannot be deleted through the API
        match review.state {
            ReviewState::Pending => self.delete_pending_review(target, review.id).await?,
            ReviewState::Submitted => self.supersede_review(target, review.id).await?,
        }
        Ok(())
    }

    async fn create_review(
        &self,
        target: &TargetContext,
        review: &NewReview,
    ) -> prreview_core::Result<()> {
        Ok(GitHubClient::create_review(self, target, review).await?)
    }
}
