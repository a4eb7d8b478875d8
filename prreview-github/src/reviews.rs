//! Pull request review management

use octocrab::models::pulls::{Review, ReviewState as GitHubReviewState};
use prreview_core::review::superseded_body;
use prreview_core::{ExistingReview, NewReview, ReviewEvent, ReviewState, TargetContext};
use serde::Serialize;
use tracing::{debug, info};

use crate::{GitHubClient, Result};

/// Convert an octocrab review into the pipeline's existing review
fn existing_review(review: Review) -> ExistingReview {
    let state = match review.state {
        Some(GitHubReviewState::Pending) => ReviewState::Pending,
        _ => ReviewState::Submitted,
    };
    ExistingReview {
        id: review.id.0,
        body: review.body.unwrap_or_default(),
        state,
    }
}

#[derive(Debug, Serialize)]
struct CreateReviewRequest<'a> {
    commit_id: &'a str,
    body: &'a str,
    /// Omitted to leave the review pending
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<&'static str>,
}

impl<'a> From<&'a NewReview> for CreateReviewRequest<'a> {
    fn from(review: &'a NewReview) -> Self {
        Self {
            commit_id: &review.commit_id,
            body: &review.body,
            event: match review.event {
                ReviewEvent::Comment => Some("COMMENT"),
                ReviewEvent::Pending => None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateReviewRequest {
    body: String,
}

fn reviews_route(target: &TargetContext) -> String {
    format!(
        "/repos/{}/{}/pulls/{}/reviews",
        target.owner(),
        target.repo_name(),
        target.pr_number
    )
}

impl GitHubClient {
    /// Get all reviews for a pull request
    pub async fn list_pr_reviews(&self, target: &TargetContext) -> Result<Vec<ExistingReview>> {
        let first = self
            .timed(
                self.client()
                    .pulls(target.owner(), target.repo_name())
                    .list_reviews(target.pr_number)
                    .per_page(100u8)
                    .send(),
            )
            .await?;
        let reviews = self.collect_pages(first).await?;
        debug!(target = %target, count = reviews.len(), "Fetched pull request reviews");

        Ok(reviews.into_iter().map(existing_review).collect())
    }

    /// Delete a review that has not been submitted yet
    pub async fn delete_pending_review(&self, target: &TargetContext, review_id: u64) -> Result<()> {
        self.timed(
            self.client()
                .pulls(target.owner(), target.repo_name())
                .pr_review_actions(target.pr_number, review_id)
                .delete_pending(),
        )
        .await?;

        info!(target = %target, review_id, "Deleted pending review");
        Ok(())
    }

    /// Replace the body of a submitted review so it no longer carries the bot marker
    pub async fn supersede_review(&self, target: &TargetContext, review_id: u64) -> Result<()> {
        // octocrab's review `update` PATCHes a bare string; the endpoint wants PUT {"body"}
        let route = format!("{}/{}", reviews_route(target), review_id);
        let request = UpdateReviewRequest {
            body: superseded_body(),
        };
        let _updated: Review = self
            .timed(self.client().put(&route, Some(&request)))
            .await?;

        info!(target = %target, review_id, "Superseded submitted review");
        Ok(())
    }

    /// Create a review on the pull request
    pub async fn create_review(&self, target: &TargetContext, review: &NewReview) -> Result<()> {
        // No create-review handler in octocrab
        let request = CreateReviewRequest::from(review);
        let _created: Review = self
            .timed(self.client().post(reviews_route(target), Some(&request)))
            .await?;

        debug!(target = %target, event = ?review.event, "Created review");
        Ok(())
    }
}
