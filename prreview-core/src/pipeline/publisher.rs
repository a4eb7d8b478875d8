//! Review publishing: remove stale bot reviews, then post fresh ones

use tracing::{debug, info};

use crate::host::ReviewHost;
use crate::retry::RetryPolicy;
use crate::review::{format_review_body, NewReview, ReviewEvent, ReviewResult};
use crate::target::TargetContext;
use crate::Result;

use super::report::{RunReport, Stage};

/// Publishes generated reviews to the pull request
pub struct Publisher<'a> {
    host: &'a dyn ReviewHost,
    retry: RetryPolicy,
    event: ReviewEvent,
}

impl<'a> Publisher<'a> {
    /// Create a publisher posting reviews with `event`
    pub fn new(host: &'a dyn ReviewHost, retry: RetryPolicy, event: ReviewEvent) -> Self {
        Self { host, retry, event }
    }

    /// Remove every review that carries the bot marker
    ///
    /// Failing to list reviews aborts the run; failing to remove one review is
    /// recorded and the sweep goes on. Reviews without the marker are never
    /// touched.
    pub async fn cleanup(&self, target: &TargetContext, report: &mut RunReport) -> Result<()> {
        let reviews = self
            .retry
            .run("list reviews", || self.host.list_reviews(target))
            .await
            .map_err(|e| e.context(format!("Failed to list reviews of {}", target)))?;

        let stale: Vec<_> = reviews.iter().filter(|r| r.is_bot_review()).collect();
        info!(
            target = %target,
            reviews = reviews.len(),
            stale = stale.len(),
            "Removing previous bot reviews"
        );

        for review in stale {
            let removed = self
                .retry
                .run("remove review", || self.host.remove_review(target, review))
                .await;
            match removed {
                Ok(()) => {
                    debug!(review_id = review.id, state = ?review.state, "Removed stale review");
                    report.stale_reviews_removed += 1;
                }
                Err(e) => report.record_failure(Stage::Cleanup, format!("review {}", review.id), &e),
            }
        }

        Ok(())
    }

    /// Post one review per file in `result`
    ///
    /// Creation is not retried: a request that timed out may still have been
    /// applied, and posting twice is worse than posting once on the next run.
    pub async fn publish(&self, target: &TargetContext, result: &ReviewResult, report: &mut RunReport) {
        for (filename, texts) in result.iter() {
            let review = NewReview {
                commit_id: target.commit_sha.clone(),
                body: format_review_body(filename, texts),
                event: self.event,
            };

            match self.host.create_review(target, &review).await {
                Ok(()) => {
                    info!(file = %filename, "Posted review");
                    report.reviews_posted += 1;
                }
                Err(e) => report.record_failure(Stage::Publish, filename, &e),
            }
        }
    }
}
