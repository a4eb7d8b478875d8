//! Review pipeline
//!
//! A run resolves the repository, then goes through three stages in order:
//! 1. [`Collector`] lists the pull request's files and fetches their content
//! 2. [`Generator`] asks the completion API for a review of each file
//! 3. [`Publisher`] removes earlier bot reviews and posts the new ones
//!
//! Per-item failures are recorded in the [`RunReport`] and skipped. Failing to
//! resolve the repository or to list files or reviews aborts the run.

mod collector;
mod generator;
mod publisher;
mod report;

#[cfg(test)]
pub(crate) mod fakes;

pub use collector::Collector;
pub use generator::{Generator, ReviewProgress};
pub use publisher::Publisher;
pub use report::{ItemFailure, RunReport, Stage};

use tracing::info;

use crate::completion::CompletionClient;
use crate::config::Config;
use crate::host::ReviewHost;
use crate::prompt::PromptBuilder;
use crate::retry::RetryPolicy;
use crate::review::ReviewEvent;
use crate::target::TargetContext;
use crate::Result;

/// Knobs for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Files fetched / reviewed at the same time
    pub concurrency: usize,
    /// Retry policy for reads and completions
    pub retry: RetryPolicy,
    /// Prompt rendering
    pub prompt: PromptBuilder,
    /// Event attached to new reviews
    pub review_event: ReviewEvent,
    /// Skip cleanup and publishing
    pub dry_run: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl PipelineOptions {
    /// Derive options from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.pipeline.concurrency,
            retry: RetryPolicy::from_config(&config.pipeline),
            prompt: PromptBuilder::from_config(&config.completion),
            review_event: config.github.review_event,
            dry_run: false,
        }
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// One review run over a pull request
pub struct Pipeline<'a> {
    host: &'a dyn ReviewHost,
    completion: &'a dyn CompletionClient,
    options: PipelineOptions,
    progress: Option<&'a ReviewProgress<'a>>,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline over a host and a completion client
    pub fn new(
        host: &'a dyn ReviewHost,
        completion: &'a dyn CompletionClient,
        options: PipelineOptions,
    ) -> Self {
        Self {
            host,
            completion,
            options,
            progress: None,
        }
    }

    /// Report each generated review as soon as it arrives
    pub fn with_progress(mut self, progress: &'a ReviewProgress<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run the whole review
    pub async fn run(&self, target: TargetContext) -> Result<RunReport> {
        let options = &self.options;
        info!(target = %target, dry_run = options.dry_run, "Starting review run");

        let repo = options
            .retry
            .run("resolve repository", || self.host.resolve_repository(&target.repo))
            .await
            .map_err(|e| e.context(format!("Failed to resolve repository {}", target.repo)))?;
        let target = target.with_repo(repo);

        let mut report = RunReport::new(options.dry_run);

        let files = Collector::new(self.host, options.concurrency, options.retry)
            .collect(&target, &mut report)
            .await?;

        let mut generator = Generator::new(
            self.completion,
            options.prompt.clone(),
            options.concurrency,
            options.retry,
        );
        if let Some(progress) = self.progress {
            generator = generator.with_progress(progress);
        }
        let result = generator.generate(&files, &mut report).await;

        if options.dry_run {
            info!(reviews = result.len(), "Dry run, not touching the pull request");
        } else {
            let publisher = Publisher::new(self.host, options.retry, options.review_event);
            publisher.cleanup(&target, &mut report).await?;
            publisher.publish(&target, &result, &mut report).await;
        }

        report.result = result;
        info!(
            target = %target,
            posted = report.reviews_posted,
            failures = report.failures.len(),
            "Review run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{ReviewState, BOT_MARKER};
    use crate::target::RepoSlug;
    use super::fakes::{target, FakeCompletion, FakeHost, HostCall};

    fn options() -> PipelineOptions {
        PipelineOptions {
            retry: RetryPolicy::none(),
            ..PipelineOptions::default()
        }
    }

    fn stale_body() -> String {
        format!("Automatic Commented Review by {BOT_MARKER}.\n\n\nReview result for file \"old.go\":\n\nold")
    }

    #[tokio::test]
    async fn test_two_file_scenario() {
        let host = FakeHost::new()
            .with_file("a.go", "package a")
            .with_file("b.go", "package b")
            .with_review(7, &stale_body(), ReviewState::Pending)
            .with_review(8, "Looks good to me", ReviewState::Submitted);
        let completion = FakeCompletion::new()
            .reply("package a", "no issues")
            .reply("package b", "missing error check");

        let report = Pipeline::new(&host, &completion, options())
            .run(target())
            .await
            .unwrap();

        let bodies = host.created_bodies();
        assert_eq!(bodies.len(), 2);
        assert!(bodies.iter().any(|b| {
            b.contains("Review result for file \"a.go\":") && b.contains("no issues")
        }));
        assert!(bodies.iter().any(|b| {
            b.contains("Review result for file \"b.go\":") && b.contains("missing error check")
        }));

        assert_eq!(report.result.len(), 2);
        assert_eq!(report.reviews_posted, 2);
        assert_eq!(report.stale_reviews_removed, 1);
        assert!(!report.has_failures());
        assert!(!host.calls().contains(&HostCall::Remove(8)));
    }

    #[tokio::test]
    async fn test_stale_reviews_removed_before_posting() {
        let host = FakeHost::new()
            .with_file("a.go", "package a")
            .with_review(1, &stale_body(), ReviewState::Submitted)
            .with_review(2, &stale_body(), ReviewState::Pending);
        let completion = FakeCompletion::new();

        Pipeline::new(&host, &completion, options())
            .run(target())
            .await
            .unwrap();

        let calls = host.calls();
        let first_create = calls
            .iter()
            .position(|c| matches!(c, HostCall::Create(_)))
            .unwrap();
        let last_remove = calls
            .iter()
            .rposition(|c| matches!(c, HostCall::Remove(_)))
            .unwrap();
        assert!(last_remove < first_create);
    }

    #[tokio::test]
    async fn test_fetch_failure_omits_only_that_file() {
        let host = FakeHost::new()
            .with_file("a.go", "package a")
            .with_broken_file("f.go")
            .with_file("b.go", "package b");
        let completion = FakeCompletion::new();

        let report = Pipeline::new(&host, &completion, options())
            .run(target())
            .await
            .unwrap();

        assert_eq!(report.result.len(), 2);
        assert!(report.result.get("f.go").is_none());
        assert_eq!(report.reviews_posted, 2);
        assert_eq!(completion.prompts().len(), 2);
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_listing_failure_makes_no_requests() {
        let host = FakeHost {
            fail_list_files: true,
            ..FakeHost::new().with_file("a.go", "package a")
        };
        let completion = FakeCompletion::new();

        let result = Pipeline::new(&host, &completion, options())
            .run(target())
            .await;

        assert!(result.is_err());
        assert!(completion.prompts().is_empty());
        assert!(host.created_bodies().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_still_posts() {
        let host = FakeHost {
            fail_remove: [1].into_iter().collect(),
            ..FakeHost::new()
                .with_file("a.go", "package a")
                .with_review(1, &stale_body(), ReviewState::Submitted)
        };
        let completion = FakeCompletion::new();

        let report = Pipeline::new(&host, &completion, options())
            .run(target())
            .await
            .unwrap();

        assert_eq!(report.reviews_posted, 1);
        assert_eq!(report.failures_in(Stage::Cleanup).count(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_leaves_pull_request_alone() {
        let host = FakeHost::new()
            .with_file("a.go", "package a")
            .with_review(1, &stale_body(), ReviewState::Pending);
        let completion = FakeCompletion::new();

        let report = Pipeline::new(&host, &completion, options().with_dry_run(true))
            .run(target())
            .await
            .unwrap();

        assert_eq!(report.result.len(), 1);
        assert!(report.dry_run);
        assert!(!host.calls().iter().any(|c| matches!(
            c,
            HostCall::ListReviews | HostCall::Remove(_) | HostCall::Create(_)
        )));
    }

    #[tokio::test]
    async fn test_canonical_repository_is_used() {
        let host = FakeHost {
            canonical: Some(RepoSlug::new("acme-corp", "widget")),
            ..FakeHost::new().with_file("a.go", "package a")
        };
        let completion = FakeCompletion::new();

        Pipeline::new(&host, &completion, options())
            .run(target())
            .await
            .unwrap();

        assert_eq!(host.calls()[0], HostCall::Resolve);
        assert_eq!(
            host.listed_for.lock().unwrap().as_deref(),
            Some("acme-corp/widget#42")
        );
    }

    #[tokio::test]
    async fn test_progress_receives_reviews() {
        let host = FakeHost::new().with_file("a.go", "package a");
        let completion = FakeCompletion::new().reply("package a", "no issues");
        let seen = std::sync::Mutex::new(Vec::new());
        let progress = |name: &str, text: &str| {
            seen.lock().unwrap().push(format!("{name}: {text}"));
        };

        Pipeline::new(&host, &completion, options())
            .with_progress(&progress)
            .run(target())
            .await
            .unwrap();

        assert_eq!(seen.into_inner().unwrap(), ["a.go: no issues"]);
    }
}
