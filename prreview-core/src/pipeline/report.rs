//! Outcome of a review run

use std::fmt;

use tracing::warn;

use crate::review::ReviewResult;
use crate::Error;

/// Pipeline stage an item failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching or decoding a file's content
    Fetch,
    /// Generating a review with the completion API
    Completion,
    /// Removing a stale bot review
    Cleanup,
    /// Creating a new review
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Completion => "completion",
            Stage::Cleanup => "cleanup",
            Stage::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// One skipped item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Stage that failed
    pub stage: Stage,
    /// Filename, or review id for cleanup failures
    pub item: String,
    /// Error message
    pub message: String,
}

/// Counters and failures collected over one run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Whether cleanup and publishing were skipped
    pub dry_run: bool,
    /// Files the pull request changes
    pub files_listed: usize,
    /// Files skipped because they have no content (removed)
    pub files_skipped: usize,
    /// Files whose content was fetched
    pub files_collected: usize,
    /// Completions that returned a review
    pub reviews_generated: usize,
    /// Bot reviews removed from earlier runs
    pub stale_reviews_removed: usize,
    /// New reviews created
    pub reviews_posted: usize,
    /// Generated review texts
    pub result: ReviewResult,
    /// Items skipped because of an error
    pub failures: Vec<ItemFailure>,
}

impl RunReport {
    /// Empty report
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Log a per-item failure and remember it
    pub fn record_failure(&mut self, stage: Stage, item: impl Into<String>, error: &Error) {
        let item = item.into();
        warn!(stage = %stage, item = %item, error = %error, "Skipping item");
        self.failures.push(ItemFailure {
            stage,
            item,
            message: error.to_string(),
        });
    }

    /// Whether any item was skipped because of an error
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Failures recorded for one stage
    pub fn failures_in(&self, stage: Stage) -> impl Iterator<Item = &ItemFailure> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Files: {} listed, {} skipped, {} fetched",
            self.files_listed, self.files_skipped, self.files_collected
        )?;
        writeln!(f, "Reviews generated: {}", self.reviews_generated)?;
        if self.dry_run {
            writeln!(f, "Dry run: nothing was removed or posted")?;
        } else {
            writeln!(f, "Stale reviews removed: {}", self.stale_reviews_removed)?;
            writeln!(f, "Reviews posted: {}", self.reviews_posted)?;
        }
        if !self.failures.is_empty() {
            writeln!(f, "Failures: {}", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  [{}] {}: {}", failure.stage, failure.item, failure.message)?;
            }
        }
        Ok(())
    }
}
