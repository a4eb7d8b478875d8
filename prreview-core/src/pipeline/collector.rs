//! File collection: list the pull request's files and fetch their content

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::host::ReviewHost;
use crate::retry::RetryPolicy;
use crate::review::ChangedFile;
use crate::target::TargetContext;
use crate::Result;

use super::report::{RunReport, Stage};

/// Collects changed files with their content
pub struct Collector<'a> {
    host: &'a dyn ReviewHost,
    concurrency: usize,
    retry: RetryPolicy,
}

impl<'a> Collector<'a> {
    /// Create a collector fetching up to `concurrency` files at once
    pub fn new(host: &'a dyn ReviewHost, concurrency: usize, retry: RetryPolicy) -> Self {
        Self {
            host,
            concurrency: concurrency.max(1),
            retry,
        }
    }

    /// List the pull request's files and fetch the content of each one
    ///
    /// Listing failures abort the run. A file that cannot be fetched or
    /// decoded is recorded in `report` and left out. Files come back in the
    /// order the host listed them.
    pub async fn collect(
        &self,
        target: &TargetContext,
        report: &mut RunReport,
    ) -> Result<Vec<ChangedFile>> {
        let listed = self
            .retry
            .run("list pull request files", || {
                self.host.list_changed_files(target)
            })
            .await
            .map_err(|e| e.context(format!("Failed to list files of {}", target)))?;

        report.files_listed = listed.len();
        info!(target = %target, files = listed.len(), "Listed changed files");

        let (fetchable, removed): (Vec<_>, Vec<_>) =
            listed.into_iter().partition(|f| f.status.has_content());
        for file in &removed {
            debug!(file = %file.filename, "Skipping removed file");
        }
        report.files_skipped = removed.len();

        let mut outcomes: Vec<_> = stream::iter(fetchable.into_iter().enumerate())
            .map(|(idx, file)| async move {
                let content = self
                    .retry
                    .run("fetch file content", || self.host.fetch_file_content(&file))
                    .await;
                (idx, file, content)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        outcomes.sort_by_key(|(idx, _, _)| *idx);

        let mut collected = Vec::with_capacity(outcomes.len());
        for (_, file, content) in outcomes {
            match content {
                Ok(content) => {
                    debug!(file = %file.filename, bytes = content.len(), "Fetched file content");
                    collected.push(file.with_content(content));
                }
                Err(e) => report.record_failure(Stage::Fetch, &file.filename, &e),
            }
        }

        report.files_collected = collected.len();
        Ok(collected)
    }
}
