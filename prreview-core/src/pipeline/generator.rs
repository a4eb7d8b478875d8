//! Review generation: one completion request per collected file

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::completion::CompletionClient;
use crate::prompt::PromptBuilder;
use crate::retry::RetryPolicy;
use crate::review::{ChangedFile, ReviewResult};

use super::report::{RunReport, Stage};

/// Callback invoked with `(filename, text)` as each review arrives
pub type ReviewProgress<'a> = dyn Fn(&str, &str) + Send + Sync + 'a;

/// Generates review texts for collected files
pub struct Generator<'a> {
    client: &'a dyn CompletionClient,
    prompt: PromptBuilder,
    concurrency: usize,
    retry: RetryPolicy,
    progress: Option<&'a ReviewProgress<'a>>,
}

impl<'a> Generator<'a> {
    /// Create a generator running up to `concurrency` requests at once
    pub fn new(
        client: &'a dyn CompletionClient,
        prompt: PromptBuilder,
        concurrency: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            prompt,
            concurrency: concurrency.max(1),
            retry,
            progress: None,
        }
    }

    /// Report each generated review as soon as it arrives
    pub fn with_progress(mut self, progress: &'a ReviewProgress<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Ask for a review of every file that has content
    ///
    /// Failed completions are recorded in `report` and the file is left out of
    /// the result.
    pub async fn generate(&self, files: &[ChangedFile], report: &mut RunReport) -> ReviewResult {
        let pending = files.iter().filter_map(|file| match file.content.as_deref() {
            Some(content) => Some((file, content)),
            None => {
                debug!(file = %file.filename, "No content collected, not reviewing");
                None
            }
        });

        let requests = stream::iter(pending)
            .map(|(file, content)| async move {
                let prompt = self.prompt.render(&file.filename, content);
                let reply = self
                    .retry
                    .run("completion", || self.client.complete(&prompt.text))
                    .await;
                (file, reply)
            })
            .buffer_unordered(self.concurrency);
        let mut requests = std::pin::pin!(requests);

        let mut result = ReviewResult::new();
        while let Some((file, reply)) = requests.next().await {
            match reply {
                Ok(text) => {
                    info!(file = %file.filename, chars = text.len(), "Review generated");
                    if let Some(progress) = self.progress {
                        progress(&file.filename, &text);
                    }
                    result.push(file.filename.clone(), text);
                    report.reviews_generated += 1;
                }
                Err(e) => report.record_failure(Stage::Completion, &file.filename, &e),
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fakes::FakeCompletion;
    use crate::review::FileStatus;
    use std::sync::Mutex;
    use std::time::Duration;

    fn file(name: &str, content: &str) -> ChangedFile {
        ChangedFile::new(name, FileStatus::Modified, "").with_content(content)
    }

    #[tokio::test]
    async fn test_one_entry_per_file() {
        let client = FakeCompletion::new()
            .reply("package a", "no issues")
            .reply("package b", "missing error check");
        let files = [file("a.go", "package a"), file("b.go", "package b")];
        let mut report = RunReport::default();

        let result = Generator::new(&client, PromptBuilder::default(), 2, RetryPolicy::none())
            .generate(&files, &mut report)
            .await;

        assert_eq!(result.len(), 2);
        assert_eq!(result.get("a.go"), Some(&["no issues".to_string()][..]));
        assert_eq!(
            result.get("b.go"),
            Some(&["missing error check".to_string()][..])
        );
        assert_eq!(report.reviews_generated, 2);
    }

    #[tokio::test]
    async fn test_prompt_carries_content_verbatim() {
        let client = FakeCompletion::new();
        let content = "fn main() {\n    println!(\"{}\", 1);\n}\n";
        let mut report = RunReport::default();

        Generator::new(&client, PromptBuilder::default(), 1, RetryPolicy::none())
            .generate(&[file("main.rs", content)], &mut report)
            .await;

        assert_eq!(
            client.prompts(),
            vec![PromptBuilder::default().render("main.rs", content).text]
        );
        assert!(client.prompts()[0].ends_with(content));
    }

    #[tokio::test]
    async fn test_failed_completion_is_skipped() {
        let client = FakeCompletion::new().reject("huge");
        let files = [file("huge.sql", "huge dump"), file("ok.go", "package ok")];
        let mut report = RunReport::default();

        let result = Generator::new(&client, PromptBuilder::default(), 2, RetryPolicy::none())
            .generate(&files, &mut report)
            .await;

        assert_eq!(result.len(), 1);
        assert!(result.get("huge.sql").is_none());
        assert_eq!(report.failures_in(Stage::Completion).count(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let client = FakeCompletion::new().flaky(1);
        let mut report = RunReport::default();

        let result = Generator::new(
            &client,
            PromptBuilder::default(),
            1,
            RetryPolicy::new(2, Duration::from_millis(1)),
        )
        .generate(&[file("a.go", "package a")], &mut report)
        .await;

        assert_eq!(result.len(), 1);
        assert_eq!(client.prompts().len(), 2);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_progress_sees_every_review() {
        let client = FakeCompletion::new();
        let seen = Mutex::new(Vec::new());
        let progress = |name: &str, _text: &str| seen.lock().unwrap().push(name.to_string());
        let files = [file("a.go", "package a"), file("b.go", "package b")];
        let mut report = RunReport::default();

        Generator::new(&client, PromptBuilder::default(), 2, RetryPolicy::none())
            .with_progress(&progress)
            .generate(&files, &mut report)
            .await;

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, ["a.go", "b.go"]);
    }

    #[tokio::test]
    async fn test_files_without_content_are_ignored() {
        let client = FakeCompletion::new();
        let files = [ChangedFile::new("x.go", FileStatus::Modified, "")];
        let mut report = RunReport::default();

        let result = Generator::new(&client, PromptBuilder::default(), 1, RetryPolicy::none())
            .generate(&files, &mut report)
            .await;

        assert!(result.is_empty());
        assert!(client.prompts().is_empty());
    }
}
