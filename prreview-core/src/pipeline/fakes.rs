//! In-memory host and completion fakes for stage tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::completion::CompletionClient;
use crate::host::ReviewHost;
use crate::review::{ChangedFile, ExistingReview, FileStatus, NewReview, ReviewState};
use crate::target::{RepoSlug, TargetContext};
use crate::{Error, Result};

/// A call made against [`FakeHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HostCall {
    Resolve,
    ListFiles,
    Fetch(String),
    ListReviews,
    Remove(u64),
    Create(String),
}

#[derive(Default)]
pub(crate) struct FakeHost {
    pub files: Vec<ChangedFile>,
    pub contents: HashMap<String, String>,
    pub reviews: Vec<ExistingReview>,
    pub canonical: Option<RepoSlug>,
    pub fail_list_files: bool,
    pub fail_list_reviews: bool,
    pub fail_remove: HashSet<u64>,
    pub fail_create: HashSet<String>,
    pub calls: Mutex<Vec<HostCall>>,
    pub listed_for: Mutex<Option<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, filename: &str, content: &str) -> Self {
        self.files.push(ChangedFile::new(
            filename,
            FileStatus::Modified,
            format!("https://api.example.test/contents/{filename}"),
        ));
        self.contents
            .insert(filename.to_string(), content.to_string());
        self
    }

    /// A file whose content fetch fails
    pub fn with_broken_file(mut self, filename: &str) -> Self {
        self.files.push(ChangedFile::new(
            filename,
            FileStatus::Modified,
            format!("https://api.example.test/contents/{filename}"),
        ));
        self
    }

    pub fn with_removed_file(mut self, filename: &str) -> Self {
        self.files.push(ChangedFile::new(
            filename,
            FileStatus::Removed,
            format!("https://api.example.test/contents/{filename}"),
        ));
        self
    }

    pub fn with_review(mut self, id: u64, body: &str, state: ReviewState) -> Self {
        self.reviews.push(ExistingReview {
            id,
            body: body.to_string(),
            state,
        });
        self
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created_bodies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Create(body) => Some(body),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ReviewHost for FakeHost {
    async fn resolve_repository(&self, repo: &RepoSlug) -> Result<RepoSlug> {
        self.record(HostCall::Resolve);
        Ok(self.canonical.clone().unwrap_or_else(|| repo.clone()))
    }

    async fn list_changed_files(&self, target: &TargetContext) -> Result<Vec<ChangedFile>> {
        self.record(HostCall::ListFiles);
        *self.listed_for.lock().unwrap() = Some(target.to_string());
        if self.fail_list_files {
            return Err(Error::host("Bad credentials"));
        }
        Ok(self.files.clone())
    }

    async fn fetch_file_content(&self, file: &ChangedFile) -> Result<String> {
        self.record(HostCall::Fetch(file.filename.clone()));
        self.contents
            .get(&file.filename)
            .cloned()
            .ok_or_else(|| Error::host(format!("Not Found: {}", file.contents_url)))
    }

    async fn list_reviews(&self, _target: &TargetContext) -> Result<Vec<ExistingReview>> {
        self.record(HostCall::ListReviews);
        if self.fail_list_reviews {
            return Err(Error::host("Server Error"));
        }
        Ok(self.reviews.clone())
    }

    async fn remove_review(&self, _target: &TargetContext, review: &ExistingReview) -> Result<()> {
        self.record(HostCall::Remove(review.id));
        if self.fail_remove.contains(&review.id) {
            return Err(Error::host("Can not delete a submitted review"));
        }
        Ok(())
    }

    async fn create_review(&self, _target: &TargetContext, review: &NewReview) -> Result<()> {
        self.record(HostCall::Create(review.body.clone()));
        let rejected = self
            .fail_create
            .iter()
            .any(|name| review.body.contains(&format!("\"{name}\"")));
        if rejected {
            return Err(Error::host("Unprocessable Entity"));
        }
        Ok(())
    }
}

/// Completion fake answering by substring match on the prompt
#[derive(Default)]
pub(crate) struct FakeCompletion {
    pub replies: Vec<(String, String)>,
    pub rejects: HashSet<String>,
    pub transient_failures: AtomicU32,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, needle: &str, text: &str) -> Self {
        self.replies.push((needle.to_string(), text.to_string()));
        self
    }

    pub fn reject(mut self, needle: &str) -> Self {
        self.rejects.insert(needle.to_string());
        self
    }

    /// Fail the next `n` calls with a timeout
    pub fn flaky(self, n: u32) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(Error::Timeout(Duration::from_secs(60)));
        }

        if self.rejects.iter().any(|needle| prompt.contains(needle)) {
            return Err(Error::CompletionApi {
                status: 400,
                body: "maximum context length exceeded".to_string(),
            });
        }

        Ok(self
            .replies
            .iter()
            .find(|(needle, _)| prompt.contains(needle))
            .map(|(_, text)| text.clone())
            .unwrap_or_else(|| "no issues".to_string()))
    }
}

pub(crate) fn target() -> TargetContext {
    TargetContext::new(RepoSlug::new("acme", "widget"), 42, "abc123")
        .expect("valid test target")
}
