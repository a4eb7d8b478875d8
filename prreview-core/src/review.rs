//! Review domain types
//!
//! Files collected from a pull request, reviews already on it, and the
//! generated results waiting to be published.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker embedded in every review body this tool posts
///
/// Reviews whose body contains the marker are treated as ours and removed
/// before a new round is published.
pub const BOT_MARKER: &str = "pr-review-actions[bot]";

/// Separator placed between several generated texts for the same file
const TEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Status of a file in a pull request, as reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    #[default]
    Modified,
    Removed,
    Renamed,
    Copied,
    Changed,
    Unchanged,
}

impl FileStatus {
    /// Parse the status string used by the GitHub REST API
    ///
    /// Unknown values map to `Modified` so the file is still reviewed.
    pub fn from_api(status: &str) -> Self {
        match status {
            "added" => FileStatus::Added,
            "removed" => FileStatus::Removed,
            "renamed" => FileStatus::Renamed,
            "copied" => FileStatus::Copied,
            "changed" => FileStatus::Changed,
            "unchanged" => FileStatus::Unchanged,
            _ => FileStatus::Modified,
        }
    }

    /// Whether the file still has content at the head commit
    pub fn has_content(&self) -> bool {
        !matches!(self, FileStatus::Removed)
    }
}

/// A file changed by the pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// Path of the file in the repository
    pub filename: String,
    /// Change status
    pub status: FileStatus,
    /// API URL that returns the file's content record
    pub contents_url: String,
    /// Decoded text content, once fetched
    pub content: Option<String>,
}

impl ChangedFile {
    /// Create a file entry that has not been fetched yet
    pub fn new(
        filename: impl Into<String>,
        status: FileStatus,
        contents_url: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            status,
            contents_url: contents_url.into(),
            content: None,
        }
    }

    /// Attach fetched content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// State of a review already on the pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    /// Not yet submitted; can be deleted
    Pending,
    /// Submitted (commented, approved, ...); can only be edited
    Submitted,
}

/// A review that was already on the pull request when the run started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingReview {
    /// Review ID
    pub id: u64,
    /// Review body (empty when the review has none)
    pub body: String,
    /// Review state
    pub state: ReviewState,
}

impl ExistingReview {
    /// Whether this review was posted by a previous run of this tool
    pub fn is_bot_review(&self) -> bool {
        self.body.contains(BOT_MARKER)
    }
}

/// Event attached to a newly created review
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewEvent {
    /// Submit immediately as a plain comment review
    #[default]
    Comment,
    /// Leave the review pending (no event sent)
    Pending,
}

/// A review about to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    /// Commit the review is attached to
    pub commit_id: String,
    /// Review body
    pub body: String,
    /// Review event
    pub event: ReviewEvent,
}

/// Generated review texts keyed by filename
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewResult {
    entries: BTreeMap<String, Vec<String>>,
}

impl ReviewResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a generated text for a file
    pub fn push(&mut self, filename: impl Into<String>, text: impl Into<String>) {
        self.entries
            .entry(filename.into())
            .or_default()
            .push(text.into());
    }

    /// Texts generated for a file
    pub fn get(&self, filename: &str) -> Option<&[String]> {
        self.entries.get(filename).map(Vec::as_slice)
    }

    /// Number of files with at least one generated text
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was generated
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(filename, texts)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, texts)| (name.as_str(), texts.as_slice()))
    }
}

impl fmt::Display for ReviewResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (filename, texts) in self.iter() {
            writeln!(f, "{filename}:")?;
            for text in texts {
                writeln!(f, "  {}", text.replace('\n', "\n  "))?;
            }
        }
        Ok(())
    }
}

/// Build the body of the review posted for one file
pub fn format_review_body(filename: &str, texts: &[String]) -> String {
    format!(
        "Automatic Commented Review by {BOT_MARKER}.\n\n\nReview result for file \"{filename}\":\n\n{}",
        texts.join(TEXT_SEPARATOR)
    )
}

/// Body written over a submitted bot review that cannot be deleted
///
/// Must not contain [`BOT_MARKER`], otherwise the review would be picked up
/// again on every run.
pub fn superseded_body() -> String {
    "_This automatic review is outdated and was superseded by a newer run._".to_string()
}
