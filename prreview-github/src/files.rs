//! Pull request files and their content

use base64::Engine;
use octocrab::models::repos::{DiffEntry, DiffEntryStatus};
use prreview_core::{ChangedFile, FileStatus, TargetContext};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{Error, GitHubClient, Result};

/// Map octocrab's diff status onto the file status the pipeline uses
fn file_status(status: &DiffEntryStatus) -> FileStatus {
    match status {
        DiffEntryStatus::Added => FileStatus::Added,
        DiffEntryStatus::Removed => FileStatus::Removed,
        DiffEntryStatus::Renamed => FileStatus::Renamed,
        DiffEntryStatus::Copied => FileStatus::Copied,
        DiffEntryStatus::Changed => FileStatus::Changed,
        DiffEntryStatus::Unchanged => FileStatus::Unchanged,
        _ => FileStatus::Modified,
    }
}

/// Convert an octocrab diff entry into the pipeline's changed file
fn changed_file(entry: DiffEntry) -> ChangedFile {
    ChangedFile::new(
        entry.filename,
        file_status(&entry.status),
        entry.contents_url.to_string(),
    )
}

/// Content record returned by a file's contents URL
#[derive(Debug, Deserialize)]
struct ContentRecord {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Decode the payload of a content record into text
///
/// GitHub wraps base64 content in newlines. Files over the inline size
/// limit come back with encoding `none` and no content.
pub fn decode_content(
    path: &str,
    kind: Option<&str>,
    encoding: Option<&str>,
    content: Option<&str>,
) -> Result<String> {
    let fail = |reason: String| Error::Decode {
        path: path.to_string(),
        reason,
    };

    if let Some(kind) = kind {
        if kind != "file" {
            return Err(fail(format!("not a regular file ({})", kind)));
        }
    }

    let content = content.unwrap_or_default();
    match encoding.unwrap_or_default() {
        "base64" => {
            let packed: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(packed)
                .map_err(|e| fail(format!("invalid base64: {}", e)))?;
            String::from_utf8(bytes).map_err(|_| fail("content is not valid UTF-8".to_string()))
        }
        "" => Ok(content.to_string()),
        "none" => Err(fail(
            "file is too large to be returned inline".to_string(),
        )),
        other => Err(fail(format!("unsupported content encoding: {}", other))),
    }
}

impl GitHubClient {
    /// List every file changed by a pull request
    pub async fn list_pr_files(&self, target: &TargetContext) -> Result<Vec<ChangedFile>> {
        debug!(target = %target, "Listing pull request files");

        let first = self
            .timed(
                self.client()
                    .pulls(target.owner(), target.repo_name())
                    .list_files(target.pr_number),
            )
            .await?;
        let entries = self.collect_pages(first).await?;

        info!(target = %target, count = entries.len(), "Fetched pull request files");

        Ok(entries.into_iter().map(changed_file).collect())
    }

    /// Fetch a file's content through its contents URL and decode it
    pub async fn fetch_content(&self, file: &ChangedFile) -> Result<String> {
        debug!(file = %file.filename, url = %file.contents_url, "Fetching file content");

        let raw: serde_json::Value = self
            .timed(self.client().get(file.contents_url.as_str(), None::<&()>))
            .await?;

        let record: ContentRecord = serde_json::from_value(raw).map_err(|e| Error::Decode {
            path: file.filename.clone(),
            reason: format!("unexpected content record: {}", e),
        })?;

        decode_content(
            &file.filename,
            record.kind.as_deref(),
            record.encoding.as_deref(),
            record.content.as_deref(),
        )
    }
}
