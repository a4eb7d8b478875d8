//! pr-review core - review pipeline for pull requests
//!
//! This crate holds everything that does not talk to GitHub directly:
//! configuration, the completion API client, prompt rendering, and the
//! collect / generate / publish stages that drive a review run. GitHub
//! access is abstracted behind [`ReviewHost`] so the stages can be tested
//! with in-memory fakes.

pub mod completion;
pub mod config;
pub mod credentials;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod prompt;
pub mod retry;
pub mod review;
pub mod target;

pub use completion::{CompletionClient, OpenAiClient};
pub use config::{CompletionConfig, Config, GitHubConfig, PipelineConfig};
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use host::ReviewHost;
pub use pipeline::{Pipeline, PipelineOptions, RunReport, Stage};
pub use prompt::PromptBuilder;
pub use retry::RetryPolicy;
pub use review::{
    ChangedFile, ExistingReview, FileStatus, NewReview, ReviewEvent, ReviewResult, ReviewState,
    BOT_MARKER,
};
pub use target::{RepoSlug, TargetContext};
