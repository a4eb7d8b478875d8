//! Configuration management for pr-review
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (PR_REVIEW_*, OPENAI_BASE_URL, GITHUB_API_URL)
//! 3. Config file (--config, or ~/.config/pr-review/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompt::{CONTENT_PLACEHOLDER, DEFAULT_PROMPT_TEMPLATE};
use crate::review::ReviewEvent;
use crate::{Error, Result};

/// Completion API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Model identifier sent with every request
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Base URL of an OpenAI-compatible API
    pub base_url: String,

    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Instruction template; `{content}` is replaced with the file content
    pub prompt_template: String,

    /// Longest file content sent as-is, in characters (0 = unlimited)
    pub max_content_chars: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.5,
            base_url: "https://api.openai.com".to_string(),
            timeout: Duration::from_secs(60),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            max_content_chars: 60_000,
        }
    }
}

/// GitHub configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API base URL (None = public GitHub)
    pub api_url: Option<String>,

    /// Event used when creating reviews
    pub review_event: ReviewEvent,

    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            review_event: ReviewEvent::Comment,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Files fetched / reviewed at the same time
    pub concurrency: usize,

    /// Total attempts per call, including the first one
    pub retry_attempts: u32,

    /// Base delay between attempts; grows linearly
    #[serde(with = "humantime_serde")]
    pub retry_backoff: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Completion API configuration
    pub completion: CompletionConfig,

    /// GitHub configuration
    pub github: GitHubConfig,

    /// Pipeline configuration
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration file");
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/pr-review/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pr-review").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - PR_REVIEW_MODEL: Completion model
    /// - PR_REVIEW_CONCURRENCY: Files processed at once
    /// - OPENAI_BASE_URL: Completion API base URL
    /// - GITHUB_API_URL: GitHub REST API base URL (set by GitHub Actions)
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = get("PR_REVIEW_MODEL") {
            self.completion.model = model;
        }

        if let Some(concurrency) = get("PR_REVIEW_CONCURRENCY") {
            self.pipeline.concurrency = concurrency.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "PR_REVIEW_CONCURRENCY must be a positive integer, got '{}'",
                    concurrency
                ))
            })?;
        }

        if let Some(base_url) = get("OPENAI_BASE_URL") {
            self.completion.base_url = base_url;
        }

        if let Some(api_url) = get("GITHUB_API_URL") {
            self.github.api_url = Some(api_url);
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, model: Option<String>, concurrency: Option<usize>) -> Self {
        if let Some(m) = model {
            self.completion.model = m;
        }

        if let Some(n) = concurrency {
            self.pipeline.concurrency = n;
        }

        self
    }

    /// Load configuration with all overrides applied, then validate it
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        config_path: Option<&Path>,
        model: Option<String>,
        concurrency: Option<usize>,
    ) -> Result<Self> {
        let base = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        let config = base
            .with_env_overrides()?
            .with_cli_overrides(model, concurrency);
        config.validate()?;
        Ok(config)
    }

    /// Check values that would otherwise only fail once the run is underway
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(Error::Config(format!(
                "completion.temperature must be between 0 and 2, got {}",
                self.completion.temperature
            )));
        }

        if self.completion.model.trim().is_empty() {
            return Err(Error::Config("completion.model must not be empty".to_string()));
        }

        if !self.completion.prompt_template.contains(CONTENT_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "completion.prompt_template must contain {}",
                CONTENT_PLACEHOLDER
            )));
        }

        url::Url::parse(&self.completion.base_url).map_err(|e| {
            Error::Config(format!(
                "Invalid completion.base_url '{}': {}",
                self.completion.base_url, e
            ))
        })?;

        if let Some(api_url) = &self.github.api_url {
            url::Url::parse(api_url)
                .map_err(|e| Error::Config(format!("Invalid github.api_url '{}': {}", api_url, e)))?;
        }

        if self.pipeline.concurrency == 0 {
            return Err(Error::Config(
                "pipeline.concurrency must be at least 1".to_string(),
            ));
        }

        if self.pipeline.retry_attempts == 0 {
            return Err(Error::Config(
                "pipeline.retry_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
