//! pr-review CLI - review the files of a pull request with a completion model
//!
//! Meant to run inside a GitHub Actions job: the token, repository, commit and
//! pull request number all default to the variables the runner provides.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use prreview_core::{
    Config, Credentials, OpenAiClient, Pipeline, PipelineOptions, RepoSlug, RunReport,
    TargetContext,
};
use prreview_github::GitHubClient;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit status when the run finished and every file was handled
const EXIT_OK: u8 = 0;
/// Exit status when the run was aborted
const EXIT_FATAL: u8 = 1;
/// Exit status when the run finished but some files or reviews failed
const EXIT_PARTIAL: u8 = 2;

/// pr-review: post a model-generated review for every file of a pull request
#[derive(Parser, Debug)]
#[command(name = "pr-review")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// GitHub token used to read the pull request and post reviews
    #[arg(long = "github_token", env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// OpenAI API key
    #[arg(long = "openai_api_key", env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Number of the pull request to review
    #[arg(long = "github_pr_id", env = "GITHUB_PR_ID", default_value_t = 0)]
    github_pr_id: u64,

    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Commit the reviews are attached to
    #[arg(long = "commit-sha", env = "GITHUB_SHA")]
    commit_sha: Option<String>,

    /// Path to a config file (defaults to ~/.config/pr-review/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Completion model (overrides config and env)
    #[arg(long)]
    model: Option<String>,

    /// Files processed at once (overrides config and env)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Generate reviews but do not remove or post anything
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let outcome = run(cli).await;
    match &outcome {
        Ok(report) => {
            println!();
            print!("{report}");
        }
        Err(e) => tracing::error!("{:#}", e),
    }

    ExitCode::from(exit_status(&outcome))
}

/// Map the outcome of a run to the process exit status
fn exit_status(outcome: &anyhow::Result<RunReport>) -> u8 {
    match outcome {
        Ok(report) if report.has_failures() => EXIT_PARTIAL,
        Ok(_) => EXIT_OK,
        Err(_) => EXIT_FATAL,
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunReport> {
    let config = Config::load_with_overrides(cli.config.as_deref(), cli.model, cli.concurrency)
        .context("Failed to load configuration")?;

    tracing::debug!(
        model = %config.completion.model,
        concurrency = config.pipeline.concurrency,
        review_event = ?config.github.review_event,
        "Configuration loaded"
    );

    let credentials = Credentials::new(
        cli.github_token.as_deref().unwrap_or_default(),
        cli.openai_api_key.as_deref().unwrap_or_default(),
    )
    .context("Missing credentials (set GITHUB_TOKEN and OPENAI_API_KEY)")?;

    let repo = RepoSlug::parse(cli.repository.as_deref().unwrap_or_default())
        .context("Invalid repository (expected owner/name in GITHUB_REPOSITORY)")?;
    let target = TargetContext::new(
        repo,
        cli.github_pr_id,
        cli.commit_sha.unwrap_or_default(),
    )
    .context("Invalid pull request target")?;

    let github = GitHubClient::new(credentials.github_token(), &config.github)
        .context("Failed to create GitHub client")?;
    let completion = OpenAiClient::new(credentials.completion_api_key(), &config.completion)
        .context("Failed to create completion client")?;

    let options = PipelineOptions::from_config(&config).with_dry_run(cli.dry_run);
    let progress = |filename: &str, review: &str| {
        println!("Review for {filename}:\n{review}\n");
    };

    let report = Pipeline::new(&github, &completion, options)
        .with_progress(&progress)
        .run(target)
        .await
        .context("Review run failed")?;

    Ok(report)
}
