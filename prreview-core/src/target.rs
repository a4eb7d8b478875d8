//! Review target: which repository, pull request and commit a run works on

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A repository identified as `owner/name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoSlug {
    /// Create a slug from already separated parts
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse the `owner/name` form used by `GITHUB_REPOSITORY`
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let invalid = || {
            Error::Config(format!(
                "Invalid repository '{}'. Expected owner/repo",
                value
            ))
        };

        let (owner, name) = value.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self::new(owner, name))
    }
}

impl FromStr for RepoSlug {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The pull request a run reviews
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetContext {
    /// Repository the pull request belongs to
    pub repo: RepoSlug,
    /// Pull request number
    pub pr_number: u64,
    /// Commit new reviews are attached to
    pub commit_sha: String,
}

impl TargetContext {
    /// Build a validated target
    pub fn new(repo: RepoSlug, pr_number: u64, commit_sha: impl Into<String>) -> Result<Self> {
        let commit_sha = commit_sha.into().trim().to_string();

        if pr_number == 0 {
            return Err(Error::Config(
                "Pull request number is required (--github_pr_id)".to_string(),
            ));
        }

        if commit_sha.is_empty() {
            return Err(Error::Config(
                "Commit SHA is required (--commit-sha or GITHUB_SHA)".to_string(),
            ));
        }

        Ok(Self {
            repo,
            pr_number,
            commit_sha,
        })
    }

    /// Same target, with the repository replaced by its canonical form
    pub fn with_repo(mut self, repo: RepoSlug) -> Self {
        self.repo = repo;
        self
    }

    /// Repository owner
    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    /// Repository name
    pub fn repo_name(&self) -> &str {
        &self.repo.name
    }
}

impl fmt::Display for TargetContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.pr_number)
    }
}
