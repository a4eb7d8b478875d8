//! Credentials for the two APIs a run talks to

use std::fmt;

use crate::{Error, Result};

/// Tokens used to authenticate against GitHub and the completion API
#[derive(Clone)]
pub struct Credentials {
    github_token: String,
    completion_api_key: String,
}

impl Credentials {
    /// Validate and wrap the two secrets
    ///
    /// Surrounding whitespace is trimmed. Empty values are rejected.
    pub fn new(github_token: &str, completion_api_key: &str) -> Result<Self> {
        let github_token = github_token.trim();
        let completion_api_key = completion_api_key.trim();

        if github_token.is_empty() {
            return Err(Error::Config(
                "GitHub token is required (--github_token or GITHUB_TOKEN)".to_string(),
            ));
        }

        if completion_api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key is required (--openai_api_key or OPENAI_API_KEY)".to_string(),
            ));
        }

        Ok(Self {
            github_token: github_token.to_string(),
            completion_api_key: completion_api_key.to_string(),
        })
    }

    /// GitHub token
    pub fn github_token(&self) -> &str {
        &self.github_token
    }

    /// Completion API key
    pub fn completion_api_key(&self) -> &str {
        &self.completion_api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}
