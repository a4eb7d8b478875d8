//! Prompt rendering for per-file review requests

use tracing::warn;

use crate::config::CompletionConfig;

/// Placeholder replaced with the file content
pub const CONTENT_PLACEHOLDER: &str = "{content}";

/// Instruction sent with every file
pub const DEFAULT_PROMPT_TEMPLATE: &str =
    "Analise and find bugs on the code like sonar from next file in: {content}";

/// A rendered prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// Text sent as the user message
    pub text: String,
    /// Whether the file content was cut to fit the size limit
    pub truncated: bool,
}

/// Renders the review instruction for a file
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
    max_content_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_TEMPLATE, 0)
    }
}

impl PromptBuilder {
    /// Create a builder; `max_content_chars == 0` disables truncation
    pub fn new(template: impl Into<String>, max_content_chars: usize) -> Self {
        Self {
            template: template.into(),
            max_content_chars,
        }
    }

    /// Create a builder from the completion configuration
    pub fn from_config(config: &CompletionConfig) -> Self {
        Self::new(config.prompt_template.clone(), config.max_content_chars)
    }

    /// Render the prompt for one file
    ///
    /// Content within the limit is interpolated verbatim. Longer content is
    /// cut at a character boundary and followed by a note telling the model
    /// it only sees the beginning of the file.
    pub fn render(&self, filename: &str, content: &str) -> RenderedPrompt {
        match self.truncation_point(content) {
            None => RenderedPrompt {
                text: self.template.replace(CONTENT_PLACEHOLDER, content),
                truncated: false,
            },
            Some(cut) => {
                let total = content.chars().count();
                warn!(
                    file = %filename,
                    chars = total,
                    limit = self.max_content_chars,
                    "File content exceeds prompt limit, truncating"
                );
                let shortened = format!(
                    "{}\n\n[truncated: showing the first {} of {} characters]",
                    &content[..cut],
                    self.max_content_chars,
                    total
                );
                RenderedPrompt {
                    text: self.template.replace(CONTENT_PLACEHOLDER, &shortened),
                    truncated: true,
                }
            }
        }
    }

    /// Byte offset where content must be cut, if it is over the limit
    fn truncation_point(&self, content: &str) -> Option<usize> {
        if self.max_content_chars == 0 {
            return None;
        }
        content
            .char_indices()
            .nth(self.max_content_chars)
            .map(|(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_interpolated_verbatim() {
        let builder = PromptBuilder::default();
        let content = "package a\n\nfunc f() { _ = \"{content}\" }\n";
        let prompt = builder.render("a.go", content);

        assert!(!prompt.truncated);
        assert_eq!(
            prompt.text,
            format!(
                "Analise and find bugs on the code like sonar from next file in: {}",
                content
            )
        );
    }

    #[test]
    fn test_content_at_limit_is_untouched() {
        let builder = PromptBuilder::new("{content}", 5);
        let prompt = builder.render("x", "abcde");
        assert!(!prompt.truncated);
        assert_eq!(prompt.text, "abcde");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let builder = PromptBuilder::new("<{content}>", 3);
        let prompt = builder.render("x", "héllo wörld");

        assert!(prompt.truncated);
        assert!(prompt.text.starts_with("<hél\n\n[truncated"));
        assert!(prompt.text.contains("first 3 of 11 characters"));
        assert!(prompt.text.ends_with(">"));
    }

    #[test]
    fn test_zero_limit_disables_truncation() {
        let builder = PromptBuilder::new("{content}", 0);
        let long = "x".repeat(200_000);
        let prompt = builder.render("big.txt", &long);
        assert!(!prompt.truncated);
        assert_eq!(prompt.text.len(), 200_000);
    }
}
