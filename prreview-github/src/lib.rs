//! pr-review GitHub - GitHub integration for pr-review
//!
//! This crate implements [`prreview_core::ReviewHost`] on top of octocrab:
//! resolving the repository, listing pull request files, fetching their
//! content, and managing the bot's reviews.

mod client;
mod error;
mod files;
mod host;
mod reviews;

pub use client::GitHubClient;
pub use error::{Error, Result};
pub use files::decode_content;
