pub mod client;
pub mod error;

pub use client::{CommitInfo, GitHubClient};
pub use error::GitHubError;
