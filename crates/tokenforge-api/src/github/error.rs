use thiserror::Error;

use crate::http::HttpFailure;

/// Errors from the GitHub contents client.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("GitHub is not configured: {0}")]
    NotConfigured(&'static str),
}

impl From<HttpFailure> for GitHubError {
    fn from(f: HttpFailure) -> Self {
        Self::Api {
            status: f.status,
            message: f.body,
        }
    }
}
