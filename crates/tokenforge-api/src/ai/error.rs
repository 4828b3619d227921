use thiserror::Error;

use crate::http::HttpFailure;

/// Errors from the AI provider clients.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("provider {0} is not configured: {1}")]
    NotConfigured(String, &'static str),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

impl From<HttpFailure> for AiError {
    fn from(f: HttpFailure) -> Self {
        Self::Api {
            status: f.status,
            message: f.body,
        }
    }
}
