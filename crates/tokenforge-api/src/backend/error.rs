use thiserror::Error;

use crate::http::HttpFailure;

/// Errors from the hosted database client.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<HttpFailure> for BackendError {
    fn from(f: HttpFailure) -> Self {
        Self::Api {
            status: f.status,
            message: f.body,
        }
    }
}
