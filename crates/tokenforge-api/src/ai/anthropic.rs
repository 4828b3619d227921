use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::AiError;
use crate::http::ensure_success;
use crate::traits::AiProvider;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
pub struct AnthropicClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    http: Client,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    /// Concatenated text blocks.
    pub(crate) fn into_text(self) -> Result<String, AiError> {
        let text: String = self
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();
        if text.is_empty() {
            Err(AiError::Parse("response contained no text blocks".into()))
        } else {
            Ok(text)
        }
    }
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            api_key,
            model,
            max_tokens,
            http: Client::new(),
        }
    }
}

impl AiProvider for AnthropicClient {
    type Error = AiError;

    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };
        let resp = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let parsed: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;
        tracing::debug!(model = %self.model, "anthropic completion received");
        parsed.into_text()
    }
}
