use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::AiError;
use crate::http::ensure_success;
use crate::traits::AiProvider;

const API_URL: &str = "https://api.deepseek.com/chat/completions";

/// DeepSeek client (OpenAI-compatible chat completions).
pub struct DeepSeekClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    http: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    pub(crate) fn into_text(self) -> Result<String, AiError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AiError::Parse("response contained no choices".into()))
    }
}

impl DeepSeekClient {
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            api_key,
            model,
            max_tokens,
            http: Client::new(),
        }
    }
}

impl AiProvider for DeepSeekClient {
    type Error = AiError;

    fn name(&self) -> &'static str {
        "deepseek"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };
        let resp = self
            .http
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;
        tracing::debug!(model = %self.model, "deepseek completion received");
        parsed.into_text()
    }
}
