use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::AiError;
use crate::http::ensure_success;
use crate::traits::AiProvider;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    http: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate.
    pub(crate) fn into_text(self) -> Result<String, AiError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            Err(AiError::Parse("response contained no candidates".into()))
        } else {
            Ok(text)
        }
    }
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            api_key,
            model,
            max_tokens,
            http: Client::new(),
        }
    }
}

impl AiProvider for GeminiClient {
    type Error = AiError;

    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError> {
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: [Part { text: system }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
                response_mime_type: "application/json",
            },
        };
        let resp = self
            .http
            .post(format!("{BASE_URL}/{}:generateContent", self.model))
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;
        tracing::debug!(model = %self.model, "gemini completion received");
        parsed.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_candidate() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"summary\":"},{"text":"\"ok\"}"}]}},{"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(resp.into_text().unwrap(), r#"{"summary":"ok"}"#);
    }

    #[test]
    fn blocked_prompt_is_error() {
        let resp: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(resp.into_text().is_err());
    }
}
