use tokenforge_core::config::AiConfig;

use super::{AiError, AnthropicClient, DeepSeekClient, GeminiClient};
use crate::traits::AiProvider;

/// Provider chosen at runtime from configuration.
pub enum AnyProvider {
    Anthropic(AnthropicClient),
    Gemini(GeminiClient),
    DeepSeek(DeepSeekClient),
}

impl AnyProvider {
    pub const NAMES: &[&str] = &["anthropic", "gemini", "deepseek"];

    /// Build the named provider (or the configured default).
    pub fn from_config(config: &AiConfig, name: Option<&str>) -> Result<Self, AiError> {
        let name = name.unwrap_or(config.provider.as_str());
        let settings = config
            .provider(name)
            .ok_or_else(|| AiError::UnknownProvider(name.to_string()))?;
        if !settings.enabled {
            return Err(AiError::NotConfigured(name.to_string(), "disabled in config"));
        }
        let key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AiError::NotConfigured(name.to_string(), "missing API key"))?;
        let model = settings.model.clone();
        let max = config.max_tokens;

        Ok(match name {
            "anthropic" => Self::Anthropic(AnthropicClient::new(key, model, max)),
            "gemini" => Self::Gemini(GeminiClient::new(key, model, max)),
            _ => Self::DeepSeek(DeepSeekClient::new(key, model, max)),
        })
    }
}

impl AiProvider for AnyProvider {
    type Error = AiError;

    fn name(&self) -> &'static str {
        match self {
            Self::Anthropic(c) => c.name(),
            Self::Gemini(c) => c.name(),
            Self::DeepSeek(c) => c.name(),
        }
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError> {
        match self {
            Self::Anthropic(c) => c.complete(system, prompt).await,
            Self::Gemini(c) => c.complete(system, prompt).await,
            Self::DeepSeek(c) => c.complete(system, prompt).await,
        }
    }
}
