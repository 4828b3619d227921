pub mod anthropic;
pub mod deepseek;
pub mod error;
pub mod gemini;
pub mod prompt;
pub mod provider;

pub use anthropic::AnthropicClient;
pub use deepseek::DeepSeekClient;
pub use error::AiError;
pub use gemini::GeminiClient;
pub use provider::AnyProvider;
