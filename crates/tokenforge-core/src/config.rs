use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::TokenforgeError;
use crate::scale::{DistanceInputs, ScaleSettings};

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub backend: BackendConfig,
    pub scale: ScaleSettings,
    pub distance: DistanceInputs,
    pub ai: AiConfig,
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub log_level: String,
    pub root_font_size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub url: String,
    /// Storage bucket for uploaded font files.
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Provider used when none is given explicitly.
    pub provider: String,
    pub max_tokens: u32,
    pub anthropic: ProviderConfig,
    pub gemini: ProviderConfig,
    pub deepseek: ProviderConfig,
}

impl AiConfig {
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "anthropic" => Some(&self.anthropic),
            "gemini" => Some(&self.gemini),
            "deepseek" => Some(&self.deepseek),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Destination path; `{brand}` is replaced by the brand slug.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl GitHubConfig {
    pub fn path_for(&self, brand_slug: &str) -> String {
        self.path.replace("{brand}", brand_slug)
    }
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults,
    /// then secrets from the environment.
    pub fn load() -> Result<Self, TokenforgeError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit path; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, TokenforgeError> {
        let mut merged: toml::Value =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| TokenforgeError::Config(e.to_string()))?;

        if path.exists() {
            let user_str = std::fs::read_to_string(path)?;
            let user: toml::Value = toml::from_str(&user_str)
                .map_err(|e| TokenforgeError::Config(format!("{}: {e}", path.display())))?;
            merge(&mut merged, user);
        }

        merged
            .try_into::<AppConfig>()
            .map_err(|e| TokenforgeError::Config(e.to_string()))
    }

    /// Fill empty secrets from environment variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fill(&mut self.backend.api_key, lookup("TOKENFORGE_BACKEND_KEY"));
        if let Some(url) = lookup("TOKENFORGE_BACKEND_URL") {
            self.backend.url = url;
        }
        fill(&mut self.ai.anthropic.api_key, lookup("ANTHROPIC_API_KEY"));
        fill(&mut self.ai.gemini.api_key, lookup("GEMINI_API_KEY"));
        fill(&mut self.ai.deepseek.api_key, lookup("DEEPSEEK_API_KEY"));
        fill(&mut self.github.token, lookup("GITHUB_TOKEN"));
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), TokenforgeError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), TokenforgeError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TokenforgeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the local snapshot database.
    pub fn db_path() -> PathBuf {
        Self::data_dir().join("tokenforge.db")
    }

    /// Directory for the database and log files.
    pub fn data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Ensure the data directory exists and return the DB path.
    pub fn ensure_db_path() -> Result<PathBuf, TokenforgeError> {
        let path = Self::db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "tokenforge")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    let empty = slot.as_deref().map_or(true, str::is_empty);
    if empty {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            *slot = Some(v);
        }
    }
}

/// Recursively overlay `over` onto `base`; tables merge, everything else replaces.
fn merge(base: &mut toml::Value, over: toml::Value) {
    match (base, over) {
        (toml::Value::Table(base), toml::Value::Table(over)) => {
            for (key, value) in over {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, over) => *base = over,
    }
}
