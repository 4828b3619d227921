use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, Record};

/// A single suggestion returned by an AI provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub detail: String,
    #[serde(default)]
    pub suggested_ratio: Option<f64>,
    #[serde(default)]
    pub suggested_base_size: Option<f64>,
}

/// Stored result of an AI review of a platform's typography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub id: String,
    pub brand_id: String,
    #[serde(default)]
    pub platform_id: Option<String>,
    /// Provider name, e.g. `anthropic`.
    pub provider: String,
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    pub created_at: DateTime<Utc>,
}

impl AiAnalysis {
    pub fn new(
        brand_id: impl Into<String>,
        platform_id: Option<String>,
        provider: impl Into<String>,
        summary: impl Into<String>,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        Self {
            id: new_id(),
            brand_id: brand_id.into(),
            platform_id,
            provider: provider.into(),
            summary: summary.into(),
            recommendations,
            created_at: Utc::now(),
        }
    }
}

impl Record for AiAnalysis {
    const TABLE: &'static str = "ai_analyses";

    fn id(&self) -> &str {
        &self.id
    }
}
