mod analysis;
mod brand;
mod color;
mod font;
mod platform;
mod typography;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use analysis::{AiAnalysis, Recommendation};
pub use brand::Brand;
pub(crate) use brand::slugify;
pub use color::{contrast_ratio, ColorRole, ColorToken, Rgb};
pub use font::{weight_style_name, Font, FontCategory};
pub use platform::{Platform, Unit};
pub use typography::{TextTransform, TypeStyle};

/// A row mirrored from the hosted database.
///
/// `TABLE` is the remote table name; it doubles as the record kind in the
/// local snapshot.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: &'static str;

    fn id(&self) -> &str;
}

/// Equality conditions on top-level row fields, e.g. `brand_id = ...`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(String, String)>,
}

impl Filter {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::all().and(column, value)
    }

    pub fn and(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether a serialized row satisfies every condition. Non-string
    /// fields are compared by their JSON rendering.
    pub fn matches(&self, row: &serde_json::Value) -> bool {
        self.conditions.iter().all(|(column, expected)| match row.get(column) {
            Some(serde_json::Value::String(s)) => s == expected,
            Some(serde_json::Value::Null) | None => false,
            Some(other) => other.to_string() == *expected,
        })
    }
}

/// Fresh client-side row ID.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
