use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, Record};

/// A design system. Platforms, colors and fonts belong to a brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Lowercase, dash-separated name for file paths and token prefixes.
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

impl Record for Brand {
    const TABLE: &'static str = "brands";

    fn id(&self) -> &str {
        &self.id
    }
}

pub(crate) fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut dash = false;
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(slugify("Acme  Design / System!"), "acme-design-system");
        assert_eq!(slugify("  Body Large "), "body-large");
    }

    #[test]
    fn new_brand_has_id_and_timestamps() {
        let brand = Brand::new("Acme", None);
        assert_eq!(brand.id.len(), 36);
        assert_eq!(brand.created_at, brand.updated_at);
    }
}
