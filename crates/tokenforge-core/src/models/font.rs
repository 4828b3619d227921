use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, Record};
use crate::error::TokenforgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontCategory {
    Serif,
    SansSerif,
    Monospace,
    Display,
    Handwriting,
}

impl FontCategory {
    /// CSS generic family used as the last fallback.
    pub fn generic_family(&self) -> &'static str {
        match self {
            Self::Serif => "serif",
            Self::SansSerif | Self::Display => "sans-serif",
            Self::Monospace => "monospace",
            Self::Handwriting => "cursive",
        }
    }
}

impl std::str::FromStr for FontCategory {
    type Err = TokenforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "serif" => Ok(Self::Serif),
            "sans-serif" | "sans" => Ok(Self::SansSerif),
            "monospace" | "mono" => Ok(Self::Monospace),
            "display" => Ok(Self::Display),
            "handwriting" => Ok(Self::Handwriting),
            _ => Err(TokenforgeError::Validation(format!("unknown font category: {s}"))),
        }
    }
}

/// A font family registered for a brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub id: String,
    pub brand_id: String,
    pub name: String,
    pub family: String,
    pub category: FontCategory,
    pub weights: Vec<u16>,
    /// Object-storage URL of the uploaded font file, if any.
    #[serde(default)]
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Font {
    pub fn new(
        brand_id: impl Into<String>,
        family: impl Into<String>,
        category: FontCategory,
        weights: Vec<u16>,
    ) -> Result<Self, TokenforgeError> {
        if let Some(w) = weights.iter().find(|w| !(100..=900).contains(*w) || *w % 100 != 0) {
            return Err(TokenforgeError::Validation(format!(
                "font weight {w} is not one of 100..900"
            )));
        }
        let family = family.into();
        let now = Utc::now();
        let mut weights = weights;
        weights.sort_unstable();
        weights.dedup();
        Ok(Self {
            id: new_id(),
            brand_id: brand_id.into(),
            name: family.clone(),
            family,
            category,
            weights,
            file_url: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// CSS `font-family` value with the category fallback.
    pub fn css_stack(&self) -> String {
        let family = if self.family.contains(' ') {
            format!("\"{}\"", self.family)
        } else {
            self.family.clone()
        };
        format!("{family}, {}", self.category.generic_family())
    }

    /// Closest available weight to the requested one.
    pub fn nearest_weight(&self, requested: u16) -> u16 {
        self.weights
            .iter()
            .copied()
            .min_by_key(|w| (i32::from(*w) - i32::from(requested)).abs())
            .unwrap_or(requested)
    }
}

impl Record for Font {
    const TABLE: &'static str = "fonts";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Figma style name for a numeric weight.
pub fn weight_style_name(weight: u16) -> &'static str {
    match weight {
        0..=149 => "Thin",
        150..=249 => "ExtraLight",
        250..=349 => "Light",
        350..=449 => "Regular",
        450..=549 => "Medium",
        550..=649 => "SemiBold",
        650..=749 => "Bold",
        750..=849 => "ExtraBold",
        _ => "Black",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_stack_quotes_spaces() {
        let font = Font::new("b", "Source Serif", FontCategory::Serif, vec![400]).unwrap();
        assert_eq!(font.css_stack(), "\"Source Serif\", serif");
        let font = Font::new("b", "Inter", FontCategory::SansSerif, vec![400]).unwrap();
        assert_eq!(font.css_stack(), "Inter, sans-serif");
    }

    #[test]
    fn weights_validated_and_sorted() {
        assert!(Font::new("b", "Inter", FontCategory::SansSerif, vec![450]).is_err());
        let font = Font::new("b", "Inter", FontCategory::SansSerif, vec![700, 400, 700]).unwrap();
        assert_eq!(font.weights, vec![400, 700]);
        assert_eq!(font.nearest_weight(600), 700);
        assert_eq!(font.nearest_weight(300), 400);
    }

    #[test]
    fn weight_names() {
        assert_eq!(weight_style_name(400), "Regular");
        assert_eq!(weight_style_name(700), "Bold");
        assert_eq!(weight_style_name(900), "Black");
    }
}
