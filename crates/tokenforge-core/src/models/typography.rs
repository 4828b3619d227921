use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, Record};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

impl TextTransform {
    pub fn as_css(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::Capitalize => "capitalize",
        }
    }

    /// Figma `TextCase` value.
    pub fn as_figma(&self) -> &'static str {
        match self {
            Self::None => "ORIGINAL",
            Self::Uppercase => "UPPER",
            Self::Lowercase => "LOWER",
            Self::Capitalize => "TITLE",
        }
    }
}

/// A named text style bound to one step of a platform's scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeStyle {
    pub id: String,
    pub platform_id: String,
    pub name: String,
    pub scale_step: i32,
    #[serde(default)]
    pub font_id: Option<String>,
    pub font_weight: u16,
    /// Unitless multiplier of the font size.
    pub line_height: f64,
    /// Em fraction, e.g. `-0.01`.
    pub letter_spacing: f64,
    #[serde(default)]
    pub text_transform: TextTransform,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TypeStyle {
    pub fn new(platform_id: impl Into<String>, name: impl Into<String>, scale_step: i32) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            platform_id: platform_id.into(),
            name: name.into(),
            scale_step,
            font_id: None,
            font_weight: 400,
            line_height: default_line_height(scale_step),
            letter_spacing: 0.0,
            text_transform: TextTransform::None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Default style set for a scale spanning `[-steps_down, steps_up]`:
    /// captions below the base, body at the base, headings above it.
    pub fn defaults_for(platform_id: &str, steps_up: u32, steps_down: u32) -> Vec<Self> {
        let mut styles = Vec::new();
        for i in (1..=steps_down).rev() {
            let name = if i == 1 {
                "caption".to_string()
            } else {
                format!("caption-{i}")
            };
            styles.push(Self::new(platform_id, name, -(i as i32)));
        }
        styles.push(Self::new(platform_id, "body", 0));
        for i in 1..=steps_up {
            // h1 is the largest heading.
            let level = steps_up - i + 1;
            let mut style = Self::new(platform_id, format!("h{level}"), i as i32);
            style.font_weight = 700;
            style.letter_spacing = if i >= 3 { -0.01 } else { 0.0 };
            styles.push(style);
        }
        styles
    }
}

/// Larger text needs less leading.
fn default_line_height(step: i32) -> f64 {
    match step {
        i32::MIN..=0 => 1.5,
        1..=2 => 1.3,
        _ => 1.2,
    }
}

impl Record for TypeStyle {
    const TABLE: &'static str = "typography";

    fn id(&self) -> &str {
        &self.id
    }
}
