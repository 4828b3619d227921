use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, Record};
use crate::error::TokenforgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorRole {
    Primary,
    Secondary,
    Neutral,
    Accent,
    Semantic,
}

impl ColorRole {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Neutral => "neutral",
            Self::Accent => "accent",
            Self::Semantic => "semantic",
        }
    }
}

impl std::str::FromStr for ColorRole {
    type Err = TokenforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "neutral" => Ok(Self::Neutral),
            "accent" => Ok(Self::Accent),
            "semantic" => Ok(Self::Semantic),
            _ => Err(TokenforgeError::Validation(format!("unknown color role: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `#rgb` or `#rrggbb` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, TokenforgeError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let invalid = || TokenforgeError::Validation(format!("invalid hex color: {hex}"));
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(invalid()),
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// WCAG 2.x relative luminance.
    pub fn relative_luminance(&self) -> f64 {
        fn linear(c: u8) -> f64 {
            let c = f64::from(c) / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    /// Channels as 0..1 floats, the form Figma expects.
    pub fn unit_channels(&self) -> (f64, f64, f64) {
        (
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        )
    }
}

/// WCAG contrast ratio between two colors, in `1.0..=21.0`.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = a.relative_luminance();
    let lb = b.relative_luminance();
    let (hi, lo) = if la >= lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

/// A named color in a brand palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorToken {
    pub id: String,
    pub brand_id: String,
    pub name: String,
    /// Normalized lowercase `#rrggbb`.
    pub hex: String,
    pub role: ColorRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ColorToken {
    pub fn new(
        brand_id: impl Into<String>,
        name: impl Into<String>,
        hex: &str,
        role: ColorRole,
    ) -> Result<Self, TokenforgeError> {
        let rgb = Rgb::from_hex(hex)?;
        let now = Utc::now();
        Ok(Self {
            id: new_id(),
            brand_id: brand_id.into(),
            name: name.into(),
            hex: rgb.to_hex(),
            role,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn rgb(&self) -> Result<Rgb, TokenforgeError> {
        Rgb::from_hex(&self.hex)
    }
}

impl Record for ColorToken {
    const TABLE: &'static str = "colors";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(Rgb::from_hex("#fff").unwrap(), Rgb { r: 255, g: 255, b: 255 });
        assert_eq!(Rgb::from_hex("1A2b3C").unwrap().to_hex(), "#1a2b3c");
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("#gg0000").is_err());
    }

    #[test]
    fn black_on_white_is_21() {
        let black = Rgb::from_hex("#000").unwrap();
        let white = Rgb::from_hex("#fff").unwrap();
        assert!((contrast_ratio(black, white) - 21.0).abs() < 1e-9);
        assert!((contrast_ratio(white, black) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn mid_gray_contrast() {
        // #767676 is the lightest gray passing AA on white.
        let gray = Rgb::from_hex("#767676").unwrap();
        let white = Rgb::from_hex("#ffffff").unwrap();
        let ratio = contrast_ratio(gray, white);
        assert!(ratio > 4.5 && ratio < 4.6, "ratio was {ratio}");
    }

    #[test]
    fn token_normalizes_hex() {
        let token = ColorToken::new("b", "primary-500", "#3366CC", ColorRole::Primary).unwrap();
        assert_eq!(token.hex, "#3366cc");
        assert!(ColorToken::new("b", "bad", "blue", ColorRole::Accent).is_err());
    }
}
