use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, Record};
use crate::error::TokenforgeError;
use crate::scale::{self, DistanceInputs, ScaleMethod, ScaleSettings, ScaleStep};

/// Output unit for a platform's sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Px,
    Rem,
    Pt,
    Dp,
    Sp,
}

impl Unit {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Rem => "rem",
            Self::Pt => "pt",
            Self::Dp => "dp",
            Self::Sp => "sp",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "px" => Some(Self::Px),
            "rem" => Some(Self::Rem),
            "pt" => Some(Self::Pt),
            "dp" => Some(Self::Dp),
            "sp" => Some(Self::Sp),
            _ => None,
        }
    }

    /// Convert a pixel size into this unit against the default 16px root.
    /// `dp` and `sp` are taken at the 160 dpi baseline where they equal CSS
    /// pixels.
    pub fn from_px(&self, px: f64) -> f64 {
        self.from_px_at(px, scale::DEFAULT_ROOT_PX)
    }

    /// Convert a pixel size into this unit; `root_px` only affects `rem`.
    pub fn from_px_at(&self, px: f64, root_px: f64) -> f64 {
        match self {
            Self::Px | Self::Dp | Self::Sp => px,
            Self::Rem => scale::px_to_rem(px, root_px),
            Self::Pt => scale::px_to_pt(px),
        }
    }

    /// Pixel size rendered in this unit, e.g. `1.5rem`.
    pub fn format(&self, px: f64) -> String {
        self.format_at(px, scale::DEFAULT_ROOT_PX)
    }

    pub fn format_at(&self, px: f64, root_px: f64) -> String {
        let decimals = if *self == Self::Rem { 4 } else { 2 };
        format!(
            "{}{}",
            scale::round_to(self.from_px_at(px, root_px), decimals),
            self.as_db_str()
        )
    }
}

impl std::str::FromStr for Unit {
    type Err = TokenforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(&s.to_ascii_lowercase())
            .ok_or_else(|| TokenforgeError::Validation(format!("unknown unit: {s}")))
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// A delivery target (web, iOS, Android, signage...) with its own scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: String,
    pub brand_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub units: Unit,
    pub scale: ScaleSettings,
    /// Viewing conditions, required when `scale.method` is `distance`.
    #[serde(default)]
    pub distance: Option<DistanceInputs>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Platform {
    pub fn new(brand_id: impl Into<String>, name: impl Into<String>, units: Unit) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            brand_id: brand_id.into(),
            name: name.into(),
            description: None,
            units,
            scale: ScaleSettings::default(),
            distance: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Effective scale settings: for distance-based platforms the base size
    /// is replaced by the one derived from the viewing conditions.
    pub fn effective_scale(&self) -> Result<ScaleSettings, TokenforgeError> {
        let mut settings = self.scale.clone();
        if settings.method == ScaleMethod::Distance {
            let inputs = self.distance.as_ref().ok_or_else(|| {
                TokenforgeError::Validation(format!(
                    "platform '{}' uses distance sizing but has no viewing conditions",
                    self.name
                ))
            })?;
            inputs.validate()?;
            settings.base_size = f64::from(scale::distance_base_size(inputs));
        }
        Ok(settings)
    }

    /// Generate this platform's full scale, in pixels.
    pub fn generate_scale(&self) -> Result<Vec<ScaleStep>, TokenforgeError> {
        scale::generate_scale(&self.effective_scale()?)
    }

    /// Pixel size of a single step. Fails when the step resolves to a
    /// non-positive size, which linear scales do below their range.
    pub fn size_at(&self, step: i32) -> Result<f64, TokenforgeError> {
        scale::checked_size_at(&self.effective_scale()?, step)
    }
}

impl Record for Platform {
    const TABLE: &'static str = "platforms";

    fn id(&self) -> &str {
        &self.id
    }
}
