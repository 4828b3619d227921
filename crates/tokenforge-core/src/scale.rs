//! Typographic scale calculator.
//!
//! Three ways of producing font sizes:
//! - **Modular**: every step multiplies the base by a fixed ratio
//!   (`base * ratio^step`).
//! - **Linear**: every step adds a fixed fraction of the base
//!   (`base * (1 + ratio * step)`).
//! - **Distance**: the base size is derived from viewing conditions, then a
//!   modular scale is built on top of it.
//!
//! The three formula functions are pure and infallible. The scale generators
//! validate their inputs and return [`TokenforgeError::Validation`] for
//! anything that would produce a meaningless size.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TokenforgeError;

/// Visual angle subtended by a lowercase letter at the threshold of
/// comfortable reading, in degrees.
pub const VISUAL_ANGLE_DEG: f64 = 0.21;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Points per CSS pixel.
pub const PT_PER_PX: f64 = 0.75;

/// Default root font size used for rem conversion.
pub const DEFAULT_ROOT_PX: f64 = 16.0;

/// Largest number of steps a scale may have on either side of the base.
pub const MAX_STEPS: u32 = 100;

/// How the sizes of a scale are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMethod {
    Modular,
    Linear,
    Distance,
}

impl ScaleMethod {
    pub const ALL: &[ScaleMethod] = &[Self::Modular, Self::Linear, Self::Distance];

    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Modular => "modular",
            Self::Linear => "linear",
            Self::Distance => "distance",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "modular" => Some(Self::Modular),
            "linear" => Some(Self::Linear),
            "distance" => Some(Self::Distance),
            _ => None,
        }
    }
}

impl FromStr for ScaleMethod {
    type Err = TokenforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(&s.to_ascii_lowercase())
            .ok_or_else(|| TokenforgeError::Validation(format!("unknown scale method: {s}")))
    }
}

impl std::fmt::Display for ScaleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Ambient lighting at the viewing position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lighting {
    Good,
    Moderate,
    Poor,
}

impl Lighting {
    pub fn factor(&self) -> f64 {
        match self {
            Self::Good => 1.0,
            Self::Moderate => 1.25,
            Self::Poor => 1.5,
        }
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Poor => "poor",
        }
    }
}

impl FromStr for Lighting {
    type Err = TokenforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "good" => Ok(Self::Good),
            "moderate" => Ok(Self::Moderate),
            "poor" => Ok(Self::Poor),
            _ => Err(TokenforgeError::Validation(format!("unknown lighting: {s}"))),
        }
    }
}

/// Whether text is read as running paragraphs or as isolated labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextType {
    Continuous,
    Isolated,
}

impl TextType {
    pub fn factor(&self) -> f64 {
        match self {
            Self::Continuous => 1.0,
            Self::Isolated => 1.5,
        }
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Isolated => "isolated",
        }
    }
}

impl FromStr for TextType {
    type Err = TokenforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continuous" => Ok(Self::Continuous),
            "isolated" => Ok(Self::Isolated),
            _ => Err(TokenforgeError::Validation(format!("unknown text type: {s}"))),
        }
    }
}

/// Parameters of a scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSettings {
    pub base_size: f64,
    pub ratio: f64,
    pub steps_up: u32,
    pub steps_down: u32,
    pub method: ScaleMethod,
}

impl Default for ScaleSettings {
    fn default() -> Self {
        Self {
            base_size: 16.0,
            ratio: NamedRatio::MajorThird.value(),
            steps_up: 5,
            steps_down: 2,
            method: ScaleMethod::Modular,
        }
    }
}

/// One size of a generated scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleStep {
    pub step: i32,
    pub size: f64,
}

/// Viewing conditions for distance-based sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceInputs {
    /// Eye-to-surface distance in millimetres.
    pub distance_mm: f64,
    /// Decimal visual acuity (1.0 = 20/20).
    pub visual_acuity: f64,
    /// Font-specific multiplier relating glyph height to the em size.
    pub mean_length_ratio: f64,
    pub lighting: Lighting,
    pub text_type: TextType,
    /// Display density in pixels per inch.
    pub ppi: f64,
}

impl Default for DistanceInputs {
    fn default() -> Self {
        Self {
            distance_mm: 500.0,
            visual_acuity: 1.0,
            mean_length_ratio: 1.0,
            lighting: Lighting::Good,
            text_type: TextType::Continuous,
            ppi: 96.0,
        }
    }
}

impl DistanceInputs {
    pub fn validate(&self) -> Result<(), TokenforgeError> {
        positive("distance_mm", self.distance_mm)?;
        positive("visual_acuity", self.visual_acuity)?;
        positive("mean_length_ratio", self.mean_length_ratio)?;
        positive("ppi", self.ppi)
    }
}

/// Classic ratios borrowed from musical intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedRatio {
    MinorSecond,
    MajorSecond,
    MinorThird,
    MajorThird,
    PerfectFourth,
    AugmentedFourth,
    PerfectFifth,
    GoldenRatio,
}

impl NamedRatio {
    pub const ALL: &[NamedRatio] = &[
        Self::MinorSecond,
        Self::MajorSecond,
        Self::MinorThird,
        Self::MajorThird,
        Self::PerfectFourth,
        Self::AugmentedFourth,
        Self::PerfectFifth,
        Self::GoldenRatio,
    ];

    pub fn value(&self) -> f64 {
        match self {
            Self::MinorSecond => 1.067,
            Self::MajorSecond => 1.125,
            Self::MinorThird => 1.2,
            Self::MajorThird => 1.25,
            Self::PerfectFourth => 1.333,
            Self::AugmentedFourth => 1.414,
            Self::PerfectFifth => 1.5,
            Self::GoldenRatio => 1.618,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::MinorSecond => "minor-second",
            Self::MajorSecond => "major-second",
            Self::MinorThird => "minor-third",
            Self::MajorThird => "major-third",
            Self::PerfectFourth => "perfect-fourth",
            Self::AugmentedFourth => "augmented-fourth",
            Self::PerfectFifth => "perfect-fifth",
            Self::GoldenRatio => "golden-ratio",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.slug() == s)
    }
}

impl std::fmt::Display for NamedRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.slug(), self.value())
    }
}

/// Parse a ratio given either as a number (`1.25`) or a named ratio
/// (`major-third`).
pub fn parse_ratio(s: &str) -> Result<f64, TokenforgeError> {
    if let Some(named) = NamedRatio::from_slug(&s.to_ascii_lowercase()) {
        return Ok(named.value());
    }
    let value: f64 = s
        .parse()
        .map_err(|_| TokenforgeError::Validation(format!("invalid ratio: {s}")))?;
    positive("ratio", value)?;
    Ok(value)
}

// ── Formulas ────────────────────────────────────────────────────────

/// `base * ratio^step`
pub fn modular_size(base: f64, ratio: f64, step: i32) -> f64 {
    base * ratio.powi(step)
}

/// `base * (1 + ratio * step)`
pub fn linear_size(base: f64, ratio: f64, step: i32) -> f64 {
    base * (1.0 + ratio * f64::from(step))
}

/// Recommended base size in pixels for the given viewing conditions.
///
/// The minimum legible glyph height is the chord subtended by
/// [`VISUAL_ANGLE_DEG`] at `distance_mm`, scaled by acuity, font metrics,
/// lighting and text type, then converted from millimetres to pixels.
pub fn distance_base_size(inputs: &DistanceInputs) -> u32 {
    let half_angle = VISUAL_ANGLE_DEG.to_radians() / 2.0;
    let height_mm = 2.0 * inputs.distance_mm * half_angle.tan() / inputs.visual_acuity
        * inputs.mean_length_ratio
        * inputs.lighting.factor()
        * inputs.text_type.factor();
    let px = (height_mm * inputs.ppi / MM_PER_INCH).round();
    if px.is_finite() && px > 0.0 {
        px as u32
    } else {
        0
    }
}

// ── Generators ──────────────────────────────────────────────────────

/// Generate every step in `[-steps_down, steps_up]`, ascending.
pub fn generate_scale(settings: &ScaleSettings) -> Result<Vec<ScaleStep>, TokenforgeError> {
    positive("base_size", settings.base_size)?;
    positive("ratio", settings.ratio)?;

    let high = step_bound("steps_up", settings.steps_up)?;
    let low = -step_bound("steps_down", settings.steps_down)?;

    if settings.method == ScaleMethod::Linear {
        let lowest = linear_size(settings.base_size, settings.ratio, low);
        if lowest <= 0.0 {
            return Err(TokenforgeError::Validation(format!(
                "linear scale reaches a non-positive size ({lowest}) at step {low}"
            )));
        }
    }

    let steps = (low..=high)
        .map(|step| ScaleStep {
            step,
            size: size_at(settings, step),
        })
        .collect();
    Ok(steps)
}

/// Derive the base size from viewing conditions, then build a modular scale.
pub fn generate_distance_scale(
    inputs: &DistanceInputs,
    ratio: f64,
    steps_up: u32,
    steps_down: u32,
) -> Result<Vec<ScaleStep>, TokenforgeError> {
    inputs.validate()?;
    let base = distance_base_size(inputs);
    if base == 0 {
        return Err(TokenforgeError::Validation(
            "viewing conditions round to a zero pixel size".into(),
        ));
    }
    generate_scale(&ScaleSettings {
        base_size: f64::from(base),
        ratio,
        steps_up,
        steps_down,
        method: ScaleMethod::Distance,
    })
}

/// Size of a single step under the given settings.
pub fn size_at(settings: &ScaleSettings, step: i32) -> f64 {
    match settings.method {
        ScaleMethod::Modular | ScaleMethod::Distance => {
            modular_size(settings.base_size, settings.ratio, step)
        }
        ScaleMethod::Linear => linear_size(settings.base_size, settings.ratio, step),
    }
}

/// [`size_at`], rejecting steps that resolve to a non-positive size.
pub fn checked_size_at(settings: &ScaleSettings, step: i32) -> Result<f64, TokenforgeError> {
    let size = size_at(settings, step);
    if size.is_finite() && size > 0.0 {
        Ok(size)
    } else {
        Err(TokenforgeError::Validation(format!(
            "step {step} resolves to a non-positive size ({size}px)"
        )))
    }
}

// ── Units ───────────────────────────────────────────────────────────

pub fn px_to_rem(px: f64, root_px: f64) -> f64 {
    px / root_px
}

pub fn px_to_pt(px: f64) -> f64 {
    px * PT_PER_PX
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn step_bound(name: &str, steps: u32) -> Result<i32, TokenforgeError> {
    i32::try_from(steps)
        .ok()
        .filter(|_| steps <= MAX_STEPS)
        .ok_or_else(|| {
            TokenforgeError::Validation(format!("{name} must be at most {MAX_STEPS}, got {steps}"))
        })
}

fn positive(name: &str, value: f64) -> Result<(), TokenforgeError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TokenforgeError::Validation(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn modular_step_three() {
        assert!(close(modular_size(16.0, 1.25, 3), 31.25));
    }

    #[test]
    fn modular_negative_step() {
        assert!(close(modular_size(16.0, 1.25, -2), 10.24));
    }

    #[test]
    fn step_counts_are_bounded() {
        for (up, down) in [(2, 1 << 31), (2, u32::MAX), (3_000_000_000, 2), (MAX_STEPS + 1, 0)] {
            let settings = ScaleSettings {
                steps_up: up,
                steps_down: down,
                ..ScaleSettings::default()
            };
            assert!(
                matches!(generate_scale(&settings), Err(TokenforgeError::Validation(_))),
                "up={up} down={down}"
            );
        }

        let widest = ScaleSettings {
            steps_up: MAX_STEPS,
            steps_down: MAX_STEPS,
            ratio: 1.01,
            ..ScaleSettings::default()
        };
        let steps = generate_scale(&widest).unwrap();
        assert_eq!(steps.len(), 2 * MAX_STEPS as usize + 1);
        assert_eq!(steps[0].step, -(MAX_STEPS as i32));
    }

    #[test]
    fn checked_size_rejects_non_positive() {
        let settings = ScaleSettings {
            ratio: 0.25,
            steps_down: 2,
            method: ScaleMethod::Linear,
            ..ScaleSettings::default()
        };
        assert!(close(checked_size_at(&settings, -2).unwrap(), 8.0));
        assert!(matches!(
            checked_size_at(&settings, -4),
            Err(TokenforgeError::Validation(_))
        ));
        assert!(matches!(
            checked_size_at(&settings, -5),
            Err(TokenforgeError::Validation(_))
        ));
    }

    #[test]
    fn modular_step_zero_is_base() {
        assert!(close(modular_size(18.0, 1.618, 0), 18.0));
    }

    #[test]
    fn linear_steps() {
        assert!(close(linear_size(16.0, 0.25, 3), 28.0));
        assert!(close(linear_size(16.0, 0.25, -2), 8.0));
    }

    #[test]
    fn distance_desktop_reading() {
        assert_eq!(distance_base_size(&DistanceInputs::default()), 7);
    }

    #[test]
    fn distance_signage() {
        let inputs = DistanceInputs {
            distance_mm: 3000.0,
            ..Default::default()
        };
        assert_eq!(distance_base_size(&inputs), 42);
    }

    #[test]
    fn distance_factors_compound() {
        let inputs = DistanceInputs {
            distance_mm: 3000.0,
            visual_acuity: 0.5,
            mean_length_ratio: 1.0,
            lighting: Lighting::Moderate,
            text_type: TextType::Isolated,
            ppi: 160.0,
        };
        assert_eq!(distance_base_size(&inputs), 260);
    }

    #[test]
    fn distance_poor_lighting() {
        let inputs = DistanceInputs {
            distance_mm: 5000.0,
            lighting: Lighting::Poor,
            ppi: 72.0,
            ..Default::default()
        };
        assert_eq!(distance_base_size(&inputs), 78);
    }

    #[test]
    fn distance_mean_length_ratio() {
        let inputs = DistanceInputs {
            distance_mm: 600.0,
            mean_length_ratio: 1.5,
            ..Default::default()
        };
        assert_eq!(distance_base_size(&inputs), 12);
    }

    #[test]
    fn generate_orders_steps_ascending() {
        let settings = ScaleSettings {
            base_size: 16.0,
            ratio: 1.25,
            steps_up: 3,
            steps_down: 2,
            method: ScaleMethod::Modular,
        };
        let scale = generate_scale(&settings).unwrap();
        let steps: Vec<i32> = scale.iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![-2, -1, 0, 1, 2, 3]);
        assert!(close(scale[0].size, 10.24));
        assert!(close(scale[2].size, 16.0));
        assert!(close(scale[5].size, 31.25));
    }

    #[test]
    fn generate_single_step() {
        let settings = ScaleSettings {
            steps_up: 0,
            steps_down: 0,
            ..Default::default()
        };
        let scale = generate_scale(&settings).unwrap();
        assert_eq!(scale.len(), 1);
        assert_eq!(scale[0].step, 0);
        assert!(close(scale[0].size, 16.0));
    }

    #[test]
    fn generate_linear() {
        let settings = ScaleSettings {
            base_size: 16.0,
            ratio: 0.25,
            steps_up: 3,
            steps_down: 2,
            method: ScaleMethod::Linear,
        };
        let sizes: Vec<f64> = generate_scale(&settings)
            .unwrap()
            .iter()
            .map(|s| s.size)
            .collect();
        assert_eq!(sizes, vec![8.0, 12.0, 16.0, 20.0, 24.0, 28.0]);
    }

    #[test]
    fn linear_rejects_non_positive_sizes() {
        let settings = ScaleSettings {
            base_size: 16.0,
            ratio: 0.5,
            steps_up: 1,
            steps_down: 2,
            method: ScaleMethod::Linear,
        };
        assert!(matches!(
            generate_scale(&settings),
            Err(TokenforgeError::Validation(_))
        ));
    }

    #[test]
    fn rejects_bad_base_and_ratio() {
        let zero_base = ScaleSettings {
            base_size: 0.0,
            ..Default::default()
        };
        assert!(generate_scale(&zero_base).is_err());

        let nan_ratio = ScaleSettings {
            ratio: f64::NAN,
            ..Default::default()
        };
        assert!(generate_scale(&nan_ratio).is_err());
    }

    #[test]
    fn distance_scale_uses_derived_base() {
        let inputs = DistanceInputs {
            distance_mm: 3000.0,
            ..Default::default()
        };
        let scale = generate_distance_scale(&inputs, 1.5, 1, 0).unwrap();
        assert!(close(scale[0].size, 42.0));
        assert!(close(scale[1].size, 63.0));
    }

    #[test]
    fn distance_scale_rejects_zero_acuity() {
        let inputs = DistanceInputs {
            visual_acuity: 0.0,
            ..Default::default()
        };
        assert!(generate_distance_scale(&inputs, 1.25, 2, 0).is_err());
    }

    #[test]
    fn parse_named_and_numeric_ratios() {
        assert!(close(parse_ratio("golden-ratio").unwrap(), 1.618));
        assert!(close(parse_ratio("Major-Third").unwrap(), 1.25));
        assert!(close(parse_ratio("1.4").unwrap(), 1.4));
        assert!(parse_ratio("-1").is_err());
        assert!(parse_ratio("fourth").is_err());
    }

    #[test]
    fn unit_conversions() {
        assert!(close(px_to_rem(24.0, DEFAULT_ROOT_PX), 1.5));
        assert!(close(px_to_pt(16.0), 12.0));
        assert!(close(round_to(31.2549, 2), 31.25));
        assert!(close(round_to(10.24, 0), 10.0));
    }

    #[test]
    fn method_from_str() {
        assert_eq!("Linear".parse::<ScaleMethod>().unwrap(), ScaleMethod::Linear);
        assert!("exponential".parse::<ScaleMethod>().is_err());
    }
}
