//! Rendering a brand's tokens into files other tools consume.
//!
//! - `json`: W3C design-tokens draft (`$type` / `$value`), the file pushed to GitHub.
//! - `css`: custom properties.
//! - `figma`: text and paint style payloads for the Figma plugin, which
//!   copies them verbatim into `figma.createTextStyle()` / `createPaintStyle()`.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::TokenforgeError;
use crate::models::{weight_style_name, Brand, ColorToken, Font, Platform, TypeStyle};
use crate::scale::{self, ScaleStep};

/// Family used for styles without an assigned font.
pub const FALLBACK_FAMILY: &str = "Inter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Css,
    Figma,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json | Self::Figma => "json",
            Self::Css => "css",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = TokenforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "css" => Ok(Self::Css),
            "figma" => Ok(Self::Figma),
            _ => Err(TokenforgeError::Validation(format!("unknown export format: {s}"))),
        }
    }
}

/// A type style with its size resolved against the platform scale.
#[derive(Debug, Clone)]
pub struct ResolvedStyle {
    pub style: TypeStyle,
    pub size_px: f64,
    pub font: Option<Font>,
}

impl ResolvedStyle {
    pub fn family(&self) -> &str {
        self.font
            .as_ref()
            .map(|f| f.family.as_str())
            .unwrap_or(FALLBACK_FAMILY)
    }

    pub fn weight(&self) -> u16 {
        self.font
            .as_ref()
            .map(|f| f.nearest_weight(self.style.font_weight))
            .unwrap_or(self.style.font_weight)
    }
}

#[derive(Debug, Clone)]
pub struct PlatformTokens {
    pub platform: Platform,
    pub scale: Vec<ScaleStep>,
    pub styles: Vec<ResolvedStyle>,
}

/// Everything exported for one brand.
#[derive(Debug, Clone)]
pub struct TokenDocument {
    pub brand: Brand,
    pub platforms: Vec<PlatformTokens>,
    pub colors: Vec<ColorToken>,
    pub fonts: Vec<Font>,
    /// Root font size `rem` values are relative to.
    pub root_px: f64,
}

impl TokenDocument {
    /// Assemble the document. Styles are matched to platforms by
    /// `platform_id` and to fonts by `font_id`; styles of unknown platforms
    /// are dropped. Names that share a token key are rejected.
    pub fn build(
        brand: Brand,
        mut platforms: Vec<Platform>,
        styles: Vec<TypeStyle>,
        mut colors: Vec<ColorToken>,
        mut fonts: Vec<Font>,
    ) -> Result<Self, TokenforgeError> {
        platforms.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        colors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        fonts.sort_by(|a, b| a.family.cmp(&b.family).then_with(|| a.id.cmp(&b.id)));

        unique_keys("platform", platforms.iter().map(|p| p.name.as_str()))?;
        unique_keys("color", colors.iter().map(|c| c.name.as_str()))?;
        unique_keys("font", fonts.iter().map(|f| f.family.as_str()))?;

        let mut out = Vec::with_capacity(platforms.len());
        for platform in platforms {
            let settings = platform.effective_scale()?;
            let steps = scale::generate_scale(&settings)?;
            let mut resolved = Vec::new();
            for s in styles.iter().filter(|s| s.platform_id == platform.id) {
                let size_px = scale::checked_size_at(&settings, s.scale_step).map_err(|e| {
                    TokenforgeError::Validation(format!(
                        "style '{}' on platform '{}': {e}",
                        s.name, platform.name
                    ))
                })?;
                resolved.push(ResolvedStyle {
                    size_px,
                    font: s
                        .font_id
                        .as_ref()
                        .and_then(|id| fonts.iter().find(|f| &f.id == id))
                        .cloned(),
                    style: s.clone(),
                });
            }
            resolved.sort_by(|a, b| {
                a.style
                    .scale_step
                    .cmp(&b.style.scale_step)
                    .then_with(|| a.style.name.cmp(&b.style.name))
                    .then_with(|| a.style.id.cmp(&b.style.id))
            });
            unique_keys(
                &format!("style on platform '{}'", platform.name),
                resolved.iter().map(|r| r.style.name.as_str()),
            )?;
            out.push(PlatformTokens {
                platform,
                scale: steps,
                styles: resolved,
            });
        }

        Ok(Self {
            brand,
            platforms: out,
            colors,
            fonts,
            root_px: scale::DEFAULT_ROOT_PX,
        })
    }

    /// Render `rem` values against a different root font size.
    pub fn with_root_px(mut self, root_px: f64) -> Result<Self, TokenforgeError> {
        if !(root_px.is_finite() && root_px > 0.0) {
            return Err(TokenforgeError::Validation(format!(
                "root font size must be a positive number, got {root_px}"
            )));
        }
        self.root_px = root_px;
        Ok(self)
    }

    pub fn render(&self, format: ExportFormat) -> Result<String, TokenforgeError> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(&self.to_design_tokens())?),
            ExportFormat::Css => Ok(self.to_css()),
            ExportFormat::Figma => Ok(serde_json::to_string_pretty(&self.to_figma())?),
        }
    }

    /// W3C design-tokens tree rooted at the brand slug.
    pub fn to_design_tokens(&self) -> Value {
        let mut color = Map::new();
        for c in &self.colors {
            color.insert(
                c.name.clone(),
                json!({
                    "$type": "color",
                    "$value": c.hex,
                    "$extensions": { "tokenforge.role": c.role.as_db_str() },
                }),
            );
        }

        let mut font = Map::new();
        for f in &self.fonts {
            font.insert(
                slug(&f.family),
                json!({
                    "$type": "fontFamily",
                    "$value": [f.family, f.category.generic_family()],
                }),
            );
        }

        let mut scale_tree = Map::new();
        let mut typography = Map::new();
        for p in &self.platforms {
            let unit = p.platform.units;
            let mut steps = Map::new();
            for s in &p.scale {
                steps.insert(
                    s.step.to_string(),
                    json!({
                        "$type": "dimension",
                        "$value": unit.format_at(s.size, self.root_px),
                    }),
                );
            }
            scale_tree.insert(slug(&p.platform.name), Value::Object(steps));

            let mut styles = Map::new();
            for r in &p.styles {
                styles.insert(
                    r.style.name.clone(),
                    json!({
                        "$type": "typography",
                        "$value": {
                            "fontFamily": r.family(),
                            "fontSize": unit.format_at(r.size_px, self.root_px),
                            "fontWeight": r.weight(),
                            "lineHeight": r.style.line_height,
                            "letterSpacing": format!("{}em", r.style.letter_spacing),
                            "textTransform": r.style.text_transform.as_css(),
                        },
                    }),
                );
            }
            typography.insert(slug(&p.platform.name), Value::Object(styles));
        }

        let mut root = Map::new();
        root.insert(
            self.brand.slug(),
            json!({
                "color": color,
                "font": font,
                "scale": scale_tree,
                "typography": typography,
            }),
        );
        Value::Object(root)
    }

    /// CSS custom properties: one brand-wide `:root` block for colors and
    /// fonts, then one `:root` block per platform.
    pub fn to_css(&self) -> String {
        let prefix = self.brand.slug();
        let mut css = String::new();
        let _ = writeln!(css, "/* {} design tokens */", self.brand.name);

        if !self.colors.is_empty() || !self.fonts.is_empty() {
            css.push_str(":root {\n");
            for c in &self.colors {
                let _ = writeln!(css, "  --{prefix}-color-{}: {};", slug(&c.name), c.hex);
            }
            for f in &self.fonts {
                let _ = writeln!(css, "  --{prefix}-font-{}: {};", slug(&f.family), f.css_stack());
            }
            css.push_str("}\n");
        }

        for p in &self.platforms {
            let unit = p.platform.units;
            let platform = slug(&p.platform.name);
            let _ = writeln!(css, "\n/* {} */", p.platform.name);
            css.push_str(":root {\n");
            for s in &p.scale {
                let _ = writeln!(
                    css,
                    "  --{prefix}-{platform}-scale-{}: {};",
                    step_name(s.step),
                    unit.format_at(s.size, self.root_px)
                );
            }
            for r in &p.styles {
                let name = slug(&r.style.name);
                let var = format!("--{prefix}-{platform}-{name}");
                let size = unit.format_at(r.size_px, self.root_px);
                let _ = writeln!(css, "  {var}-font-size: {size};");
                let _ = writeln!(css, "  {var}-font-weight: {};", r.weight());
                let _ = writeln!(css, "  {var}-line-height: {};", r.style.line_height);
                let _ = writeln!(css, "  {var}-letter-spacing: {}em;", r.style.letter_spacing);
            }
            css.push_str("}\n");
        }
        css
    }

    /// Payload consumed by the Figma plugin.
    pub fn to_figma(&self) -> FigmaPayload {
        let text_styles = self
            .platforms
            .iter()
            .flat_map(|p| {
                p.styles.iter().map(move |r| FigmaTextStyle {
                    name: format!("{}/{}", p.platform.name, r.style.name),
                    font_name: FigmaFontName {
                        family: r.family().to_string(),
                        style: weight_style_name(r.weight()).to_string(),
                    },
                    font_size: scale::round_to(r.size_px, 2),
                    line_height: FigmaMeasure::percent(r.style.line_height * 100.0),
                    letter_spacing: FigmaMeasure::percent(r.style.letter_spacing * 100.0),
                    text_case: r.style.text_transform.as_figma().to_string(),
                })
            })
            .collect();

        let paint_styles = self
            .colors
            .iter()
            .filter_map(|c| {
                let (r, g, b) = c.rgb().ok()?.unit_channels();
                Some(FigmaPaintStyle {
                    name: format!("{}/{}", c.role.as_db_str(), c.name),
                    color: FigmaColor {
                        r: scale::round_to(r, 4),
                        g: scale::round_to(g, 4),
                        b: scale::round_to(b, 4),
                    },
                })
            })
            .collect();

        FigmaPayload {
            brand: self.brand.name.clone(),
            text_styles,
            paint_styles,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaPayload {
    pub brand: String,
    pub text_styles: Vec<FigmaTextStyle>,
    pub paint_styles: Vec<FigmaPaintStyle>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaTextStyle {
    pub name: String,
    pub font_name: FigmaFontName,
    pub font_size: f64,
    pub line_height: FigmaMeasure,
    pub letter_spacing: FigmaMeasure,
    pub text_case: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FigmaFontName {
    pub family: String,
    pub style: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FigmaMeasure {
    pub unit: &'static str,
    pub value: f64,
}

impl FigmaMeasure {
    fn percent(value: f64) -> Self {
        Self {
            unit: "PERCENT",
            value: scale::round_to(value, 2),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FigmaPaintStyle {
    pub name: String,
    pub color: FigmaColor,
}

#[derive(Debug, Clone, Serialize)]
pub struct FigmaColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// `-2` → `n2`, `3` → `3`; CSS identifiers cannot start with `-<digit>`.
fn step_name(step: i32) -> String {
    if step < 0 {
        format!("n{}", -step)
    } else {
        step.to_string()
    }
}

fn slug(s: &str) -> String {
    crate::models::slugify(s)
}

/// Fail when two names map to the same token key.
fn unique_keys<'a>(
    kind: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), TokenforgeError> {
    let mut seen: Vec<(String, &str)> = Vec::new();
    for name in names {
        let key = slug(name);
        if let Some((_, first)) = seen.iter().find(|(k, _)| *k == key) {
            return Err(TokenforgeError::Validation(format!(
                "{kind} names '{first}' and '{name}' both export as '{key}'"
            )));
        }
        seen.push((key, name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorRole, FontCategory, TextTransform, Unit};
    use crate::scale::ScaleMethod;

    fn sample() -> TokenDocument {
        let brand = Brand::new("Acme Co", None);
        let mut web = Platform::new(&brand.id, "Web", Unit::Rem);
        web.scale.steps_up = 2;
        web.scale.steps_down = 1;
        let ios = Platform::new(&brand.id, "iOS", Unit::Pt);

        let font = Font::new(&brand.id, "Source Sans", FontCategory::SansSerif, vec![400, 600])
            .unwrap();

        let mut h1 = TypeStyle::new(&web.id, "h1", 2);
        h1.font_id = Some(font.id.clone());
        h1.font_weight = 700;
        h1.text_transform = TextTransform::Uppercase;
        let body = TypeStyle::new(&web.id, "body", 0);
        let orphan = TypeStyle::new("gone", "lost", 1);

        let colors = vec![
            ColorToken::new(&brand.id, "text", "#000000", ColorRole::Neutral).unwrap(),
            ColorToken::new(&brand.id, "brand", "#ff0000", ColorRole::Primary).unwrap(),
        ];

        TokenDocument::build(brand, vec![web, ios], vec![h1, body, orphan], colors, vec![font])
            .unwrap()
    }

    #[test]
    fn build_orders_and_resolves() {
        let doc = sample();
        let names: Vec<&str> = doc.platforms.iter().map(|p| p.platform.name.as_str()).collect();
        assert_eq!(names, vec!["Web", "iOS"]);

        let web = &doc.platforms[0];
        assert_eq!(web.scale.len(), 4);
        assert_eq!(web.styles.len(), 2);
        assert_eq!(web.styles[0].style.name, "body");
        assert_eq!(web.styles[1].size_px, 25.0);
        assert_eq!(web.styles[1].family(), "Source Sans");
        assert_eq!(web.styles[1].weight(), 600);
        assert_eq!(web.styles[0].family(), FALLBACK_FAMILY);
        assert!(doc.platforms[1].styles.is_empty());
    }

    #[test]
    fn json_uses_design_token_shape() {
        let tokens = sample().to_design_tokens();
        let root = &tokens["acme-co"];
        assert_eq!(root["color"]["brand"]["$value"], "#ff0000");
        assert_eq!(root["color"]["brand"]["$type"], "color");
        assert_eq!(root["scale"]["web"]["-1"]["$value"], "0.8rem");
        assert_eq!(root["scale"]["ios"]["0"]["$value"], "12pt");
        let h1 = &root["typography"]["web"]["h1"]["$value"];
        assert_eq!(h1["fontSize"], "1.5625rem");
        assert_eq!(h1["fontWeight"], 600);
        assert_eq!(h1["textTransform"], "uppercase");
        assert_eq!(root["font"]["source-sans"]["$value"][1], "sans-serif");
    }

    #[test]
    fn css_emits_custom_properties() {
        let css = sample().to_css();
        assert!(css.contains("--acme-co-color-brand: #ff0000;"));
        assert!(css.contains("--acme-co-font-source-sans: \"Source Sans\", sans-serif;"));
        assert!(css.contains("--acme-co-web-scale-n1: 0.8rem;"));
        assert!(css.contains("--acme-co-web-h1-font-size: 1.5625rem;"));
        assert!(css.contains("--acme-co-web-body-line-height: 1.5;"));
        assert_eq!(css.matches(":root {").count(), 3);
    }

    #[test]
    fn figma_payload() {
        let payload = sample().to_figma();
        assert_eq!(payload.text_styles.len(), 2);
        let h1 = &payload.text_styles[1];
        assert_eq!(h1.name, "Web/h1");
        assert_eq!(h1.font_name.style, "SemiBold");
        assert_eq!(h1.font_size, 25.0);
        assert_eq!(h1.line_height.value, 130.0);
        assert_eq!(h1.text_case, "UPPER");

        let red = payload
            .paint_styles
            .iter()
            .find(|p| p.name == "primary/brand")
            .unwrap();
        assert_eq!((red.color.r, red.color.g, red.color.b), (1.0, 0.0, 0.0));

        let rendered = sample().render(ExportFormat::Figma).unwrap();
        assert!(rendered.contains("\"fontName\""));
        assert!(rendered.contains("\"textStyles\""));
    }

    #[test]
    fn root_size_changes_rem_values() {
        let doc = sample().with_root_px(10.0).unwrap();
        let css = doc.to_css();
        assert!(css.contains("--acme-co-web-body-font-size: 1.6rem;"));
        assert!(css.contains("--acme-co-web-h1-font-size: 2.5rem;"));
        // pt output does not depend on the root
        assert!(css.contains("--acme-co-ios-scale-0: 12pt;"));

        let json = doc.to_design_tokens();
        assert_eq!(json["acme-co"]["scale"]["web"]["0"]["$value"], "1.6rem");

        assert!(sample().with_root_px(0.0).is_err());
    }

    #[test]
    fn colliding_names_are_rejected() {
        let brand = Brand::new("Acme", None);
        let platforms = vec![
            Platform::new(&brand.id, "Web", Unit::Rem),
            Platform::new(&brand.id, "web", Unit::Px),
        ];
        assert!(matches!(
            TokenDocument::build(brand.clone(), platforms, vec![], vec![], vec![]),
            Err(TokenforgeError::Validation(_))
        ));

        let colors = vec![
            ColorToken::new(&brand.id, "ink", "#000", ColorRole::Neutral).unwrap(),
            ColorToken::new(&brand.id, "ink", "#111", ColorRole::Neutral).unwrap(),
        ];
        assert!(TokenDocument::build(brand.clone(), vec![], vec![], colors, vec![]).is_err());

        let web = Platform::new(&brand.id, "Web", Unit::Rem);
        let styles = vec![
            TypeStyle::new(&web.id, "Body", 0),
            TypeStyle::new(&web.id, "body", 1),
        ];
        assert!(TokenDocument::build(brand, vec![web], styles, vec![], vec![]).is_err());
    }

    #[test]
    fn style_below_linear_range_is_rejected() {
        let brand = Brand::new("Acme", None);
        let mut web = Platform::new(&brand.id, "Web", Unit::Px);
        web.scale.method = ScaleMethod::Linear;
        web.scale.ratio = 0.25;
        web.scale.steps_down = 2;
        let tiny = TypeStyle::new(&web.id, "tiny", -4);

        let err = TokenDocument::build(brand, vec![web], vec![tiny], vec![], vec![])
            .unwrap_err()
            .to_string();
        assert!(err.contains("tiny"), "{err}");
    }

    #[test]
    fn format_from_str() {
        assert_eq!("CSS".parse::<ExportFormat>().unwrap(), ExportFormat::Css);
        assert!("svg".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Figma.extension(), "json");
    }
}
