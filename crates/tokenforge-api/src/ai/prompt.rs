//! Prompt construction and reply parsing for typography reviews.

use std::fmt::Write as _;

use serde::Deserialize;

use tokenforge_core::models::{Platform, Recommendation, TypeStyle};
use tokenforge_core::scale::{self, ScaleStep};

pub const SYSTEM_PROMPT: &str = "You are a senior typographer reviewing a design system's type scale. \
Reply with a single JSON object and nothing else, shaped as \
{\"summary\": string, \"recommendations\": [{\"title\": string, \"detail\": string, \
\"suggested_ratio\": number|null, \"suggested_base_size\": number|null}]}.";

/// Parsed reply of a typography review.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParsedAnalysis {
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

/// Describe a platform, its scale and its styles for review.
pub fn typography_prompt(platform: &Platform, scale: &[ScaleStep], styles: &[TypeStyle]) -> String {
    let settings = &platform.scale;
    let mut out = String::new();
    let _ = writeln!(out, "Platform: {} (units: {})", platform.name, platform.units);
    if let Some(desc) = &platform.description {
        let _ = writeln!(out, "Description: {desc}");
    }
    let _ = writeln!(
        out,
        "Scale: {} method, base {}px, ratio {}, {} steps down, {} steps up",
        settings.method, settings.base_size, settings.ratio, settings.steps_down, settings.steps_up
    );
    if let Some(d) = &platform.distance {
        let _ = writeln!(
            out,
            "Viewing conditions: {}mm, acuity {}, {} lighting, {} text, {} ppi",
            d.distance_mm,
            d.visual_acuity,
            d.lighting.as_db_str(),
            d.text_type.as_db_str(),
            d.ppi
        );
    }

    out.push_str("\nSizes:\n");
    for s in scale {
        let _ = writeln!(out, "- step {}: {}px", s.step, scale::round_to(s.size, 2));
    }

    if !styles.is_empty() {
        out.push_str("\nStyles:\n");
        for st in styles {
            let _ = writeln!(
                out,
                "- {}: step {}, weight {}, line-height {}, letter-spacing {}em",
                st.name, st.scale_step, st.font_weight, st.line_height, st.letter_spacing
            );
        }
    }

    out.push_str(
        "\nAssess hierarchy, legibility and rhythm. Suggest concrete changes to the ratio or base size where warranted.",
    );
    out
}

/// Parse a model reply. The JSON object may be wrapped in prose or a code
/// fence; when no object can be parsed the whole reply becomes the summary.
pub fn parse_analysis(reply: &str) -> ParsedAnalysis {
    if let Some(json) = extract_json_object(reply) {
        match serde_json::from_str::<ParsedAnalysis>(json) {
            Ok(parsed) => return parsed,
            Err(e) => tracing::warn!("AI reply held malformed JSON: {e}"),
        }
    } else {
        tracing::warn!("AI reply contained no JSON object");
    }
    ParsedAnalysis {
        summary: reply.trim().to_string(),
        recommendations: Vec::new(),
    }
}

/// Slice from the first `{` to the last `}`.
fn extract_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    (end > start).then(|| &s[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenforge_core::models::Unit;

    #[test]
    fn parses_fenced_reply() {
        let reply = "Here is my review:\n```json\n{\"summary\": \"Tight scale\", \"recommendations\": [{\"title\": \"Raise ratio\", \"detail\": \"Use 1.333\", \"suggested_ratio\": 1.333}]}\n```\nThanks!";
        let parsed = parse_analysis(reply);
        assert_eq!(parsed.summary, "Tight scale");
        assert_eq!(parsed.recommendations.len(), 1);
        assert_eq!(parsed.recommendations[0].suggested_ratio, Some(1.333));
        assert_eq!(parsed.recommendations[0].suggested_base_size, None);
    }

    #[test]
    fn plain_text_falls_back_to_summary() {
        let parsed = parse_analysis("  Looks balanced overall.  ");
        assert_eq!(parsed.summary, "Looks balanced overall.");
        assert!(parsed.recommendations.is_empty());
    }

    #[test]
    fn malformed_json_falls_back_to_summary() {
        let parsed = parse_analysis("{not json}");
        assert_eq!(parsed.summary, "{not json}");
    }

    #[test]
    fn prompt_lists_sizes_and_styles() {
        let platform = Platform::new("b", "Web", Unit::Rem);
        let scale = platform.generate_scale().unwrap();
        let styles = vec![TypeStyle::new(&platform.id, "body", 0)];
        let prompt = typography_prompt(&platform, &scale, &styles);
        assert!(prompt.contains("Platform: Web (units: rem)"));
        assert!(prompt.contains("modular method, base 16px, ratio 1.25"));
        assert!(prompt.contains("- step 3: 31.25px"));
        assert!(prompt.contains("- body: step 0, weight 400"));
    }
}
