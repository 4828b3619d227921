//! Multi-store operations: style generation, export, AI review and
//! recommendation handling.

use tokenforge_api::ai::prompt::{parse_analysis, typography_prompt, SYSTEM_PROMPT};
use tokenforge_api::traits::{AiProvider, DataService};
use tokenforge_core::export::TokenDocument;
use tokenforge_core::models::{AiAnalysis, Filter, Platform, Recommendation, TypeStyle};

use crate::store::Stores;
use crate::RuntimeError;

async fn require_platform<S>(stores: &Stores<S>, platform_id: &str) -> Result<Platform, RuntimeError>
where
    S: DataService,
    RuntimeError: From<S::Error>,
{
    stores
        .platforms
        .find(platform_id)
        .await?
        .ok_or_else(|| RuntimeError::NotFound(format!("platform {platform_id}")))
}

/// Create the default style set for a platform, skipping names that
/// already exist. Returns the styles created.
pub async fn generate_type_styles<S>(
    stores: &Stores<S>,
    platform_id: &str,
) -> Result<Vec<TypeStyle>, RuntimeError>
where
    S: DataService,
    RuntimeError: From<S::Error>,
{
    let platform = require_platform(stores, platform_id).await?;
    // Fail before writing anything if the scale itself is invalid.
    platform.generate_scale()?;

    let existing = stores
        .typography
        .fetch(&Filter::eq("platform_id", &platform.id))
        .await?;

    let mut created = Vec::new();
    for style in TypeStyle::defaults_for(
        &platform.id,
        platform.scale.steps_up,
        platform.scale.steps_down,
    ) {
        if existing.iter().any(|s| s.name == style.name) {
            continue;
        }
        created.push(stores.typography.create(style).await?);
    }
    tracing::info!(platform = %platform.name, count = created.len(), "generated type styles");
    Ok(created)
}

/// Load a brand and assemble its export document.
pub async fn build_document<S>(stores: &Stores<S>, brand_id: &str) -> Result<TokenDocument, RuntimeError>
where
    S: DataService,
    RuntimeError: From<S::Error>,
{
    stores.load_brand(brand_id).await?;
    let brand = stores
        .brands
        .get(brand_id)
        .await
        .ok_or_else(|| RuntimeError::NotFound(format!("brand {brand_id}")))?;

    Ok(TokenDocument::build(
        brand,
        stores.platforms.items().await,
        stores.typography.items().await,
        stores.colors.items().await,
        stores.fonts.items().await,
    )?)
}

/// Ask a provider to review a platform's typography and store the result.
pub async fn analyze_platform<S, P>(
    stores: &Stores<S>,
    provider: &P,
    platform_id: &str,
) -> Result<AiAnalysis, RuntimeError>
where
    S: DataService,
    P: AiProvider,
    RuntimeError: From<S::Error> + From<P::Error>,
{
    let platform = require_platform(stores, platform_id).await?;
    let scale = platform.generate_scale()?;
    let styles = stores
        .typography
        .fetch(&Filter::eq("platform_id", &platform.id))
        .await?;

    let prompt = typography_prompt(&platform, &scale, &styles);
    tracing::info!(provider = provider.name(), platform = %platform.name, "requesting analysis");
    let reply = provider.complete(SYSTEM_PROMPT, &prompt).await?;
    let parsed = parse_analysis(&reply);

    let analysis = AiAnalysis::new(
        platform.brand_id.clone(),
        Some(platform.id.clone()),
        provider.name(),
        parsed.summary,
        parsed.recommendations,
    );
    Ok(stores.analyses.create(analysis).await?)
}

/// Apply the ratio / base size suggested by one recommendation to the
/// analysed platform. Returns the updated platform.
pub async fn apply_recommendation<S>(
    stores: &Stores<S>,
    analysis_id: &str,
    index: usize,
) -> Result<Platform, RuntimeError>
where
    S: DataService,
    RuntimeError: From<S::Error>,
{
    let analysis = stores
        .analyses
        .find(analysis_id)
        .await?
        .ok_or_else(|| RuntimeError::NotFound(format!("analysis {analysis_id}")))?;
    let rec = analysis.recommendations.get(index).ok_or_else(|| {
        RuntimeError::NotFound(format!("recommendation {index} of analysis {analysis_id}"))
    })?;
    let platform_id = analysis
        .platform_id
        .as_deref()
        .ok_or_else(|| RuntimeError::NotFound("analysis is not tied to a platform".into()))?;

    let mut platform = require_platform(stores, platform_id).await?;
    if !apply_to(&mut platform, rec) {
        return Err(RuntimeError::Invalid(format!(
            "recommendation '{}' carries no numeric suggestion",
            rec.title
        )));
    }
    // Reject suggestions that would break the scale.
    platform.generate_scale()?;
    platform.touch();
    Ok(stores.platforms.update(platform).await?)
}

/// Delete a brand and every row that belongs to it, children first.
pub async fn delete_brand<S>(stores: &Stores<S>, brand_id: &str) -> Result<usize, RuntimeError>
where
    S: DataService,
    RuntimeError: From<S::Error>,
{
    stores.load_brand(brand_id).await?;
    if stores.brands.get(brand_id).await.is_none() {
        return Err(RuntimeError::NotFound(format!("brand {brand_id}")));
    }

    let mut removed = 0;
    for row in stores.typography.items().await {
        stores.typography.delete(&row.id).await?;
        removed += 1;
    }
    for row in stores.platforms.items().await {
        stores.platforms.delete(&row.id).await?;
        removed += 1;
    }
    for row in stores.colors.items().await {
        stores.colors.delete(&row.id).await?;
        removed += 1;
    }
    for row in stores.fonts.items().await {
        stores.fonts.delete(&row.id).await?;
        removed += 1;
    }
    for row in stores.analyses.items().await {
        stores.analyses.delete(&row.id).await?;
        removed += 1;
    }
    stores.brands.delete(brand_id).await?;
    tracing::info!(brand = brand_id, children = removed, "deleted brand");
    Ok(removed + 1)
}

fn apply_to(platform: &mut Platform, rec: &Recommendation) -> bool {
    let mut changed = false;
    if let Some(ratio) = rec.suggested_ratio {
        platform.scale.ratio = ratio;
        changed = true;
    }
    if let Some(base) = rec.suggested_base_size {
        platform.scale.base_size = base;
        changed = true;
    }
    changed
}
