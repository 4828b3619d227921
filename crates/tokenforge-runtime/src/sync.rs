//! Moving a brand between the hosted backend and the local snapshot.

use std::collections::BTreeSet;

use tokenforge_api::traits::DataService;
use tokenforge_core::models::{
    AiAnalysis, Brand, ColorToken, Filter, Font, Platform, Record, TypeStyle,
};

use crate::db::DbHandle;
use crate::RuntimeError;

/// Rows copied per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub brands: usize,
    pub platforms: usize,
    pub typography: usize,
    pub colors: usize,
    pub fonts: usize,
    pub analyses: usize,
}

impl SyncSummary {
    pub fn total(&self) -> usize {
        self.brands + self.platforms + self.typography + self.colors + self.fonts + self.analyses
    }
}

impl std::fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} brand, {} platforms, {} styles, {} colors, {} fonts, {} analyses",
            self.brands, self.platforms, self.typography, self.colors, self.fonts, self.analyses
        )
    }
}

/// Replace the local copy of a brand with the remote rows.
pub async fn pull_brand<S>(
    remote: &S,
    local: &DbHandle,
    brand_id: &str,
) -> Result<SyncSummary, RuntimeError>
where
    S: DataService,
    RuntimeError: From<S::Error>,
{
    let by_id = Filter::eq("id", brand_id);
    let by_brand = Filter::eq("brand_id", brand_id);

    let brands: Vec<Brand> = remote.list(&by_id).await?;
    if brands.is_empty() {
        return Err(RuntimeError::NotFound(format!("remote brand {brand_id}")));
    }

    let remote_platforms: Vec<Platform> = remote.list(&by_brand).await?;
    let local_platforms: Vec<Platform> = local.list(&by_brand).await?;
    let platform_ids: BTreeSet<String> = remote_platforms
        .iter()
        .chain(local_platforms.iter())
        .map(|p| p.id.clone())
        .collect();

    let mut summary = SyncSummary {
        brands: local.replace_all(by_id, brands).await?,
        platforms: local.replace_all(by_brand.clone(), remote_platforms).await?,
        ..Default::default()
    };

    for platform_id in &platform_ids {
        let scope = Filter::eq("platform_id", platform_id);
        let styles: Vec<TypeStyle> = remote.list(&scope).await?;
        summary.typography += local.replace_all(scope, styles).await?;
    }

    summary.colors = pull_table::<ColorToken, S>(remote, local, &by_brand).await?;
    summary.fonts = pull_table::<Font, S>(remote, local, &by_brand).await?;
    summary.analyses = pull_table::<AiAnalysis, S>(remote, local, &by_brand).await?;

    tracing::info!(brand = brand_id, %summary, "pulled brand");
    Ok(summary)
}

async fn pull_table<R, S>(remote: &S, local: &DbHandle, scope: &Filter) -> Result<usize, RuntimeError>
where
    R: Record,
    S: DataService,
    RuntimeError: From<S::Error>,
{
    let rows: Vec<R> = remote.list(scope).await?;
    Ok(local.replace_all(scope.clone(), rows).await?)
}

/// Upsert the local copy of a brand into the remote backend. Rows deleted
/// locally are not deleted remotely.
pub async fn push_brand<S>(
    local: &DbHandle,
    remote: &S,
    brand_id: &str,
) -> Result<SyncSummary, RuntimeError>
where
    S: DataService,
    RuntimeError: From<S::Error>,
{
    let by_id = Filter::eq("id", brand_id);
    let by_brand = Filter::eq("brand_id", brand_id);

    let brands: Vec<Brand> = local.list(&by_id).await?;
    if brands.is_empty() {
        return Err(RuntimeError::NotFound(format!("local brand {brand_id}")));
    }
    let platforms: Vec<Platform> = local.list(&by_brand).await?;

    let mut summary = SyncSummary {
        brands: push_rows(remote, &by_id, &brands).await?,
        platforms: push_rows(remote, &by_brand, &platforms).await?,
        ..Default::default()
    };
    for platform in &platforms {
        let scope = Filter::eq("platform_id", &platform.id);
        let styles: Vec<TypeStyle> = local.list(&scope).await?;
        summary.typography += push_rows(remote, &scope, &styles).await?;
    }
    let colors: Vec<ColorToken> = local.list(&by_brand).await?;
    summary.colors = push_rows(remote, &by_brand, &colors).await?;
    let fonts: Vec<Font> = local.list(&by_brand).await?;
    summary.fonts = push_rows(remote, &by_brand, &fonts).await?;
    let analyses: Vec<AiAnalysis> = local.list(&by_brand).await?;
    summary.analyses = push_rows(remote, &by_brand, &analyses).await?;

    tracing::info!(brand = brand_id, %summary, "pushed brand");
    Ok(summary)
}

/// Update rows the remote already has within `scope`, insert the rest.
async fn push_rows<R, S>(remote: &S, scope: &Filter, rows: &[R]) -> Result<usize, RuntimeError>
where
    R: Record,
    S: DataService,
    RuntimeError: From<S::Error>,
{
    let existing: BTreeSet<String> = remote
        .list::<R>(scope)
        .await?
        .iter()
        .map(|r| r.id().to_string())
        .collect();
    for row in rows {
        if existing.contains(row.id()) {
            remote.update(row).await?;
        } else {
            remote.insert(row).await?;
        }
    }
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenforge_core::models::{ColorRole, Unit};

    async fn seed(db: &DbHandle) -> (Brand, Platform) {
        let brand = Brand::new("Acme", None);
        db.insert(&brand).await.unwrap();
        let web = Platform::new(&brand.id, "Web", Unit::Rem);
        db.insert(&web).await.unwrap();
        db.insert(&TypeStyle::new(&web.id, "body", 0)).await.unwrap();
        db.insert(&TypeStyle::new(&web.id, "h1", 3)).await.unwrap();
        db.insert(&ColorToken::new(&brand.id, "ink", "#000", ColorRole::Neutral).unwrap())
            .await
            .unwrap();
        (brand, web)
    }

    #[tokio::test]
    async fn pull_replaces_local_copy() {
        let remote = DbHandle::open_memory().unwrap();
        let local = DbHandle::open_memory().unwrap();
        let (brand, _) = seed(&remote).await;

        // A stale local platform with a style must disappear.
        let stale = Platform::new(&brand.id, "Old", Unit::Px);
        local.insert(&stale).await.unwrap();
        local.insert(&TypeStyle::new(&stale.id, "body", 0)).await.unwrap();

        let summary = pull_brand(&remote, &local, &brand.id).await.unwrap();
        assert_eq!(summary.brands, 1);
        assert_eq!(summary.platforms, 1);
        assert_eq!(summary.typography, 2);
        assert_eq!(summary.colors, 1);
        assert_eq!(summary.total(), 5);

        let platforms: Vec<Platform> = local.list(&Filter::all()).await.unwrap();
        assert_eq!(platforms.len(), 1);
        assert_eq!(platforms[0].name, "Web");
        let styles: Vec<TypeStyle> = local.list(&Filter::all()).await.unwrap();
        assert_eq!(styles.len(), 2);
    }

    #[tokio::test]
    async fn pull_unknown_brand() {
        let remote = DbHandle::open_memory().unwrap();
        let local = DbHandle::open_memory().unwrap();
        assert!(matches!(
            pull_brand(&remote, &local, "missing").await,
            Err(RuntimeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn push_upserts() {
        let local = DbHandle::open_memory().unwrap();
        let remote = DbHandle::open_memory().unwrap();
        let (brand, mut web) = seed(&local).await;

        let first = push_brand(&local, &remote, &brand.id).await.unwrap();
        assert_eq!(first.total(), 5);

        web.name = "Website".into();
        local.update(&web).await.unwrap();
        push_brand(&local, &remote, &brand.id).await.unwrap();

        let remote_platforms: Vec<Platform> = remote.list(&Filter::all()).await.unwrap();
        assert_eq!(remote_platforms.len(), 1);
        assert_eq!(remote_platforms[0].name, "Website");
    }
}
