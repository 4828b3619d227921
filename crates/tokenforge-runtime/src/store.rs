//! Client-side caches over a [`DataService`].
//!
//! Every mutation is applied to the cache before the request is sent and
//! rolled back if the request fails, so callers always see the latest
//! intended state. The lock is never held across an await.

use std::sync::Arc;

use tokio::sync::RwLock;

use tokenforge_api::traits::DataService;
use tokenforge_core::models::{
    AiAnalysis, Brand, ColorToken, Filter, Font, Platform, Record, TypeStyle,
};

/// Snapshot of a store's cache.
#[derive(Debug, Clone)]
pub struct StoreState<R> {
    pub items: Vec<R>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl<R> Default for StoreState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            last_error: None,
        }
    }
}

/// Cache of one record type.
pub struct Store<R: Record, S> {
    service: Arc<S>,
    state: Arc<RwLock<StoreState<R>>>,
}

impl<R: Record, S> Clone for Store<R, S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: Record, S: DataService> Store<R, S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            state: Arc::new(RwLock::new(StoreState::default())),
        }
    }

    pub async fn snapshot(&self) -> StoreState<R> {
        self.state.read().await.clone()
    }

    pub async fn items(&self) -> Vec<R> {
        self.state.read().await.items.clone()
    }

    pub async fn get(&self, id: &str) -> Option<R> {
        self.state
            .read()
            .await
            .items
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    /// Cached row, or fetched by id without touching the cache.
    pub async fn find(&self, id: &str) -> Result<Option<R>, S::Error> {
        if let Some(row) = self.get(id).await {
            return Ok(Some(row));
        }
        let rows = self.service.list::<R>(&Filter::eq("id", id)).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn clear_error(&self) {
        self.state.write().await.last_error = None;
    }

    /// Replace the cache with the rows matching `filter`.
    pub async fn fetch(&self, filter: &Filter) -> Result<Vec<R>, S::Error> {
        self.fetch_any(std::slice::from_ref(filter)).await
    }

    /// Replace the cache with the union of the rows matching each filter.
    pub async fn fetch_any(&self, filters: &[Filter]) -> Result<Vec<R>, S::Error> {
        self.state.write().await.loading = true;

        let mut rows = Vec::new();
        let mut failure = None;
        for filter in filters {
            match self.service.list::<R>(filter).await {
                Ok(batch) => rows.extend(batch),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let mut state = self.state.write().await;
        state.loading = false;
        match failure {
            None => {
                state.items = rows.clone();
                state.last_error = None;
                tracing::debug!(table = R::TABLE, count = rows.len(), "store refreshed");
                Ok(rows)
            }
            Some(e) => {
                state.last_error = Some(e.to_string());
                tracing::warn!(table = R::TABLE, "fetch failed: {e}");
                Err(e)
            }
        }
    }

    /// Insert optimistically; on failure the row is removed again. A row
    /// whose id is already cached is not pushed a second time.
    pub async fn create(&self, row: R) -> Result<R, S::Error> {
        let id = row.id().to_string();
        let pushed = {
            let mut state = self.state.write().await;
            let cached = state.items.iter().any(|r| r.id() == id);
            if !cached {
                state.items.push(row.clone());
            }
            !cached
        };

        let result = self.service.insert(&row).await;
        let mut state = self.state.write().await;
        match result {
            Ok(saved) => {
                if let Some(slot) = state.items.iter_mut().find(|r| r.id() == id) {
                    *slot = saved.clone();
                }
                state.last_error = None;
                Ok(saved)
            }
            Err(e) => {
                if pushed {
                    if let Some(pos) = state.items.iter().rposition(|r| r.id() == id) {
                        state.items.remove(pos);
                    }
                }
                state.last_error = Some(e.to_string());
                tracing::warn!(table = R::TABLE, %id, "create rolled back: {e}");
                Err(e)
            }
        }
    }

    /// Replace optimistically; on failure the previous row is restored.
    pub async fn update(&self, row: R) -> Result<R, S::Error> {
        let id = row.id().to_string();
        let previous = {
            let mut state = self.state.write().await;
            match state.items.iter_mut().find(|r| r.id() == id) {
                Some(slot) => Some(std::mem::replace(slot, row.clone())),
                None => None,
            }
        };

        let result = self.service.update(&row).await;
        let mut state = self.state.write().await;
        match result {
            Ok(saved) => {
                match state.items.iter_mut().find(|r| r.id() == id) {
                    Some(slot) => *slot = saved.clone(),
                    None => state.items.push(saved.clone()),
                }
                state.last_error = None;
                Ok(saved)
            }
            Err(e) => {
                match previous {
                    Some(old) => {
                        if let Some(slot) = state.items.iter_mut().find(|r| r.id() == id) {
                            *slot = old;
                        }
                    }
                    None => state.items.retain(|r| r.id() != id),
                }
                state.last_error = Some(e.to_string());
                tracing::warn!(table = R::TABLE, %id, "update rolled back: {e}");
                Err(e)
            }
        }
    }

    /// Remove optimistically; on failure the row returns to its old position.
    pub async fn delete(&self, id: &str) -> Result<(), S::Error> {
        let removed = {
            let mut state = self.state.write().await;
            state
                .items
                .iter()
                .position(|r| r.id() == id)
                .map(|idx| (idx, state.items.remove(idx)))
        };

        let result = self.service.delete::<R>(id).await;
        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                state.last_error = None;
                Ok(())
            }
            Err(e) => {
                if let Some((idx, row)) = removed {
                    let idx = idx.min(state.items.len());
                    state.items.insert(idx, row);
                }
                state.last_error = Some(e.to_string());
                tracing::warn!(table = R::TABLE, %id, "delete rolled back: {e}");
                Err(e)
            }
        }
    }
}

/// One store per table.
pub struct Stores<S> {
    pub brands: Store<Brand, S>,
    pub platforms: Store<Platform, S>,
    pub typography: Store<TypeStyle, S>,
    pub colors: Store<ColorToken, S>,
    pub fonts: Store<Font, S>,
    pub analyses: Store<AiAnalysis, S>,
}

impl<S: DataService> Stores<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            brands: Store::new(Arc::clone(&service)),
            platforms: Store::new(Arc::clone(&service)),
            typography: Store::new(Arc::clone(&service)),
            colors: Store::new(Arc::clone(&service)),
            fonts: Store::new(Arc::clone(&service)),
            analyses: Store::new(service),
        }
    }

    /// Fetch every row belonging to a brand into the stores.
    pub async fn load_brand(&self, brand_id: &str) -> Result<(), S::Error> {
        let by_brand = Filter::eq("brand_id", brand_id);
        let by_id = Filter::eq("id", brand_id);
        let (_, platforms, _, _, _) = futures::try_join!(
            self.brands.fetch(&by_id),
            self.platforms.fetch(&by_brand),
            self.colors.fetch(&by_brand),
            self.fonts.fetch(&by_brand),
            self.analyses.fetch(&by_brand),
        )?;

        let style_filters: Vec<Filter> = platforms
            .iter()
            .map(|p| Filter::eq("platform_id", &p.id))
            .collect();
        self.typography.fetch_any(&style_filters).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbHandle;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokenforge_core::error::TokenforgeError;
    use tokenforge_core::models::Unit;

    /// Wraps the in-memory snapshot and fails writes on demand.
    struct Flaky {
        inner: DbHandle,
        fail: AtomicBool,
    }

    impl Flaky {
        fn new() -> Self {
            Self {
                inner: DbHandle::open_memory().unwrap(),
                fail: AtomicBool::new(false),
            }
        }

        fn check(&self) -> Result<(), TokenforgeError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(TokenforgeError::Config("backend unavailable".into()))
            } else {
                Ok(())
            }
        }
    }

    impl DataService for Flaky {
        type Error = TokenforgeError;

        async fn list<R: Record>(&self, filter: &Filter) -> Result<Vec<R>, TokenforgeError> {
            self.check()?;
            self.inner.list(filter).await
        }

        async fn insert<R: Record>(&self, record: &R) -> Result<R, TokenforgeError> {
            self.check()?;
            self.inner.insert(record).await
        }

        async fn update<R: Record>(&self, record: &R) -> Result<R, TokenforgeError> {
            self.check()?;
            self.inner.update(record).await
        }

        async fn delete<R: Record>(&self, id: &str) -> Result<(), TokenforgeError> {
            self.check()?;
            self.inner.delete::<R>(id).await
        }
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let service = Arc::new(Flaky::new());
        let store: Store<Brand, _> = Store::new(Arc::clone(&service));
        let brand = store.create(Brand::new("Acme", None)).await.unwrap();
        assert_eq!(store.items().await, vec![brand.clone()]);

        let other: Store<Brand, _> = Store::new(service);
        let fetched = other.fetch(&Filter::all()).await.unwrap();
        assert_eq!(fetched, vec![brand]);
        assert!(!other.snapshot().await.loading);
    }

    #[tokio::test]
    async fn failed_create_rolls_back() {
        let service = Arc::new(Flaky::new());
        let store: Store<Brand, _> = Store::new(Arc::clone(&service));
        service.fail.store(true, Ordering::SeqCst);

        assert!(store.create(Brand::new("Acme", None)).await.is_err());
        let state = store.snapshot().await;
        assert!(state.items.is_empty());
        assert_eq!(
            state.last_error.as_deref(),
            Some("config error: backend unavailable")
        );

        store.clear_error().await;
        assert!(store.snapshot().await.last_error.is_none());
    }

    #[tokio::test]
    async fn duplicate_create_keeps_cached_row() {
        let service = Arc::new(Flaky::new());
        let store: Store<Brand, _> = Store::new(Arc::clone(&service));
        let brand = store.create(Brand::new("Acme", None)).await.unwrap();

        assert!(store.create(brand.clone()).await.is_err());
        assert_eq!(store.items().await, vec![brand]);
        assert!(store.snapshot().await.last_error.is_some());
    }

    #[tokio::test]
    async fn failed_update_restores_previous() {
        let service = Arc::new(Flaky::new());
        let store: Store<Brand, _> = Store::new(Arc::clone(&service));
        let brand = store.create(Brand::new("Acme", None)).await.unwrap();

        let mut renamed = brand.clone();
        renamed.name = "Acme 2".into();
        service.fail.store(true, Ordering::SeqCst);
        assert!(store.update(renamed.clone()).await.is_err());
        assert_eq!(store.get(&brand.id).await.unwrap().name, "Acme");

        service.fail.store(false, Ordering::SeqCst);
        store.update(renamed).await.unwrap();
        assert_eq!(store.get(&brand.id).await.unwrap().name, "Acme 2");
    }

    #[tokio::test]
    async fn failed_delete_restores_position() {
        let service = Arc::new(Flaky::new());
        let store: Store<Brand, _> = Store::new(Arc::clone(&service));
        let a = store.create(Brand::new("A", None)).await.unwrap();
        let b = store.create(Brand::new("B", None)).await.unwrap();
        let c = store.create(Brand::new("C", None)).await.unwrap();

        service.fail.store(true, Ordering::SeqCst);
        assert!(store.delete(&b.id).await.is_err());
        let ids: Vec<String> = store.items().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a.id.clone(), b.id.clone(), c.id.clone()]);

        service.fail.store(false, Ordering::SeqCst);
        store.delete(&b.id).await.unwrap();
        assert_eq!(store.items().await.len(), 2);
        assert!(store.get(&b.id).await.is_none());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_cache() {
        let service = Arc::new(Flaky::new());
        let store: Store<Brand, _> = Store::new(Arc::clone(&service));
        store.create(Brand::new("A", None)).await.unwrap();

        service.fail.store(true, Ordering::SeqCst);
        assert!(store.fetch(&Filter::all()).await.is_err());
        let state = store.snapshot().await;
        assert_eq!(state.items.len(), 1);
        assert!(state.last_error.is_some());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn load_brand_scopes_every_store() {
        let db = Arc::new(DbHandle::open_memory().unwrap());
        let brand = Brand::new("Acme", None);
        let other = Brand::new("Other", None);
        db.insert(&brand).await.unwrap();
        db.insert(&other).await.unwrap();
        let web = Platform::new(&brand.id, "Web", Unit::Rem);
        let ios = Platform::new(&brand.id, "iOS", Unit::Pt);
        let foreign = Platform::new(&other.id, "Web", Unit::Px);
        for p in [&web, &ios, &foreign] {
            db.insert(p).await.unwrap();
        }
        db.insert(&TypeStyle::new(&web.id, "body", 0)).await.unwrap();
        db.insert(&TypeStyle::new(&ios.id, "body", 0)).await.unwrap();
        db.insert(&TypeStyle::new(&foreign.id, "body", 0)).await.unwrap();

        let stores = Stores::new(db);
        stores.load_brand(&brand.id).await.unwrap();
        assert_eq!(stores.brands.items().await, vec![brand]);
        assert_eq!(stores.platforms.items().await.len(), 2);
        assert_eq!(stores.typography.items().await.len(), 2);
        assert!(stores.colors.items().await.is_empty());
    }
}
