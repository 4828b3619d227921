mod backend;
mod db;
pub mod store;
pub mod sync;
pub mod workflows;

use std::path::Path;
use std::sync::Arc;

use tokenforge_api::ai::{AiError, AnyProvider};
use tokenforge_api::backend::{BackendError, RestClient};
use tokenforge_api::github::{CommitInfo, GitHubClient, GitHubError};
use tokenforge_core::config::{AppConfig, BackendKind, GitHubConfig};
use tokenforge_core::error::TokenforgeError;
use tokenforge_core::export::{ExportFormat, TokenDocument};
use tokenforge_core::models::{AiAnalysis, Font, Platform, TypeStyle};

pub use backend::Backend;
pub use db::DbHandle;
pub use store::{Store, StoreState, Stores};
pub use sync::SyncSummary;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Core(#[from] TokenforgeError),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("AI error: {0}")]
    Ai(#[from] AiError),
    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),
    #[error("config error: {0}")]
    Config(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid: {0}")]
    Invalid(String),
}

/// File, path and commit message for publishing a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPlan {
    pub path: String,
    pub content: String,
    pub message: String,
}

impl PublishPlan {
    pub fn new(
        doc: &TokenDocument,
        config: &GitHubConfig,
        message: Option<&str>,
    ) -> Result<Self, RuntimeError> {
        Ok(Self {
            path: config.path_for(&doc.brand.slug()),
            content: doc.render(ExportFormat::Json)?,
            message: message
                .map(str::to_string)
                .unwrap_or_else(|| format!("Update {} design tokens", doc.brand.name)),
        })
    }
}

/// Application state shared by every command.
pub struct Runtime {
    config: AppConfig,
    backend: Arc<Backend>,
    stores: Stores<Backend>,
}

impl Runtime {
    pub fn new(config: AppConfig) -> Result<Self, RuntimeError> {
        let backend = Arc::new(Self::open_backend(&config)?);
        tracing::debug!(backend = %backend.describe(), "runtime ready");
        Ok(Self {
            stores: Stores::new(Arc::clone(&backend)),
            backend,
            config,
        })
    }

    /// Runtime over an explicit backend (used by tests and embedding).
    pub fn with_backend(config: AppConfig, backend: Backend) -> Self {
        let backend = Arc::new(backend);
        Self {
            stores: Stores::new(Arc::clone(&backend)),
            backend,
            config,
        }
    }

    fn open_backend(config: &AppConfig) -> Result<Backend, RuntimeError> {
        match config.backend.kind {
            BackendKind::Local => Ok(Backend::Local(Self::open_local()?)),
            BackendKind::Remote => Ok(Backend::Remote(Self::remote_client(config)?)),
        }
    }

    fn open_local() -> Result<DbHandle, RuntimeError> {
        let path = AppConfig::ensure_db_path()?;
        Ok(DbHandle::open(&path)?)
    }

    fn remote_client(config: &AppConfig) -> Result<RestClient, RuntimeError> {
        if config.backend.url.is_empty() {
            return Err(RuntimeError::Config("backend.url is not set".into()));
        }
        let key = config
            .backend
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RuntimeError::Config("backend API key is not set".into()))?;
        Ok(RestClient::new(&config.backend.url, key)?)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn stores(&self) -> &Stores<Backend> {
        &self.stores
    }

    /// Export document for a brand, with `rem` values relative to the
    /// configured root font size.
    pub async fn document(&self, brand_id: &str) -> Result<TokenDocument, RuntimeError> {
        let doc = workflows::build_document(&self.stores, brand_id).await?;
        Ok(doc.with_root_px(self.config.general.root_font_size)?)
    }

    pub async fn generate_type_styles(
        &self,
        platform_id: &str,
    ) -> Result<Vec<TypeStyle>, RuntimeError> {
        workflows::generate_type_styles(&self.stores, platform_id).await
    }

    pub async fn delete_brand(&self, brand_id: &str) -> Result<usize, RuntimeError> {
        workflows::delete_brand(&self.stores, brand_id).await
    }

    /// Review a platform with the named (or default) AI provider.
    pub async fn analyze(
        &self,
        platform_id: &str,
        provider: Option<&str>,
    ) -> Result<AiAnalysis, RuntimeError> {
        let provider = AnyProvider::from_config(&self.config.ai, provider)?;
        workflows::analyze_platform(&self.stores, &provider, platform_id).await
    }

    pub async fn apply_recommendation(
        &self,
        analysis_id: &str,
        index: usize,
    ) -> Result<Platform, RuntimeError> {
        workflows::apply_recommendation(&self.stores, analysis_id, index).await
    }

    /// Export a brand as design-token JSON and commit it to GitHub.
    pub async fn publish(
        &self,
        brand_id: &str,
        message: Option<&str>,
    ) -> Result<CommitInfo, RuntimeError> {
        let github = GitHubClient::from_config(&self.config.github)?;
        let doc = self.document(brand_id).await?;
        let plan = PublishPlan::new(&doc, &self.config.github, message)?;
        let commit = github
            .put_file(&plan.path, &self.config.github.branch, &plan.content, &plan.message)
            .await?;
        Ok(commit)
    }

    /// Copy a brand from the hosted backend into the local snapshot.
    pub async fn pull(&self, brand_id: &str) -> Result<SyncSummary, RuntimeError> {
        let remote = Self::remote_client(&self.config)?;
        let local = self.local_handle()?;
        sync::pull_brand(&remote, &local, brand_id).await
    }

    /// Upsert a brand from the local snapshot into the hosted backend.
    pub async fn push(&self, brand_id: &str) -> Result<SyncSummary, RuntimeError> {
        let remote = Self::remote_client(&self.config)?;
        let local = self.local_handle()?;
        sync::push_brand(&local, &remote, brand_id).await
    }

    fn local_handle(&self) -> Result<DbHandle, RuntimeError> {
        match self.backend.as_ref() {
            Backend::Local(db) => Ok(db.clone()),
            Backend::Remote(_) => Self::open_local(),
        }
    }

    /// Upload a font file to object storage and record its URL on the font.
    pub async fn upload_font(&self, font_id: &str, file: &Path) -> Result<Font, RuntimeError> {
        let client = match self.backend.as_ref() {
            Backend::Remote(c) => c,
            Backend::Local(_) => {
                return Err(RuntimeError::Config(
                    "font upload requires backend.kind = \"remote\"".into(),
                ))
            }
        };
        let mut font = self
            .stores
            .fonts
            .find(font_id)
            .await?
            .ok_or_else(|| RuntimeError::NotFound(format!("font {font_id}")))?;

        let content_type = font_content_type(file).ok_or_else(|| {
            RuntimeError::Invalid(format!("{} is not a font file", file.display()))
        })?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RuntimeError::Invalid(format!("bad file name: {}", file.display())))?;
        let bytes = tokio::fs::read(file)
            .await
            .map_err(TokenforgeError::from)?;

        let object = format!("{}/{file_name}", font.brand_id);
        let url = client
            .upload_object(&self.config.backend.bucket, &object, bytes, content_type)
            .await?;
        font.file_url = Some(url);
        font.touch();
        self.stores.fonts.update(font).await
    }
}

/// MIME type for a font file, by extension.
pub fn font_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "woff2" => Some("font/woff2"),
        "woff" => Some("font/woff"),
        "ttf" => Some("font/ttf"),
        "otf" => Some("font/otf"),
        _ => None,
    }
}
