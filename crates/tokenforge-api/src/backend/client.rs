use reqwest::{Client, RequestBuilder};
use url::Url;

use tokenforge_core::models::{Filter, Record};

use super::error::BackendError;
use crate::http::ensure_success;
use crate::traits::DataService;

const REST_PATH: &str = "rest/v1";
const STORAGE_PATH: &str = "storage/v1/object";

/// Client for the hosted PostgREST-style backend.
///
/// Tables live under `{url}/rest/v1/{table}`; files under
/// `{url}/storage/v1/object/{bucket}/{path}`.
pub struct RestClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl RestClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, BackendError> {
        // Validate early so a typo fails at startup, not on first request.
        let parsed = Url::parse(base_url)?;
        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{REST_PATH}/{table}", self.base_url)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn rows<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<Vec<T>, BackendError> {
        let resp = ensure_success(resp).await?;
        resp.json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    /// Upload a file to object storage, overwriting any existing object.
    /// Returns the public URL of the object.
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let path = path.trim_start_matches('/');
        let resp = self
            .authed(
                self.http
                    .post(format!("{}/{STORAGE_PATH}/{bucket}/{path}", self.base_url)),
            )
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;
        ensure_success(resp).await?;
        tracing::info!(bucket, path, "uploaded object");
        Ok(self.public_url(bucket, path))
    }

    /// Public URL of an object in a public bucket.
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/{STORAGE_PATH}/public/{bucket}/{}",
            self.base_url,
            path.trim_start_matches('/')
        )
    }
}

/// Query parameters for a filtered select.
pub fn filter_params(filter: &Filter) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(
        filter
            .conditions()
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{value}"))),
    );
    params
}

fn id_param(id: &str) -> [(&'static str, String); 1] {
    [("id", format!("eq.{id}"))]
}

impl DataService for RestClient {
    type Error = BackendError;

    async fn list<R: Record>(&self, filter: &Filter) -> Result<Vec<R>, BackendError> {
        let resp = self
            .authed(self.http.get(self.table_url(R::TABLE)))
            .query(&filter_params(filter))
            .send()
            .await?;
        let rows: Vec<R> = Self::rows(resp).await?;
        tracing::debug!(table = R::TABLE, count = rows.len(), "fetched rows");
        Ok(rows)
    }

    async fn insert<R: Record>(&self, record: &R) -> Result<R, BackendError> {
        let resp = self
            .authed(self.http.post(self.table_url(R::TABLE)))
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;
        Self::rows(resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Parse(format!("insert into {} returned no row", R::TABLE)))
    }

    async fn update<R: Record>(&self, record: &R) -> Result<R, BackendError> {
        let resp = self
            .authed(self.http.patch(self.table_url(R::TABLE)))
            .query(&id_param(record.id()))
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;
        Self::rows(resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("{} row {}", R::TABLE, record.id())))
    }

    async fn delete<R: Record>(&self, id: &str) -> Result<(), BackendError> {
        let resp = self
            .authed(self.http.delete(self.table_url(R::TABLE)))
            .query(&id_param(id))
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let removed: Vec<serde_json::Value> = Self::rows(resp).await?;
        if removed.is_empty() {
            return Err(BackendError::NotFound(format!("{} row {id}", R::TABLE)));
        }
        Ok(())
    }
}
