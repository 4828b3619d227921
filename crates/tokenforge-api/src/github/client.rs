use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use tokenforge_core::config::GitHubConfig;

use super::error::GitHubError;
use crate::http::ensure_success;

const API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("tokenforge/", env!("CARGO_PKG_VERSION"));

/// Minimal GitHub REST client for committing token files.
pub struct GitHubClient {
    token: String,
    owner: String,
    repo: String,
    http: Client,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub html_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    commit: CommitInfo,
}

impl GitHubClient {
    pub fn new(token: String, owner: String, repo: String) -> Self {
        Self {
            token,
            owner,
            repo,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(GitHubError::NotConfigured("missing token"))?;
        if config.owner.is_empty() || config.repo.is_empty() {
            return Err(GitHubError::NotConfigured("owner and repo are required"));
        }
        Ok(Self::new(token, config.owner.clone(), config.repo.clone()))
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{API_URL}/repos/{}/{}/contents/{}",
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
    }

    /// Blob sha of an existing file, or `None` if it does not exist yet.
    pub async fn file_sha(&self, path: &str, branch: &str) -> Result<Option<String>, GitHubError> {
        let resp = self
            .authed(self.http.get(self.contents_url(path)))
            .query(&[("ref", branch)])
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = ensure_success(resp).await?;
        let body: ContentsResponse = resp
            .json()
            .await
            .map_err(|e| GitHubError::Parse(e.to_string()))?;
        Ok(Some(body.sha))
    }

    /// Create or update a file on a branch in a single commit.
    pub async fn put_file(
        &self,
        path: &str,
        branch: &str,
        content: &str,
        message: &str,
    ) -> Result<CommitInfo, GitHubError> {
        let sha = self.file_sha(path, branch).await?;
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(content),
            branch,
            sha,
        };
        let resp = self
            .authed(self.http.put(self.contents_url(path)))
            .json(&body)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let parsed: PutContentsResponse = resp
            .json()
            .await
            .map_err(|e| GitHubError::Parse(e.to_string()))?;
        tracing::info!(
            owner = %self.owner,
            repo = %self.repo,
            path,
            sha = %parsed.commit.sha,
            "committed file"
        );
        Ok(parsed.commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_url_strips_leading_slash() {
        let client = GitHubClient::new("t".into(), "acme".into(), "tokens".into());
        assert_eq!(
            client.contents_url("/tokens/acme.json"),
            "https://api.github.com/repos/acme/tokens/contents/tokens/acme.json"
        );
    }

    #[test]
    fn from_config_requires_token_and_repo() {
        let mut config = tokenforge_core::config::AppConfig::default().github;
        assert!(matches!(
            GitHubClient::from_config(&config),
            Err(GitHubError::NotConfigured("missing token"))
        ));
        config.token = Some("ghp".into());
        assert!(GitHubClient::from_config(&config).is_err());
        config.owner = "acme".into();
        config.repo = "tokens".into();
        assert!(GitHubClient::from_config(&config).is_ok());
    }

    #[test]
    fn put_body_encodes_content() {
        let body = PutContentsRequest {
            message: "Update tokens",
            content: STANDARD.encode("{}"),
            branch: "main",
            sha: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["content"], "e30=");
        assert!(json.get("sha").is_none());
    }

    #[test]
    fn parses_commit_response() {
        let parsed: PutContentsResponse = serde_json::from_str(
            r#"{"content":{"sha":"blob"},"commit":{"sha":"abc123","html_url":"https://github.com/acme/tokens/commit/abc123"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.commit.sha, "abc123");
    }
}
