//! Content-repository sink backed by a GitHub-style contents API.
//!
//! Each key maps to `repos/{owner}/{repo}/contents/{key}` on `branch`. Writes
//! read the current revision first and send it along, so an existing entry is
//! updated in place instead of rejected.

use std::fmt;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{Sink, SinkError, WriteOutcome, validate_key};
use crate::http_client::{HttpTimeouts, build_client};

/// Public GitHub REST API.
pub const DEFAULT_REPO_API_BASE: &str = "https://api.github.com";

/// Largest payload accepted by a single contents write (100 MiB).
pub const MAX_REMOTE_PAYLOAD_BYTES: usize = 100 * 1024 * 1024;

const REPOSITORY_DESCRIPTION: &str = "Quran Audio Static API";
const ACCEPT_HEADER: &str = "application/vnd.github+json";
const ERROR_BODY_EXCERPT: usize = 200;

/// Connection settings for [`RepoSink`].
#[derive(Clone)]
pub struct RepoSinkConfig {
    /// API base, e.g. [`DEFAULT_REPO_API_BASE`].
    pub api_base: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Target branch.
    pub branch: String,
    /// Access token sent as a bearer credential.
    pub token: String,
}

impl fmt::Debug for RepoSinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoSinkConfig")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Result of [`RepoSink::ensure_repository`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryStatus {
    /// Repository was already there.
    Existing,
    /// Repository was created with an initial commit.
    Created,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    sha: String,
}

enum PutResult {
    Written,
    Conflict,
}

/// Sink writing entries into a remote content repository.
pub struct RepoSink {
    client: Client,
    config: RepoSinkConfig,
    api_base: Url,
}

impl fmt::Debug for RepoSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoSink")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RepoSink {
    /// Creates a sink for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Config`] for an empty owner, repository, branch or
    /// token, or an API base that is not an http(s) URL.
    pub fn new(config: RepoSinkConfig, timeouts: HttpTimeouts) -> Result<Self, SinkError> {
        for (field, value) in [
            ("owner", &config.owner),
            ("repository", &config.repo),
            ("branch", &config.branch),
            ("token", &config.token),
        ] {
            if value.trim().is_empty() {
                return Err(SinkError::Config(format!("{field} must not be empty")));
            }
        }

        let api_base = Url::parse(config.api_base.trim_end_matches('/'))
            .map_err(|e| SinkError::Config(format!("invalid API base '{}': {e}", config.api_base)))?;
        if !matches!(api_base.scheme(), "http" | "https") || api_base.cannot_be_a_base() {
            return Err(SinkError::Config(format!(
                "invalid API base '{}': expected an http(s) URL",
                config.api_base
            )));
        }

        let client = build_client(timeouts)
            .map_err(|e| SinkError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            api_base,
        })
    }

    /// `owner/repo`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.config.owner, self.config.repo)
    }

    /// Makes sure the repository exists, creating a public, initialized one if not.
    ///
    /// # Errors
    ///
    /// Any failure other than "not found" on the lookup, or a failed creation.
    #[instrument(skip(self), fields(repository = %self.full_name()))]
    pub async fn ensure_repository(&self) -> Result<RepositoryStatus, SinkError> {
        let url = self.api_url(&["repos", &self.config.owner, &self.config.repo]);
        let response = self.send(self.client.get(url.clone()), &url).await?;

        match response.status() {
            status if status.is_success() => {
                debug!("repository exists");
                Ok(RepositoryStatus::Existing)
            }
            StatusCode::NOT_FOUND => self.create_repository().await,
            _ => Err(unexpected_status(&url, response).await),
        }
    }

    async fn create_repository(&self) -> Result<RepositoryStatus, SinkError> {
        let url = self.api_url(&["user", "repos"]);
        let body = json!({
            "name": self.config.repo,
            "description": REPOSITORY_DESCRIPTION,
            "private": false,
            "auto_init": true,
        });
        let response = self.send(self.client.post(url.clone()).json(&body), &url).await?;
        if !response.status().is_success() {
            return Err(unexpected_status(&url, response).await);
        }
        info!(repository = %self.full_name(), "created repository");
        Ok(RepositoryStatus::Created)
    }

    /// Current revision of `key` on the branch, `None` when absent.
    async fn current_sha(&self, key: &str) -> Result<Option<String>, SinkError> {
        let url = self.revision_url(key);
        let response = self.send(self.client.get(url.clone()), &url).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| SinkError::request(url.as_str(), e))?;
                let entry: ContentEntry = serde_json::from_slice(&body).map_err(|source| {
                    SinkError::Decode {
                        url: url.to_string(),
                        source,
                    }
                })?;
                Ok(Some(entry.sha))
            }
            _ => Err(unexpected_status(&url, response).await),
        }
    }

    async fn put(&self, key: &str, encoded: &str, sha: Option<&str>) -> Result<PutResult, SinkError> {
        let url = self.contents_url(key);
        let message = if sha.is_some() {
            format!("Update {key}")
        } else {
            format!("Add {key}")
        };
        let mut body = json!({
            "message": message,
            "content": encoded,
            "branch": self.config.branch,
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }

        let response = self.send(self.client.put(url.clone()).json(&body), &url).await?;
        match response.status() {
            status if status.is_success() => Ok(PutResult::Written),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Ok(PutResult::Conflict),
            _ => Err(unexpected_status(&url, response).await),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<Response, SinkError> {
        request
            .bearer_auth(&self.config.token)
            .header(ACCEPT, ACCEPT_HEADER)
            .send()
            .await
            .map_err(|e| SinkError::request(url.as_str(), e))
    }

    fn contents_url(&self, key: &str) -> Url {
        let mut segments = vec![
            "repos",
            self.config.owner.as_str(),
            self.config.repo.as_str(),
            "contents",
        ];
        segments.extend(key.split('/'));
        self.api_url(&segments)
    }

    /// Contents URL of `key` pinned to the configured branch.
    fn revision_url(&self, key: &str) -> Url {
        let mut url = self.contents_url(key);
        url.query_pairs_mut().append_pair("ref", &self.config.branch);
        url
    }

    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl Sink for RepoSink {
    fn describe(&self) -> String {
        format!("{}@{}", self.full_name(), self.config.branch)
    }

    async fn exists(&self, key: &str) -> Result<bool, SinkError> {
        validate_key(key)?;
        Ok(self.current_sha(key).await?.is_some())
    }

    #[instrument(skip(self, content), fields(key = %key, bytes = content.len()))]
    async fn write(&self, key: &str, content: &[u8]) -> Result<WriteOutcome, SinkError> {
        validate_key(key)?;
        if content.len() > MAX_REMOTE_PAYLOAD_BYTES {
            return Err(SinkError::PayloadTooLarge {
                key: key.to_string(),
                size: content.len(),
                limit: MAX_REMOTE_PAYLOAD_BYTES,
            });
        }

        let encoded = STANDARD.encode(content);
        let sha = self.current_sha(key).await?;
        if let PutResult::Written = self.put(key, &encoded, sha.as_deref()).await? {
            return Ok(outcome_for(sha.as_deref()));
        }

        warn!("revision changed during write, re-reading once");
        let fresh = self.current_sha(key).await?;
        match self.put(key, &encoded, fresh.as_deref()).await? {
            PutResult::Written => Ok(outcome_for(fresh.as_deref())),
            PutResult::Conflict => Err(SinkError::Conflict {
                key: key.to_string(),
            }),
        }
    }
}

fn outcome_for(sha: Option<&str>) -> WriteOutcome {
    if sha.is_some() {
        WriteOutcome::Updated
    } else {
        WriteOutcome::Created
    }
}

async fn unexpected_status(url: &Url, response: Response) -> SinkError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
    SinkError::http_status(url.as_str(), status, message)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> RepoSinkConfig {
        RepoSinkConfig {
            api_base: "https://api.example.test/".to_string(),
            owner: "owner".to_string(),
            repo: "mirror".to_string(),
            branch: "main".to_string(),
            token: "secret-token".to_string(),
        }
    }

    #[test]
    fn test_contents_url_encodes_each_segment() {
        let sink = RepoSink::new(config(), HttpTimeouts::default()).unwrap();
        let url = sink.contents_url("reciters/1/verses/juz/30.json");
        assert_eq!(
            url.as_str(),
            "https://api.example.test/repos/owner/mirror/contents/reciters/1/verses/juz/30.json"
        );
    }

    #[test]
    fn test_revision_url_pins_branch() {
        let mut cfg = config();
        cfg.branch = "gh pages".to_string();
        let sink = RepoSink::new(cfg, HttpTimeouts::default()).unwrap();
        let url = sink.revision_url("reciters/reciter_list.json");
        assert_eq!(
            url.as_str(),
            "https://api.example.test/repos/owner/mirror/contents/reciters/reciter_list.json?ref=gh+pages"
        );
        assert!(!sink.contents_url("a.json").as_str().contains('?'));
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let mut cfg = config();
        cfg.token = "  ".to_string();
        let err = RepoSink::new(cfg, HttpTimeouts::default()).unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_non_http_api_base_is_rejected() {
        let mut cfg = config();
        cfg.api_base = "ftp://api.example.test".to_string();
        assert!(matches!(
            RepoSink::new(cfg, HttpTimeouts::default()),
            Err(SinkError::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let sink = RepoSink::new(config(), HttpTimeouts::default()).unwrap();
        let rendered = format!("{sink:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_describe_names_repository_and_branch() {
        let sink = RepoSink::new(config(), HttpTimeouts::default()).unwrap();
        assert_eq!(sink.describe(), "owner/mirror@main");
    }
}
