//! Paced, retrying JSON client for the recitation API.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use super::pacing::Pacer;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use super::ApiError;
use crate::http_client::{HttpTimeouts, build_client};

/// Production API base.
pub const DEFAULT_API_BASE: &str = "https://api.quran.com/api/v4";

/// Default delay between successful API calls (500 ms).
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(500);

/// Metadata API client.
///
/// All calls go through one [`Pacer`] and one [`RetryPolicy`], so pacing is
/// global to the client instance. Asset downloads never use this client.
///
/// ```no_run
/// use mirror_core::api::ApiClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(mirror_core::api::DEFAULT_API_BASE)?;
/// let reciters = client.fetch("resources/recitations", &[]).await?;
/// println!("{reciters}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    retry_policy: RetryPolicy,
    pacer: Pacer,
}

impl ApiClient {
    /// Creates a client with default retry policy, pacing and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL, or [`ApiError::ClientBuild`] if the HTTP client fails to build.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_settings(
            base_url,
            RetryPolicy::default(),
            DEFAULT_PACING_DELAY,
            HttpTimeouts::default(),
        )
    }

    /// Creates a client with explicit settings.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::new`].
    pub fn with_settings(
        base_url: &str,
        retry_policy: RetryPolicy,
        pacing_delay: Duration,
        timeouts: HttpTimeouts,
    ) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url).map_err(|_| ApiError::invalid_url(base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::invalid_url(base_url));
        }
        let client = build_client(timeouts).map_err(|source| ApiError::ClientBuild { source })?;
        debug!(
            base_url,
            max_attempts = retry_policy.max_attempts(),
            pacing_ms = pacing_delay.as_millis(),
            "creating API client"
        );
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_policy,
            pacer: Pacer::new(pacing_delay),
        })
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches `endpoint` with query `params` and returns the JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Exhausted`] once every attempt failed, or the
    /// permanent error (invalid URL, undecodable body) that stopped retrying.
    pub async fn fetch(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        self.fetch_as(endpoint, params).await
    }

    /// Like [`fetch`](Self::fetch) but decodes into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch).
    #[instrument(skip(self, params), fields(endpoint = %endpoint))]
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint_url(endpoint, params)?;
        let mut attempt: u32 = 0;

        loop {
            self.pacer.wait_turn().await;
            match self.send_once(&url).await {
                Ok(body) => {
                    self.pacer.mark_success().await;
                    debug!(attempt, bytes = body.len(), "API call succeeded");
                    return serde_json::from_slice(&body)
                        .map_err(|source| ApiError::decode(url.as_str(), source));
                }
                Err(error) => match self.retry_policy.should_retry(classify_error(&error), attempt) {
                    RetryDecision::Retry {
                        delay,
                        attempt: next_attempt,
                    } => {
                        warn!(
                            url = %url,
                            attempt,
                            delay_ms = delay.as_millis(),
                            error = %error,
                            "API call failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt = next_attempt;
                    }
                    RetryDecision::DoNotRetry { reason } => {
                        warn!(url = %url, attempt, error = %error, reason, "API call failed");
                        return Err(ApiError::exhausted(url.as_str(), attempt + 1, error));
                    }
                },
            }
        }
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|_| ApiError::invalid_url(raw.clone()))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send_once(&self, url: &Url) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| map_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::http_status(url.as_str(), status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(url, e))?;
        Ok(body.to_vec())
    }
}

fn map_transport_error(url: &Url, error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::timeout(url.as_str())
    } else {
        ApiError::network(url.as_str(), error)
    }
}
