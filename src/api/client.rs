use std::time::Duration;

use futures::StreamExt;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use super::types::{Article, NewsItem, NewsList, NewsQuery};
use super::NewsApi;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Errors from talking to the news service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Body was not the expected JSON shape
    #[error("Invalid response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Returns true if this error is transient and the request should be retried.
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout | ApiError::Network(_) => true,
            ApiError::HttpStatus(status) => *status >= 500 || *status == 429,
            ApiError::Parse(_) | ApiError::ResponseTooLarge(_) | ApiError::InvalidBaseUrl(_) => {
                false
            }
        }
    }
}

/// [`NewsApi`] over HTTP.
///
/// Every request is bounded by a timeout so a stalled connection surfaces
/// as [`ApiError::Timeout`] instead of leaving callers waiting forever.
/// Transient failures (timeouts, network errors, 5xx, 429) are retried with
/// exponential backoff.
#[derive(Debug, Clone)]
pub struct HttpNewsApi {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl HttpNewsApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        match base.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ApiError::InvalidBaseUrl(format!(
                    "unsupported scheme '{}'",
                    scheme
                )))
            }
        }
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        })
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry transient failures up to `max_retries` times, sleeping
    /// `backoff`, `2 * backoff`, `4 * backoff`, ... between attempts.
    pub fn retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/news[/{id}]`
    fn news_url(&self, id: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("news");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let mut retry_count = 0;

        loop {
            match self.fetch_once(&url).await {
                Ok(bytes) => return Ok(serde_json::from_slice(&bytes)?),
                Err(e) if e.is_retryable() && retry_count < self.max_retries => {
                    let delay = self.backoff.saturating_mul(2u32.saturating_pow(retry_count));
                    tracing::warn!(
                        url = %url,
                        error = %e,
                        retry = retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying news request after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<Vec<u8>, ApiError> {
        tracing::debug!(url = %url, "GET");
        let response = tokio::time::timeout(self.timeout, self.client.get(url.clone()).send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        tokio::time::timeout(self.timeout, read_limited_bytes(response, MAX_RESPONSE_SIZE))
            .await
            .map_err(|_| ApiError::Timeout)?
    }
}

impl NewsApi for HttpNewsApi {
    async fn list(&self, query: &NewsQuery) -> Result<Vec<Article>, ApiError> {
        let mut url = self.news_url(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.pairs() {
                pairs.append_pair(key, &value);
            }
        }
        let body: NewsList = self.fetch_json(url).await?;
        Ok(body.news)
    }

    async fn get(&self, id: &str) -> Result<Option<Article>, ApiError> {
        let body: NewsItem = self.fetch_json(self.news_url(Some(id))).await?;
        Ok(body.news)
    }
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
