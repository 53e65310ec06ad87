//! HTTP client with retry, quota throttling and rate limiting
//!
//! Provides the fetch layer used by every pagination strategy:
//! - Automatic retries with configurable backoff
//! - Token bucket limiting to the API's documented request rate
//! - Pausing when the quota reported by the API runs low
//! - Error classification for retry decisions

use super::rate_limit::{QuotaThrottle, RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::types::{BackoffType, JsonValue, QueryParams};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Onfleet API root
pub const DEFAULT_BASE_URL: &str = "https://onfleet.com/api/v2/";

/// Source of JSON pages for the pagination layer
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET `path` relative to the API root and return the parsed body
    async fn fetch(&self, path: &str, query: &QueryParams) -> Result<JsonValue>;

    /// Quota pauses taken so far
    fn throttle_pauses(&self) -> u64 {
        0
    }
}

/// Where the API key travels on each request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialPlacement {
    /// `Authorization: Basic` header with the key as username
    #[default]
    BasicHeader,
    /// `https://<key>:@host/...` userinfo in the request URI
    InlineUri,
}

/// API key credentials
#[derive(Clone)]
pub struct Credentials {
    /// Onfleet API key
    pub api_key: String,
    /// How the key is attached
    pub placement: CredentialPlacement,
}

impl Credentials {
    /// Basic auth with an empty password
    pub fn basic(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            placement: CredentialPlacement::BasicHeader,
        }
    }

    /// Key embedded in the request URI
    pub fn inline(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            placement: CredentialPlacement::InlineUri,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("placement", &self.placement)
            .finish()
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Pause when remaining quota falls below this percentage
    pub quota_limit: Option<f64>,
    /// Length of the quota pause
    pub quota_pause: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimiterConfig::default()),
            quota_limit: None,
            quota_pause: Duration::from_secs(2),
            user_agent: format!("tap-onfleet/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Pause for `pause` whenever the remaining quota drops below `percent`
    pub fn quota(mut self, percent: f64, pause: Duration) -> Self {
        self.config.quota_limit = Some(percent);
        self.config.quota_pause = pause;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client with retry, quota throttling and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    credentials: Option<Credentials>,
    rate_limiter: Option<RateLimiter>,
    throttle: Option<QuotaThrottle>,
    requests: AtomicU64,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);
        let throttle = config
            .quota_limit
            .map(|percent| QuotaThrottle::new(percent, config.quota_pause));

        Ok(Self {
            client,
            config,
            credentials: None,
            rate_limiter,
            throttle,
            requests: AtomicU64::new(0),
        })
    }

    /// Create a client authenticating with the given credentials
    pub fn with_credentials(config: HttpClientConfig, credentials: Credentials) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.credentials = Some(credentials);
        Ok(client)
    }

    /// Client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Number of quota pauses taken so far
    pub fn throttle_count(&self) -> u64 {
        self.throttle.as_ref().map_or(0, QuotaThrottle::pauses)
    }

    /// Number of successful requests so far
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Make a GET request and return the body, retrying transient failures
    ///
    /// The body is read inside the retry loop so a connection dropped while
    /// it streams is retried like any other transport error.
    pub async fn get_text(&self, path: &str, query: &QueryParams) -> Result<String> {
        let full_url = self.build_url(path)?;
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            // Wait for rate limiter
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let err = match self.attempt(&full_url, query).await {
                Ok(text) => return Ok(text),
                Err(e) => e,
            };

            if !err.is_retryable() || attempt >= max_retries {
                return Err(err);
            }

            let delay = match &err {
                Error::RateLimited {
                    retry_after_seconds,
                } => Duration::from_secs(*retry_after_seconds),
                _ => self.calculate_backoff(attempt),
            };
            warn!(
                "{err}, attempt {}/{}, retrying in {:?}",
                attempt + 1,
                max_retries + 1,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// One request, from send to the last byte of the body
    async fn attempt(&self, url: &Url, query: &QueryParams) -> Result<String> {
        let mut req = self.client.get(url.clone());
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(Credentials {
            api_key,
            placement: CredentialPlacement::BasicHeader,
        }) = &self.credentials
        {
            req = req.basic_auth(api_key, Some(""));
        }

        info!("GET request to {}", redact(url));

        let response = req.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited {
                retry_after_seconds: extract_retry_after(&response),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        if let Some(ref throttle) = self.throttle {
            throttle.observe(response.headers()).await;
        }
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        self.requests.fetch_add(1, Ordering::Relaxed);
        debug!("Request succeeded: GET {}", redact(url));
        Ok(text)
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else {
            Error::Http(e)
        }
    }

    /// Make a GET request and parse the JSON body
    pub async fn get_json(&self, path: &str, query: &QueryParams) -> Result<JsonValue> {
        let text = self.get_text(path, query).await?;
        serde_json::from_str(&text).map_err(|e| Error::decode(path, e.to_string()))
    }

    /// Build full URL from path
    pub(crate) fn build_url(&self, path: &str) -> Result<Url> {
        let joined = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            let base = self.config.base_url.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        };

        let mut url = Url::parse(&joined)?;
        if let Some(Credentials {
            api_key,
            placement: CredentialPlacement::InlineUri,
        }) = &self.credentials
        {
            url.set_username(api_key)
                .map_err(|()| Error::config("API key cannot be embedded in the base URL"))?;
        }
        Ok(url)
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff.saturating_mul(attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn fetch(&self, path: &str, query: &QueryParams) -> Result<JsonValue> {
        self.get_json(path, query).await
    }

    fn throttle_pauses(&self) -> u64 {
        self.throttle_count()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// URL without userinfo, safe for logs
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    if !shown.username().is_empty() {
        let _ = shown.set_username("");
        let _ = shown.set_password(None);
    }
    shown.to_string()
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(1)
}
