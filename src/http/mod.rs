//! HTTP client module
//!
//! Provides the rate-limited fetcher the pagination strategies pull pages from.
//!
//! # Features
//!
//! - **Automatic Retries**: Exponential backoff on timeouts, connection errors, 429 and 5xx
//! - **Rate Limiting**: Token bucket pacing using governor
//! - **Quota Throttle**: Pauses when `X-RateLimit-Remaining` runs low
//! - **Authentication**: API key as Basic auth or inline URI credential

mod client;
mod rate_limit;

pub use client::{
    CredentialPlacement, Credentials, Fetch, HttpClient, HttpClientConfig,
    HttpClientConfigBuilder, DEFAULT_BASE_URL,
};
pub use rate_limit::{
    QuotaSnapshot, QuotaThrottle, RateLimiter, RateLimiterConfig, LIMIT_HEADER, REMAINING_HEADER,
};

#[cfg(test)]
mod tests;
