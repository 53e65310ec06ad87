//! Rate limiting implementation
//!
//! Two layers protect the Onfleet quota (20 requests/second per organization,
//! see <http://docs.onfleet.com/docs/throttling>):
//! - a governor token bucket that paces requests before they are sent
//! - a quota throttle that pauses after a response reports a low remaining allowance

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use reqwest::header::HeaderMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the calls left in the current window
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Header carrying the size of the current window
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";

/// Configuration for rate limiting
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second
    pub requests_per_second: u32,
    /// Burst size (max tokens in bucket)
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 20,
            burst_size: 20,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: &RateLimiterConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: Arc::new(Governor::direct(quota)),
        }
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a permit, returning immediately
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}

/// Quota reported by one response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaSnapshot {
    /// Calls left in the window
    pub remaining: f64,
    /// Window size
    pub limit: f64,
}

impl QuotaSnapshot {
    /// Create a snapshot
    pub fn new(remaining: f64, limit: f64) -> Self {
        Self { remaining, limit }
    }

    /// Read the quota headers, `None` if either is missing or unusable
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<f64>().ok())
        };
        let snapshot = Self::new(read(REMAINING_HEADER)?, read(LIMIT_HEADER)?);
        (snapshot.limit > 0.0).then_some(snapshot)
    }

    /// Remaining allowance as a percentage of the window
    pub fn percent_remaining(&self) -> f64 {
        self.remaining / self.limit * 100.0
    }

    /// True when the remaining allowance is strictly below `threshold_percent`
    pub fn is_below(&self, threshold_percent: f64) -> bool {
        self.percent_remaining() < threshold_percent
    }
}

/// Pauses the caller when the reported quota runs low
#[derive(Debug)]
pub struct QuotaThrottle {
    threshold_percent: f64,
    pause: Duration,
    pauses: AtomicU64,
}

impl QuotaThrottle {
    /// Create a throttle pausing for `pause` below `threshold_percent`
    pub fn new(threshold_percent: f64, pause: Duration) -> Self {
        Self {
            threshold_percent,
            pause,
            pauses: AtomicU64::new(0),
        }
    }

    /// Decide whether a response's quota requires a pause
    pub fn should_pause(&self, snapshot: &QuotaSnapshot) -> bool {
        snapshot.is_below(self.threshold_percent)
    }

    /// Inspect response headers and sleep if the quota is low
    ///
    /// Returns whether a pause was taken.
    pub async fn observe(&self, headers: &HeaderMap) -> bool {
        let Some(snapshot) = QuotaSnapshot::from_headers(headers) else {
            debug!("No usable rate limit headers, skipping quota check");
            return false;
        };

        if !self.should_pause(&snapshot) {
            return false;
        }

        warn!(
            "Quota at {:.1}% ({}/{}), below {}%, pausing for {:?}",
            snapshot.percent_remaining(),
            snapshot.remaining,
            snapshot.limit,
            self.threshold_percent,
            self.pause
        );
        self.pauses.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.pause).await;
        true
    }

    /// Number of pauses taken
    pub fn pauses(&self) -> u64 {
        self.pauses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use test_case::test_case;

    fn headers(remaining: &str, limit: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REMAINING_HEADER, HeaderValue::from_str(remaining).unwrap());
        headers.insert(LIMIT_HEADER, HeaderValue::from_str(limit).unwrap());
        headers
    }

    #[test]
    fn test_rate_limiter_config_default() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.requests_per_second, 20);
        assert_eq!(config.burst_size, 20);
    }

    #[tokio::test]
    async fn test_rate_limiter_allows_burst() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(10, 5));

        for _ in 0..5 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_rate_limiter_zero_config_falls_back_to_one() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(0, 0));
        limiter.wait().await;
    }

    #[test_case(5.0, 100.0, 10.0, true ; "five percent below ten")]
    #[test_case(50.0, 100.0, 10.0, false ; "fifty percent above ten")]
    #[test_case(10.0, 100.0, 10.0, false ; "equal is not below")]
    #[test_case(0.0, 20.0, 1.0, true ; "exhausted")]
    fn test_quota_threshold(remaining: f64, limit: f64, quota: f64, expected: bool) {
        let throttle = QuotaThrottle::new(quota, Duration::ZERO);
        let snapshot = QuotaSnapshot::new(remaining, limit);
        assert_eq!(throttle.should_pause(&snapshot), expected);
    }

    #[test]
    fn test_snapshot_from_headers() {
        let snapshot = QuotaSnapshot::from_headers(&headers("5", "100")).unwrap();
        assert_eq!(snapshot, QuotaSnapshot::new(5.0, 100.0));
        assert!((snapshot.percent_remaining() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_requires_usable_headers() {
        assert!(QuotaSnapshot::from_headers(&HeaderMap::new()).is_none());
        assert!(QuotaSnapshot::from_headers(&headers("abc", "100")).is_none());
        assert!(QuotaSnapshot::from_headers(&headers("5", "0")).is_none());
    }

    #[tokio::test]
    async fn test_observe_pauses_when_low() {
        let throttle = QuotaThrottle::new(10.0, Duration::from_millis(20));

        let start = std::time::Instant::now();
        assert!(throttle.observe(&headers("5", "100")).await);
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(throttle.pauses(), 1);

        assert!(!throttle.observe(&headers("50", "100")).await);
        assert!(!throttle.observe(&HeaderMap::new()).await);
        assert_eq!(throttle.pauses(), 1);
    }
}
