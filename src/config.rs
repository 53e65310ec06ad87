//! Tap configuration
//!
//! The JSON document passed with `--config`. Four settings are required, the
//! rest tune the HTTP client and timestamp rendering:
//!
//! ```json
//! {
//!   "start_date": "2023-01-01 00:00:00",
//!   "user_agent": "tap-onfleet <ops@example.com>",
//!   "api_key": "...",
//!   "quota_limit": 10
//! }
//! ```

use crate::error::{Error, Result};
use crate::http::{
    CredentialPlacement, Credentials, HttpClientConfig, RateLimiterConfig, DEFAULT_BASE_URL,
};
use crate::normalize::{parse_datetime, DisplayZone};
use crate::types::{BackoffType, JsonValue};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings that must be present and non-empty
pub const REQUIRED_KEYS: [&str; 4] = ["start_date", "user_agent", "api_key", "quota_limit"];

/// Complete tap configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Lower bound of the first sync of every resource
    pub start_date: String,

    /// `User-Agent` header value
    pub user_agent: String,

    /// Onfleet API key
    pub api_key: String,

    /// Pause when the remaining quota drops below this percentage
    #[serde(deserialize_with = "number_or_string")]
    pub quota_limit: f64,

    /// API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Backoff ceiling
    #[serde(default = "default_max_backoff_seconds")]
    pub max_backoff_seconds: u64,

    /// Per-request timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Length of a quota pause
    #[serde(default = "default_quota_pause_seconds")]
    pub quota_pause_seconds: f64,

    /// Client-side pacing, 0 disables it
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// `local`, `utc` or a fixed offset such as `+02:00`
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Send the key as URI userinfo instead of a Basic header
    #[serde(default)]
    pub credentials_in_uri: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_seconds() -> u64 {
    60
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_quota_pause_seconds() -> f64 {
    2.0
}

fn default_requests_per_second() -> u32 {
    20
}

fn default_timezone() -> String {
    "local".to_string()
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got '{s}'"))),
    }
}

impl TapConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate a config document
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Config is not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Validate a config document already parsed
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let JsonValue::Object(map) = &value else {
            return Err(Error::config("Config must be a JSON object"));
        };

        for key in REQUIRED_KEYS {
            let present = match map.get(key) {
                None | Some(JsonValue::Null) => false,
                Some(JsonValue::String(s)) => !s.trim().is_empty(),
                Some(_) => true,
            };
            if !present {
                return Err(Error::missing_field(key));
            }
        }

        let config: Self = serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and formats
    pub fn validate(&self) -> Result<()> {
        let zone = self.zone()?;
        parse_datetime(&self.start_date, zone)
            .map_err(|e| Error::invalid_value("start_date", e.to_string()))?;

        if !(0.0..=100.0).contains(&self.quota_limit) {
            return Err(Error::invalid_value(
                "quota_limit",
                format!("{} is not a percentage between 0 and 100", self.quota_limit),
            ));
        }
        if !self.quota_pause_seconds.is_finite() || self.quota_pause_seconds < 0.0 {
            return Err(Error::invalid_value(
                "quota_pause_seconds",
                "must be a non-negative number",
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::invalid_value("timeout_seconds", "must be positive"));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;
        Ok(())
    }

    /// Zone used to render and read timestamps
    pub fn zone(&self) -> Result<DisplayZone> {
        self.timezone.parse()
    }

    /// Credentials for the HTTP client
    pub fn credentials(&self) -> Credentials {
        match self.placement() {
            CredentialPlacement::InlineUri => Credentials::inline(&self.api_key),
            CredentialPlacement::BasicHeader => Credentials::basic(&self.api_key),
        }
    }

    fn placement(&self) -> CredentialPlacement {
        if self.credentials_in_uri {
            CredentialPlacement::InlineUri
        } else {
            CredentialPlacement::BasicHeader
        }
    }

    /// HTTP client configuration derived from these settings
    pub fn http_config(&self) -> HttpClientConfig {
        let builder = HttpClientConfig::builder()
            .base_url(&self.base_url)
            .user_agent(&self.user_agent)
            .timeout(Duration::from_secs(self.timeout_seconds))
            .max_retries(self.max_retries)
            .backoff(
                BackoffType::Exponential,
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_secs(self.max_backoff_seconds),
            )
            .quota(
                self.quota_limit,
                Duration::from_secs_f64(self.quota_pause_seconds),
            );

        if self.requests_per_second == 0 {
            builder.no_rate_limit().build()
        } else {
            builder
                .rate_limit(RateLimiterConfig::new(
                    self.requests_per_second,
                    self.requests_per_second,
                ))
                .build()
        }
    }
}

impl std::fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapConfig")
            .field("start_date", &self.start_date)
            .field("user_agent", &self.user_agent)
            .field("api_key", &"<redacted>")
            .field("quota_limit", &self.quota_limit)
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("timezone", &self.timezone)
            .field("credentials_in_uri", &self.credentials_in_uri)
            .finish_non_exhaustive()
    }
}
