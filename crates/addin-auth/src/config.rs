//! Configuration for signing key discovery and token validation

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Well-known OpenID Connect configuration of the SKY API OAuth 2.0 service
pub const DEFAULT_DISCOVERY_URL: &str =
    "https://oauth2.sky.blackbaud.com/.well-known/openid-configuration";

/// Signing key cache configuration
///
/// # Example
///
/// ```rust
/// use addin_auth::SigningKeysConfig;
/// use std::time::Duration;
///
/// let config = SigningKeysConfig::default()
///     .with_discovery_url("https://login.example.com/.well-known/openid-configuration")
///     .with_refresh_interval(Duration::from_secs(600));
///
/// assert_eq!(config.refresh_interval, Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningKeysConfig {
    /// URL of the OpenID Connect discovery document
    pub discovery_url: String,

    /// How long after a refresh attempt the cache is considered stale (default: 30 minutes)
    #[serde(with = "duration_secs")]
    pub refresh_interval: Duration,

    /// Per-request timeout for discovery and JWKS fetches (default: 10 seconds)
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,

    /// Maximum accepted response body size in bytes (default: 64 KiB)
    pub max_response_size: usize,

    /// User agent for HTTP requests
    pub user_agent: String,
}

impl Default for SigningKeysConfig {
    fn default() -> Self {
        Self {
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            refresh_interval: Duration::from_secs(30 * 60),
            request_timeout: Duration::from_secs(10),
            max_response_size: 64 * 1024,
            user_agent: format!("addin-auth/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SigningKeysConfig {
    /// Use a different discovery document
    pub fn with_discovery_url(mut self, url: impl Into<String>) -> Self {
        self.discovery_url = url.into();
        self
    }

    /// Set the staleness threshold
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the maximum response size
    pub fn with_max_response_size(mut self, bytes: usize) -> Self {
        self.max_response_size = bytes;
        self
    }
}

/// Token validator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Clock skew tolerated on `exp`/`nbf` checks (default: 5 minutes)
    #[serde(with = "duration_secs")]
    pub clock_skew: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            clock_skew: Duration::from_secs(300),
        }
    }
}

impl ValidatorConfig {
    /// Set the clock skew tolerance
    pub fn with_clock_skew(mut self, leeway: Duration) -> Self {
        self.clock_skew = leeway;
        self
    }
}

/// Durations are configured as whole seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
