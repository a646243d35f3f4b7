//! Signing key cache with lazy, time-based refresh
//!
//! The cache discovers the identity provider's signing certificates with a
//! two-step protocol:
//!
//! 1. Fetch the OpenID Connect discovery document and read `issuer` and `jwks_uri`
//! 2. Fetch the JWKS and decode the leaf certificate (`x5c[0]`) of every key
//!
//! Certificates are indexed under both `kid` and `x5t`, since providers key
//! tokens by either header.
//!
//! # Refresh policy
//!
//! - Staleness is measured from the last *attempted* refresh, so a provider
//!   outage cannot cause a retry on every validation
//! - A failed refresh keeps the previous issuer and certificates
//! - There is no background task; refreshes are driven by validators
//! - Concurrent refreshes are not deduplicated; the last successful one wins

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::documents::{JsonWebKeySet, OpenIdConfiguration};
use super::{Certificate, CertificateStore, FetchError, HttpFetcher, ReqwestFetcher};
use crate::config::SigningKeysConfig;

/// Signing key cache capability
///
/// Implemented by [`SigningKeysCache`]; validators depend on this trait so
/// tests can substitute their own cache.
#[async_trait]
pub trait KeyCache: Send + Sync {
    /// Whether the cache has never been refreshed or has gone stale
    fn refresh_needed(&self) -> bool;

    /// Re-run discovery and replace the cached keys
    async fn refresh(&self) -> Result<(), FetchError>;

    /// The current certificate store
    fn certificates(&self) -> Arc<CertificateStore>;

    /// The current issuer
    fn issuer(&self) -> Option<String>;
}

#[derive(Debug, Default)]
struct Snapshot {
    issuer: Option<String>,
    certificates: Arc<CertificateStore>,
}

static DEFAULT_CACHE: OnceCell<Arc<SigningKeysCache>> = OnceCell::new();

/// Cache of the identity provider's signing certificates
///
/// # Example
///
/// ```rust,no_run
/// # use addin_auth::{SigningKeysCache, SigningKeysConfig};
/// # tokio_test::block_on(async {
/// let cache = SigningKeysCache::new(SigningKeysConfig::default())?;
/// assert!(cache.refresh_needed());
///
/// cache.refresh().await?;
/// println!("issuer: {:?}, keys: {}", cache.issuer(), cache.certificates().len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # });
/// ```
pub struct SigningKeysCache {
    fetcher: Arc<dyn HttpFetcher>,
    discovery_url: String,
    refresh_interval: Duration,
    state: RwLock<Snapshot>,
    last_attempted_refresh: Mutex<Option<DateTime<Utc>>>,
}

impl std::fmt::Debug for SigningKeysCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SigningKeysCache")
            .field("discovery_url", &self.discovery_url)
            .field("refresh_interval", &self.refresh_interval)
            .field("issuer", &state.issuer)
            .field("certificates", &state.certificates.len())
            .field("last_attempted_refresh", &*self.last_attempted_refresh.lock())
            .finish()
    }
}

impl SigningKeysCache {
    /// Create an empty cache that fetches over HTTPS with `reqwest`
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be created
    pub fn new(config: SigningKeysConfig) -> Result<Self, FetchError> {
        let fetcher = ReqwestFetcher::new(&config)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Create an empty cache with a custom HTTP capability
    pub fn with_fetcher(config: SigningKeysConfig, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            fetcher,
            discovery_url: config.discovery_url,
            refresh_interval: config.refresh_interval,
            state: RwLock::new(Snapshot::default()),
            last_attempted_refresh: Mutex::new(None),
        }
    }

    /// The process-wide cache shared by [`crate::parse_and_validate`]
    ///
    /// Created on first use with [`SigningKeysConfig::default`]; every call
    /// returns the same instance.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be created
    pub fn shared() -> Result<Arc<Self>, FetchError> {
        DEFAULT_CACHE
            .get_or_try_init(|| Self::new(SigningKeysConfig::default()).map(Arc::new))
            .cloned()
    }

    /// URL of the discovery document
    pub fn discovery_url(&self) -> &str {
        &self.discovery_url
    }

    /// The issuer from the last successful refresh
    pub fn issuer(&self) -> Option<String> {
        self.state.read().issuer.clone()
    }

    /// The certificates from the last successful refresh
    pub fn certificates(&self) -> Arc<CertificateStore> {
        Arc::clone(&self.state.read().certificates)
    }

    /// When a refresh was last attempted, successful or not
    pub fn last_attempted_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_attempted_refresh.lock()
    }

    /// Whether no refresh has been attempted yet, or the last attempt is
    /// older than the refresh interval
    pub fn refresh_needed(&self) -> bool {
        let Some(last) = self.last_attempted_refresh() else {
            return true;
        };
        let threshold = TimeDelta::from_std(self.refresh_interval).unwrap_or(TimeDelta::MAX);
        Utc::now().signed_duration_since(last) > threshold
    }

    /// Run the discovery protocol and replace the cached issuer and certificates
    ///
    /// The attempt time is recorded before any I/O. On failure the previous
    /// issuer and certificates stay in place.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if either document cannot be fetched or parsed,
    /// or a published certificate cannot be decoded
    pub async fn refresh(&self) -> Result<(), FetchError> {
        *self.last_attempted_refresh.lock() = Some(Utc::now());

        match self.fetch_signing_keys().await {
            Ok((issuer, certificates)) => {
                info!(
                    issuer = %issuer,
                    key_count = certificates.len(),
                    "Refreshed signing keys"
                );
                *self.state.write() = Snapshot {
                    issuer: Some(issuer),
                    certificates: Arc::new(certificates),
                };
                Ok(())
            }
            Err(e) => {
                warn!(
                    discovery_url = %self.discovery_url,
                    error = %e,
                    "Signing key refresh failed, keeping previous keys"
                );
                Err(e)
            }
        }
    }

    async fn fetch_signing_keys(&self) -> Result<(String, CertificateStore), FetchError> {
        let body = self.fetcher.get(&self.discovery_url).await?;
        let configuration: OpenIdConfiguration = parse_document(&self.discovery_url, &body)?;
        debug!(
            issuer = %configuration.issuer,
            jwks_uri = %configuration.jwks_uri,
            "Read discovery document"
        );

        let body = self.fetcher.get(&configuration.jwks_uri).await?;
        let jwks: JsonWebKeySet = parse_document(&configuration.jwks_uri, &body)?;

        let certificates = CertificateStore::new();
        for key in &jwks.keys {
            let encoded = key
                .leaf_certificate()
                .ok_or(FetchError::MissingField("x5c"))?;
            let certificate = Arc::new(Certificate::from_base64_der(encoded)?);

            for key_id in key.identifiers() {
                certificates.insert(key_id, Arc::clone(&certificate));
            }
        }

        Ok((configuration.issuer, certificates))
    }

    #[cfg(test)]
    pub(crate) fn set_last_attempted_refresh(&self, at: Option<DateTime<Utc>>) {
        *self.last_attempted_refresh.lock() = at;
    }
}

fn parse_document<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, FetchError> {
    serde_json::from_slice(body).map_err(|e| FetchError::InvalidJson {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl KeyCache for SigningKeysCache {
    fn refresh_needed(&self) -> bool {
        SigningKeysCache::refresh_needed(self)
    }

    async fn refresh(&self) -> Result<(), FetchError> {
        SigningKeysCache::refresh(self).await
    }

    fn certificates(&self) -> Arc<CertificateStore> {
        SigningKeysCache::certificates(self)
    }

    fn issuer(&self) -> Option<String> {
        SigningKeysCache::issuer(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing_keys::certificate::fixtures::TEST_RSA_CERT;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DISCOVERY_URL: &str = "https://idp.example.com/.well-known/openid-configuration";
    const JWKS_URL: &str = "https://idp.example.com/jwks";

    /// Serves canned bodies and counts requests
    #[derive(Default)]
    struct StaticFetcher {
        bodies: Mutex<HashMap<String, Vec<u8>>>,
        requests: AtomicUsize,
    }

    impl StaticFetcher {
        fn serve(&self, url: &str, body: serde_json::Value) {
            self.bodies
                .lock()
                .insert(url.to_string(), body.to_string().into_bytes());
        }

        fn unserve(&self, url: &str) {
            self.bodies.lock().remove(url);
        }
    }

    #[async_trait]
    impl HttpFetcher for StaticFetcher {
        async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .lock()
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 503,
                })
        }
    }

    fn provider(keys: serde_json::Value) -> Arc<StaticFetcher> {
        let fetcher = Arc::new(StaticFetcher::default());
        fetcher.serve(
            DISCOVERY_URL,
            json!({ "issuer": "https://idp.example.com/", "jwks_uri": JWKS_URL }),
        );
        fetcher.serve(JWKS_URL, json!({ "keys": keys }));
        fetcher
    }

    fn cache_with(fetcher: Arc<StaticFetcher>) -> SigningKeysCache {
        SigningKeysCache::with_fetcher(
            SigningKeysConfig::default().with_discovery_url(DISCOVERY_URL),
            fetcher,
        )
    }

    #[test]
    fn test_new_cache_is_empty_and_needs_refresh() {
        let cache = cache_with(provider(json!([])));

        assert!(cache.issuer().is_none());
        assert!(cache.certificates().is_empty());
        assert!(cache.last_attempted_refresh().is_none());
        assert!(cache.refresh_needed());
    }

    #[test]
    fn test_shared_instance_is_reused() {
        let first = SigningKeysCache::shared().unwrap();
        let second = SigningKeysCache::shared().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_refresh_sets_issuer_and_keys() {
        let cache = cache_with(provider(json!([
            { "kid": "key-1", "x5t": "thumb-1", "x5c": [TEST_RSA_CERT] },
            { "x5t": "thumb-2", "x5c": [TEST_RSA_CERT] },
        ])));

        cache.refresh().await.unwrap();

        assert_eq!(cache.issuer().as_deref(), Some("https://idp.example.com/"));
        let store = cache.certificates();
        assert_eq!(store.len(), 3);
        assert!(store.certificate("key-1").is_some());
        assert!(store.certificate("thumb-1").is_some());
        assert!(store.certificate("thumb-2").is_some());
        assert!(!cache.refresh_needed());

        let elapsed = Utc::now() - cache.last_attempted_refresh().unwrap();
        assert!(elapsed < TimeDelta::seconds(2));
    }

    #[tokio::test]
    async fn test_duplicate_identifiers_count_once() {
        let cache = cache_with(provider(json!([
            { "kid": "same", "x5t": "same", "x5c": [TEST_RSA_CERT] },
            { "kid": "same", "x5c": [TEST_RSA_CERT] },
        ])));

        cache.refresh().await.unwrap();

        assert_eq!(cache.certificates().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_after_refresh_interval() {
        let cache = cache_with(provider(json!([])));
        cache.refresh().await.unwrap();
        assert!(!cache.refresh_needed());

        cache.set_last_attempted_refresh(Some(Utc::now() - TimeDelta::minutes(31)));
        assert!(cache.refresh_needed());

        cache.set_last_attempted_refresh(Some(Utc::now() - TimeDelta::minutes(29)));
        assert!(!cache.refresh_needed());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_state_but_records_attempt() {
        let fetcher = provider(json!([{ "kid": "key-1", "x5c": [TEST_RSA_CERT] }]));
        let cache = cache_with(Arc::clone(&fetcher));
        cache.refresh().await.unwrap();
        let before = cache.certificates();

        cache.set_last_attempted_refresh(Some(Utc::now() - TimeDelta::hours(1)));
        fetcher.unserve(JWKS_URL);
        let result = cache.refresh().await;

        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
        assert!(Arc::ptr_eq(&before, &cache.certificates()));
        assert_eq!(cache.issuer().as_deref(), Some("https://idp.example.com/"));
        assert!(!cache.refresh_needed());
    }

    #[tokio::test]
    async fn test_failed_first_refresh_leaves_cache_empty() {
        let fetcher = Arc::new(StaticFetcher::default());
        let cache = cache_with(Arc::clone(&fetcher));

        assert!(cache.refresh().await.is_err());

        assert!(cache.issuer().is_none());
        assert!(cache.certificates().is_empty());
        assert!(cache.last_attempted_refresh().is_some());
        assert_eq!(fetcher.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_certificate_fails_whole_refresh() {
        let cache = cache_with(provider(json!([
            { "kid": "good", "x5c": [TEST_RSA_CERT] },
            { "kid": "bad", "x5c": ["bm90IGEgY2VydA=="] },
        ])));

        let result = cache.refresh().await;

        assert!(matches!(result, Err(FetchError::Certificate(_))));
        assert!(cache.certificates().is_empty());
    }

    #[tokio::test]
    async fn test_empty_certificate_chain_is_rejected() {
        let cache = cache_with(provider(json!([{ "kid": "key-1", "x5c": [] }])));

        let result = cache.refresh().await;

        assert!(matches!(result, Err(FetchError::MissingField("x5c"))));
    }

    #[tokio::test]
    async fn test_missing_certificate_chain_is_rejected() {
        let cache = cache_with(provider(json!([
            { "kid": "good", "x5c": [TEST_RSA_CERT] },
            { "kty": "RSA", "kid": "bare", "n": "AQAB", "e": "AQAB" },
        ])));

        let result = cache.refresh().await;

        assert!(matches!(result, Err(FetchError::MissingField("x5c"))));
        assert!(cache.certificates().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_discovery_document() {
        let fetcher = Arc::new(StaticFetcher::default());
        fetcher.serve(DISCOVERY_URL, json!({ "issuer": "https://idp.example.com/" }));
        let cache = cache_with(fetcher);

        let result = cache.refresh().await;

        assert!(matches!(result, Err(FetchError::InvalidJson { .. })));
    }
}
