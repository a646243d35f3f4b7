//! HTTP fetching of discovery and JWKS documents

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};

use super::CertificateError;
use crate::config::SigningKeysConfig;

/// Errors raised while refreshing signing keys
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Endpoint returned a non-success status
    #[error("{url} returned status {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Response size limit exceeded
    #[error("Response from {0} exceeds the size limit")]
    ResponseTooLarge(String),

    /// Response is not the expected JSON document
    #[error("Invalid JSON response from {url}: {reason}")]
    InvalidJson {
        /// Requested URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// A key entry lacks a required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// URL is malformed or does not use HTTPS
    #[error("Refusing to fetch {0}: HTTPS is required (HTTP is only allowed for loopback hosts)")]
    InsecureUrl(String),

    /// A published certificate could not be decoded
    #[error("Invalid signing certificate: {0}")]
    Certificate(#[from] CertificateError),
}

/// HTTP GET capability used by the signing key cache
///
/// Implementations return the raw response body of a successful request.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Fetch `url` and return the response body
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`HttpFetcher`] backed by `reqwest`
///
/// Enforces HTTPS (except for loopback hosts), a request timeout, a response
/// size limit, and does not follow redirects.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    max_response_size: usize,
}

impl ReqwestFetcher {
    /// Create a fetcher from the cache configuration
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be created
    pub fn new(config: &SigningKeysConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_response_size: config.max_response_size,
        })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        ensure_secure_url(url)?;
        debug!(url = %url, "Fetching document");

        let response = self.client.get(url).send().await.map_err(|e| {
            error!(url = %url, error = %e, "Request failed");
            FetchError::Http(format!("Request to {url} failed: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        if let Some(content_length) = response.content_length()
            && content_length > self.max_response_size as u64
        {
            return Err(FetchError::ResponseTooLarge(url.to_string()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Http(format!("Failed to read response from {url}: {e}")))?;

        if body.len() > self.max_response_size {
            return Err(FetchError::ResponseTooLarge(url.to_string()));
        }

        Ok(body.to_vec())
    }
}

/// Require `https`, or `http` to a loopback host
///
/// # Errors
///
/// Returns [`FetchError::InsecureUrl`] for unparseable or non-HTTPS URLs
pub fn ensure_secure_url(url: &str) -> Result<(), FetchError> {
    let parsed = url::Url::parse(url).map_err(|_| FetchError::InsecureUrl(url.to_string()))?;

    let loopback = match parsed.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
        Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    };

    match parsed.scheme() {
        "https" => Ok(()),
        "http" if loopback => Ok(()),
        _ => Err(FetchError::InsecureUrl(url.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_creation() {
        let fetcher = ReqwestFetcher::new(&SigningKeysConfig::default());
        assert!(fetcher.is_ok());
    }

    #[test]
    fn test_https_urls_allowed() {
        assert!(ensure_secure_url("https://oauth2.sky.blackbaud.com/.well-known/openid-configuration").is_ok());
    }

    #[test]
    fn test_http_only_allowed_for_loopback() {
        assert!(ensure_secure_url("http://localhost:8080/jwks").is_ok());
        assert!(ensure_secure_url("http://127.0.0.1:51234/jwks").is_ok());
        assert!(ensure_secure_url("http://[::1]/jwks").is_ok());

        assert!(matches!(
            ensure_secure_url("http://idp.example.com/jwks"),
            Err(FetchError::InsecureUrl(_))
        ));
        assert!(matches!(
            ensure_secure_url("ftp://localhost/jwks"),
            Err(FetchError::InsecureUrl(_))
        ));
        assert!(matches!(
            ensure_secure_url("not a url"),
            Err(FetchError::InsecureUrl(_))
        ));
    }
}
