//! Signing key discovery and caching
//!
//! ```text
//! ┌──────────────────────────┐   GET discovery URL    ┌───────────────────┐
//! │     SigningKeysCache     │ ─────────────────────▶ │ Identity provider │
//! │  issuer                  │   GET jwks_uri         │                   │
//! │  last_attempted_refresh  │ ─────────────────────▶ │                   │
//! │  CertificateStore ───────┼── kid / x5t → cert     └───────────────────┘
//! └──────────────────────────┘
//! ```
//!
//! - `certificate` - decoded X.509 signing certificates
//! - `store` - the `kid`/`x5t` → certificate map with absence markers
//! - `documents` - discovery and JWKS wire formats
//! - `fetcher` - the HTTP capability and its `reqwest` implementation
//! - `cache` - refresh protocol and staleness policy

mod cache;
mod certificate;
mod documents;
mod fetcher;
mod store;

pub use cache::{KeyCache, SigningKeysCache};
pub use certificate::{Certificate, CertificateError, KeyFamily};
pub use documents::{JsonWebKey, JsonWebKeySet, OpenIdConfiguration};
pub use fetcher::{FetchError, HttpFetcher, ReqwestFetcher, ensure_secure_url};
pub use store::CertificateStore;

#[cfg(test)]
pub(crate) use certificate::fixtures;
