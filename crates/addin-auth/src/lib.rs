//! # Add-in Auth - User Identity Token Validation
//!
//! Validates the user identity tokens that a host application hands to its
//! add-ins, and extracts the identity of the user the token was issued for.
//!
//! A token is accepted only if it is signed by one of the identity provider's
//! currently published certificates, names the expected issuer, is addressed
//! to the calling add-in's application id, and is within its validity window.
//!
//! ## Architecture
//!
//! - [`signing_keys`] - OpenID Connect discovery, JWKS download and the
//!   process-wide signing key cache
//! - [`token`] - Header parsing, signature verification and the validation
//!   state machine
//! - [`config`] - Cache and validator configuration
//! - [`error`] - The validation error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use addin_auth::{TokenValidationErrorKind, parse_and_validate};
//! use uuid::Uuid;
//!
//! # tokio_test::block_on(async {
//! let application_id = Uuid::parse_str("2d2a4bd0-62f0-4f66-a8b4-a7b0c8e4e9a1").unwrap();
//!
//! match parse_and_validate("eyJhbGciOi...", application_id).await {
//!     Ok(user) => println!("Hello {} {}", user.given_name, user.family_name),
//!     Err(e) if e.validation_kind() == Some(TokenValidationErrorKind::Expired) => {
//!         println!("Ask the host for a fresh token");
//!     }
//!     Err(e) => println!("Rejected: {e}"),
//! }
//! # });
//! ```
//!
//! ## Standards
//!
//! - **RFC 7519** - JSON Web Token (JWT)
//! - **RFC 7517** - JSON Web Key (JWK)
//! - **OpenID Connect Discovery 1.0**

// Submodules
pub mod config;
pub mod error;
pub mod signing_keys;
pub mod token;

use uuid::Uuid;

// Re-export configuration types
#[doc(inline)]
pub use config::{DEFAULT_DISCOVERY_URL, SigningKeysConfig, ValidatorConfig};

// Re-export error types
#[doc(inline)]
pub use error::{Error, Result, TokenValidationError, TokenValidationErrorKind};

// Re-export signing key cache
#[doc(inline)]
pub use signing_keys::{Certificate, KeyCache, SigningKeysCache};

// Re-export validation types
#[doc(inline)]
pub use token::{ClaimsPrincipal, JwtVerifier, TokenVerifier, UserIdentity, UserIdentityToken};

/// Validate `token` as issued to `application_id` using the process-wide
/// signing key cache
///
/// The shared cache is created on first use against
/// [`DEFAULT_DISCOVERY_URL`] and is refreshed lazily: when the token names an
/// unknown key, or 30 minutes after the last refresh attempt.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if `token` is empty or whitespace, or
///   `application_id` is nil; no network access happens
/// - [`Error::Validation`] if the token is rejected
/// - [`Error::KeyDiscovery`] if the shared cache's HTTP client cannot be built
pub async fn parse_and_validate(token: &str, application_id: Uuid) -> Result<UserIdentity> {
    token::check_arguments(token, application_id)?;

    let cache = SigningKeysCache::shared()?;
    UserIdentityToken::new(cache)
        .validate(token, application_id)
        .await
}
