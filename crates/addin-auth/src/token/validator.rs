//! User identity token validation
//!
//! ```text
//!  Start ──▶ Parsed ──▶ KeySelected ──────────────▶ KeyResolved ──▶ Verified
//!                           │                           ▲
//!                           └──▶ refresh (key unknown ──┘
//!                                or cache stale)
//! ```
//!
//! Argument checks run before `Start`. Any state may end in `Failed(kind)`.
//! The only side effects are on the signing key cache: at most one refresh
//! per call, plus an absence marker when a refresh does not produce the
//! token's key.

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::identity::UserIdentity;
use super::verifier::{JwtVerifier, TokenVerifier, VerificationOutcome, VerificationParameters};
use crate::config::ValidatorConfig;
use crate::error::{Error, Result, TokenValidationError};
use crate::signing_keys::{Certificate, KeyCache};

/// Validates user identity tokens against a signing key cache
///
/// # Example
///
/// ```rust,no_run
/// # use addin_auth::{SigningKeysCache, UserIdentityToken};
/// # use uuid::Uuid;
/// # tokio_test::block_on(async {
/// let cache = SigningKeysCache::shared()?;
/// let validator = UserIdentityToken::new(cache);
///
/// let application_id = Uuid::parse_str("2d2a4bd0-62f0-4f66-a8b4-a7b0c8e4e9a1")?;
/// let identity = validator.validate("eyJhbGciOi...", application_id).await?;
/// println!("{} <{}>", identity.given_name, identity.email);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # });
/// ```
#[derive(Clone)]
pub struct UserIdentityToken {
    cache: Arc<dyn KeyCache>,
    verifier: Arc<dyn TokenVerifier>,
}

impl std::fmt::Debug for UserIdentityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserIdentityToken").finish_non_exhaustive()
    }
}

impl UserIdentityToken {
    /// Validator using the default [`JwtVerifier`]
    pub fn new(cache: Arc<dyn KeyCache>) -> Self {
        Self::with_config(cache, ValidatorConfig::default())
    }

    /// Validator using a [`JwtVerifier`] built from `config`
    pub fn with_config(cache: Arc<dyn KeyCache>, config: ValidatorConfig) -> Self {
        Self::with_verifier(cache, Arc::new(JwtVerifier::new(config)))
    }

    /// Validator with a custom verifier
    pub fn with_verifier(cache: Arc<dyn KeyCache>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { cache, verifier }
    }

    /// Validate `token` as issued to `application_id` and return its identity
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `token` is empty or whitespace, or
    ///   `application_id` is nil; the cache is not touched
    /// - [`Error::Validation`] with the reason the token was rejected
    pub async fn validate(&self, token: &str, application_id: Uuid) -> Result<UserIdentity> {
        check_arguments(token, application_id)?;

        let header = self
            .verifier
            .read_header(token)
            .map_err(|e| TokenValidationError::malformed(format!("unreadable token: {e}")))?;
        // Parsed: kid, else x5t, else ""
        let key_id = header.key_id();

        // KeySelected ──▶ KeyResolved
        let signing_key = self.resolve_signing_key(key_id).await?;

        let parameters = VerificationParameters {
            expected_audience: application_id.to_string(),
            expected_issuer: self.cache.issuer(),
            signing_key: &signing_key,
        };
        let identity = identity_from_outcome(self.verifier.verify(token, &parameters))?;

        debug!(
            key_id = %key_id,
            environment_id = %identity.environment_id,
            "Validated user identity token"
        );
        Ok(identity)
    }

    async fn resolve_signing_key(
        &self,
        key_id: &str,
    ) -> std::result::Result<Arc<Certificate>, TokenValidationError> {
        if !self.cache.certificates().contains(key_id) || self.cache.refresh_needed() {
            debug!(key_id = %key_id, "Refreshing signing keys before validation");
            if let Err(e) = self.cache.refresh().await {
                debug!(error = %e, "Continuing with previously cached signing keys");
            }

            let certificates = self.cache.certificates();
            if !certificates.contains(key_id) && certificates.mark_absent(key_id) {
                warn!(key_id = %key_id, "Token signing key is not published by the identity provider");
            }
        }

        self.cache.certificates().certificate(key_id).ok_or_else(|| {
            TokenValidationError::malformed(format!("no signing key found for key id '{key_id}'"))
        })
    }
}

pub(crate) fn check_arguments(token: &str, application_id: Uuid) -> Result<()> {
    if token.trim().is_empty() {
        return Err(Error::InvalidArgument("token"));
    }
    if application_id.is_nil() {
        return Err(Error::InvalidArgument("application_id"));
    }
    Ok(())
}

fn identity_from_outcome(
    outcome: VerificationOutcome,
) -> std::result::Result<UserIdentity, TokenValidationError> {
    match outcome {
        VerificationOutcome::Verified(principal) => UserIdentity::from_principal(&principal),
        VerificationOutcome::AudienceMismatch(m) => Err(TokenValidationError::WrongApplication(m)),
        VerificationOutcome::Expired(m) => Err(TokenValidationError::Expired(m)),
        VerificationOutcome::Invalid(m) => Err(TokenValidationError::InvalidSignature(m)),
        VerificationOutcome::Failed(m) => Err(TokenValidationError::MalformedToken(m)),
    }
}
