//! Cryptographic token verification
//!
//! [`TokenVerifier`] is the seam between the validation state machine and
//! the JWT library. It reports a tagged [`VerificationOutcome`] rather than an
//! error so that the mapping onto [`TokenValidationError`] stays a pure
//! function the validator owns.
//!
//! [`TokenValidationError`]: crate::TokenValidationError

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::claims::ClaimsPrincipal;
use crate::config::ValidatorConfig;
use crate::signing_keys::{Certificate, KeyFamily};

const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

const EC_ALGORITHMS: &[Algorithm] = &[Algorithm::ES256, Algorithm::ES384];

/// Key identifiers from an unverified token header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenHeader {
    /// `kid` header parameter
    pub kid: Option<String>,
    /// `x5t` header parameter
    pub x5t: Option<String>,
}

impl TokenHeader {
    /// The identifier used to look up the signing key: `kid`, else `x5t`, else `""`
    pub fn key_id(&self) -> &str {
        self.kid
            .as_deref()
            .or(self.x5t.as_deref())
            .unwrap_or_default()
    }
}

/// Key identifier fields of a JOSE header; other parameters are ignored
#[derive(Deserialize)]
struct RawHeader {
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    x5t: Option<String>,
}

/// The token header could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MalformedHeader(pub String);

/// What verification checks a token against
#[derive(Debug, Clone)]
pub struct VerificationParameters<'a> {
    /// Required `aud` value (the application id, lowercase hyphenated)
    pub expected_audience: String,
    /// Required `iss` value; `None` if the issuer has never been discovered
    pub expected_issuer: Option<String>,
    /// Certificate whose public key must have produced the signature
    pub signing_key: &'a Certificate,
}

/// Result of verifying a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Signature, audience, issuer and lifetime all check out
    Verified(ClaimsPrincipal),
    /// The `aud` claim does not name the expected application
    AudienceMismatch(String),
    /// The token's lifetime has elapsed
    Expired(String),
    /// Signature, issuer, algorithm or other validation check failed
    Invalid(String),
    /// Verification failed for a reason outside the categories above
    Failed(String),
}

/// Token parsing and signature verification capability
pub trait TokenVerifier: Send + Sync {
    /// Read the key identifiers from the token header without verifying it
    ///
    /// # Errors
    ///
    /// Returns [`MalformedHeader`] if the token is not a readable JWT
    fn read_header(&self, token: &str) -> Result<TokenHeader, MalformedHeader>;

    /// Verify the token against `parameters`
    fn verify(&self, token: &str, parameters: &VerificationParameters<'_>) -> VerificationOutcome;
}

/// [`TokenVerifier`] backed by `jsonwebtoken`
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    clock_skew: Duration,
}

impl JwtVerifier {
    /// Create a verifier
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            clock_skew: config.clock_skew,
        }
    }
}

impl Default for JwtVerifier {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl TokenVerifier for JwtVerifier {
    fn read_header(&self, token: &str) -> Result<TokenHeader, MalformedHeader> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, _signature] = segments.as_slice() else {
            return Err(MalformedHeader(format!(
                "expected 3 dot-separated segments, found {}",
                segments.len()
            )));
        };

        let header: RawHeader = decode_segment("header", header)?;
        let _: Map<String, Value> = decode_segment("payload", payload)?;

        Ok(TokenHeader {
            kid: header.kid,
            x5t: header.x5t,
        })
    }

    fn verify(&self, token: &str, parameters: &VerificationParameters<'_>) -> VerificationOutcome {
        let Some(issuer) = parameters.expected_issuer.as_deref() else {
            return VerificationOutcome::Invalid("issuer has not been discovered".to_string());
        };

        // The header already parsed structurally; failing here means an
        // algorithm jsonwebtoken cannot verify, such as `none`
        let header = match decode_header(token) {
            Ok(header) => header,
            Err(e) => {
                return VerificationOutcome::Invalid(format!("unsupported token header: {e}"));
            }
        };

        let certificate = parameters.signing_key;
        let (algorithms, key) = match certificate.key_family() {
            KeyFamily::Rsa => (RSA_ALGORITHMS, DecodingKey::from_rsa_der(certificate.public_key())),
            KeyFamily::Ec => (EC_ALGORITHMS, DecodingKey::from_ec_der(certificate.public_key())),
        };

        if !algorithms.contains(&header.alg) {
            return VerificationOutcome::Invalid(format!(
                "algorithm {:?} cannot be verified with a {:?} signing key",
                header.alg,
                certificate.key_family()
            ));
        }

        let mut validation = Validation::new(header.alg);
        validation.algorithms = algorithms.to_vec();
        validation.leeway = self.clock_skew.as_secs();
        validation.validate_nbf = true;
        validation.set_audience(&[parameters.expected_audience.as_str()]);
        validation.set_issuer(&[issuer]);

        match decode::<Map<String, Value>>(token, &key, &validation) {
            Ok(data) => VerificationOutcome::Verified(ClaimsPrincipal::from_json(&data.claims)),
            Err(e) => {
                debug!(error = %e, "Token verification failed");
                classify(&e)
            }
        }
    }
}

/// Decode one base64url JSON segment of a compact JWT
fn decode_segment<T: DeserializeOwned>(name: &str, segment: &str) -> Result<T, MalformedHeader> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| MalformedHeader(format!("{name} is not base64url: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| MalformedHeader(format!("{name} is not a JSON object: {e}")))
}

/// Sort a `jsonwebtoken` failure into a verification outcome
fn classify(error: &JwtError) -> VerificationOutcome {
    let message = error.to_string();
    match error.kind() {
        ErrorKind::ExpiredSignature => VerificationOutcome::Expired(message),
        ErrorKind::InvalidAudience => VerificationOutcome::AudienceMismatch(message),
        ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => {
            VerificationOutcome::AudienceMismatch(message)
        }
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidIssuer
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::MissingRequiredClaim(_) => VerificationOutcome::Invalid(message),
        _ => VerificationOutcome::Failed(message),
    }
}
