//! Error types for user identity token validation
//!
//! Validation failures form a closed taxonomy ([`TokenValidationError`]) that
//! callers can branch on. Contract violations (an empty token, a nil
//! application id) are reported separately as [`Error::InvalidArgument`]:
//! they are programming errors, not trust decisions.

use thiserror::Error;

use crate::signing_keys::FetchError;

/// Result alias used by the public entry points
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by [`crate::parse_and_validate`] and
/// [`crate::UserIdentityToken::validate`]
#[derive(Debug, Error)]
pub enum Error {
    /// The caller violated the API contract (empty token or nil application id)
    #[error("Invalid argument: {0} must not be empty")]
    InvalidArgument(&'static str),

    /// The token was rejected
    #[error(transparent)]
    Validation(#[from] TokenValidationError),

    /// The process-wide signing key cache could not be created
    #[error("Signing key discovery unavailable: {0}")]
    KeyDiscovery(#[from] FetchError),
}

impl Error {
    /// The validation failure kind, if this is a token validation failure
    pub fn validation_kind(&self) -> Option<TokenValidationErrorKind> {
        match self {
            Self::Validation(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Token validation failures
///
/// Every variant carries a human-readable message describing the cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenValidationError {
    /// The token is unreadable, has no resolvable signing key, or lacks
    /// required identity claims
    #[error("Invalid token format: {0}")]
    MalformedToken(String),

    /// The token was issued to a different application
    #[error("Token was not issued to this application: {0}")]
    WrongApplication(String),

    /// The token's validity window has elapsed
    #[error("Token expired: {0}")]
    Expired(String),

    /// The token's signature (or issuer, or other structural check) is invalid
    #[error("Invalid token signature: {0}")]
    InvalidSignature(String),
}

/// Discriminant of [`TokenValidationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenValidationErrorKind {
    /// See [`TokenValidationError::MalformedToken`]
    MalformedToken,
    /// See [`TokenValidationError::WrongApplication`]
    WrongApplication,
    /// See [`TokenValidationError::Expired`]
    Expired,
    /// See [`TokenValidationError::InvalidSignature`]
    InvalidSignature,
}

impl TokenValidationError {
    /// Shorthand for [`TokenValidationError::MalformedToken`]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedToken(message.into())
    }

    /// The failure kind
    pub fn kind(&self) -> TokenValidationErrorKind {
        match self {
            Self::MalformedToken(_) => TokenValidationErrorKind::MalformedToken,
            Self::WrongApplication(_) => TokenValidationErrorKind::WrongApplication,
            Self::Expired(_) => TokenValidationErrorKind::Expired,
            Self::InvalidSignature(_) => TokenValidationErrorKind::InvalidSignature,
        }
    }

    /// The message carried by this failure
    pub fn message(&self) -> &str {
        match self {
            Self::MalformedToken(m)
            | Self::WrongApplication(m)
            | Self::Expired(m)
            | Self::InvalidSignature(m) => m,
        }
    }
}
