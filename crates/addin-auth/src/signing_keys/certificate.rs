//! Decoded X.509 signing certificates

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use thiserror::Error;
use x509_parser::parse_x509_certificate;
use x509_parser::public_key::PublicKey;

/// Certificate decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificateError {
    /// The `x5c` entry is not valid base64
    #[error("Invalid base64 certificate: {0}")]
    Base64(String),

    /// The bytes are not a DER-encoded X.509 certificate
    #[error("Invalid X.509 certificate: {0}")]
    Parse(String),

    /// The certificate carries a key type tokens cannot be verified with
    #[error("Unsupported public key type: {0}")]
    UnsupportedKey(String),
}

/// Public key family of a signing certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    /// RSA (RS*/PS* signatures)
    Rsa,
    /// Elliptic curve (ES* signatures)
    Ec,
}

/// A signing certificate published by the identity provider
///
/// Holds the DER encoding along with the fields needed to verify token
/// signatures and to describe the certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    not_before: Option<DateTime<Utc>>,
    not_after: Option<DateTime<Utc>>,
    key_family: KeyFamily,
    /// Contents of the SubjectPublicKeyInfo bit string: a PKCS#1
    /// `RSAPublicKey` for RSA, the uncompressed point for EC
    public_key: Vec<u8>,
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .field("key_family", &self.key_family)
            .finish_non_exhaustive()
    }
}

impl Certificate {
    /// Decode a standard-alphabet base64 DER certificate, as found in a JWK `x5c` array
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError`] if the input is not base64, not an X.509
    /// certificate, or carries neither an RSA nor an EC public key.
    pub fn from_base64_der(encoded: &str) -> Result<Self, CertificateError> {
        let der = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CertificateError::Base64(e.to_string()))?;
        Self::from_der(der)
    }

    /// Decode a DER certificate
    ///
    /// # Errors
    ///
    /// Returns [`CertificateError`] if the bytes are not an X.509 certificate
    /// or carry neither an RSA nor an EC public key.
    pub fn from_der(der: Vec<u8>) -> Result<Self, CertificateError> {
        let (_, parsed) = parse_x509_certificate(&der)
            .map_err(|e| CertificateError::Parse(e.to_string()))?;

        let spki = parsed.public_key();
        let key_family = match spki.parsed() {
            Ok(PublicKey::RSA(_)) => KeyFamily::Rsa,
            Ok(PublicKey::EC(_)) => KeyFamily::Ec,
            Ok(_) => {
                return Err(CertificateError::UnsupportedKey(
                    spki.algorithm.algorithm.to_id_string(),
                ));
            }
            Err(e) => return Err(CertificateError::UnsupportedKey(e.to_string())),
        };
        let public_key = spki.subject_public_key.data.to_vec();

        let validity = parsed.validity();
        let subject = parsed.subject().to_string();
        let not_before = DateTime::from_timestamp(validity.not_before.timestamp(), 0);
        let not_after = DateTime::from_timestamp(validity.not_after.timestamp(), 0);

        Ok(Self {
            der,
            subject,
            not_before,
            not_after,
            key_family,
            public_key,
        })
    }

    /// DER encoding
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Start of the validity window
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }

    /// End of the validity window
    pub fn not_after(&self) -> Option<DateTime<Utc>> {
        self.not_after
    }

    /// Public key family
    pub fn key_family(&self) -> KeyFamily {
        self.key_family
    }

    /// Raw public key bytes (PKCS#1 for RSA, uncompressed point for EC)
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }
}
