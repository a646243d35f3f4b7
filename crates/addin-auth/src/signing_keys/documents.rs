//! Wire formats of the OpenID Connect discovery and JWKS documents
//!
//! Only the fields needed to locate and decode signing certificates are
//! modelled; everything else in the documents is ignored.

use serde::Deserialize;

/// OpenID Connect discovery document (the subset we use)
#[derive(Debug, Clone, Deserialize)]
pub struct OpenIdConfiguration {
    /// Canonical issuer identifier, matched against the token's `iss`
    pub issuer: String,

    /// Location of the JSON Web Key Set
    pub jwks_uri: String,
}

/// JSON Web Key Set
#[derive(Debug, Clone, Deserialize)]
pub struct JsonWebKeySet {
    /// Published keys
    pub keys: Vec<JsonWebKey>,
}

/// A published signing key
#[derive(Debug, Clone, Deserialize)]
pub struct JsonWebKey {
    /// Key identifier
    #[serde(default)]
    pub kid: Option<String>,

    /// X.509 certificate SHA-1 thumbprint
    #[serde(default)]
    pub x5t: Option<String>,

    /// Certificate chain, leaf first, each base64 DER
    #[serde(default)]
    pub x5c: Vec<String>,
}

impl JsonWebKey {
    /// The leaf certificate of the chain
    pub fn leaf_certificate(&self) -> Option<&str> {
        self.x5c.first().map(String::as_str)
    }

    /// Identifiers this key is indexed under: `kid`, then `x5t`, skipping empty values
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        [self.kid.as_deref(), self.x5t.as_deref()]
            .into_iter()
            .flatten()
            .filter(|id| !id.is_empty())
    }
}
