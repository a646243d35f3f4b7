//! Common test utilities for integration tests
//!
//! This module provides a mock identity provider (discovery document and
//! JWKS) and freshly generated signing keys for issuing test tokens.

#![allow(dead_code)]

use addin_auth::{SigningKeysCache, SigningKeysConfig};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::json;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const APPLICATION_ID: &str = "2d2a4bd0-62f0-4f66-a8b4-a7b0c8e4e9a1";

/// A self-signed ES256 signing certificate and its private key
pub struct TestSigningKey {
    pub kid: String,
    pub x5t: String,
    pub certificate_der: Vec<u8>,
    encoding_key: EncodingKey,
}

impl TestSigningKey {
    /// Generate a new key pair and certificate
    pub fn generate(kid: &str) -> Self {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .expect("Failed to generate certificate");
        let certificate_der = cert.serialize_der().expect("Failed to encode certificate");
        let encoding_key = EncodingKey::from_ec_der(&cert.serialize_private_key_der());

        Self {
            kid: kid.to_string(),
            x5t: format!("{kid}-thumbprint"),
            certificate_der,
            encoding_key,
        }
    }

    /// JWK entry publishing this key's certificate
    pub fn jwk(&self) -> serde_json::Value {
        json!({
            "kty": "EC",
            "use": "sig",
            "kid": self.kid,
            "x5t": self.x5t,
            "x5c": [STANDARD.encode(&self.certificate_der)],
        })
    }

    /// Sign `claims` with `kid` in the header
    pub fn sign(&self, claims: &serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.kid.clone());
        self.sign_with_header(header, claims)
    }

    /// Sign `claims` with a caller-built header
    pub fn sign_with_header(&self, header: Header, claims: &serde_json::Value) -> String {
        encode(&header, claims, &self.encoding_key).expect("Failed to encode test JWT")
    }
}

/// Identity provider mock server configuration
pub struct MockIdentityProvider {
    pub server: MockServer,
    pub issuer: String,
    pub discovery_url: String,
    pub jwks_uri: String,
}

impl MockIdentityProvider {
    /// Create a new mock identity provider
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();

        Self {
            issuer: format!("{}/", base_url),
            discovery_url: format!("{}/.well-known/openid-configuration", base_url),
            jwks_uri: format!("{}/keys", base_url),
            server,
        }
    }

    /// Mock the discovery document pointing at this server's JWKS
    pub async fn mock_discovery(&self) {
        self.mock_discovery_with_jwks_uri(&self.jwks_uri).await;
    }

    /// Mock the discovery document with an arbitrary `jwks_uri`
    pub async fn mock_discovery_with_jwks_uri(&self, jwks_uri: &str) {
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": self.issuer,
                "jwks_uri": jwks_uri,
                "authorization_endpoint": format!("{}/authorization", self.server.uri()),
                "token_endpoint": format!("{}/token", self.server.uri()),
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock the JWKS endpoint with the given keys
    pub async fn mock_jwks(&self, keys: &[&TestSigningKey]) {
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks(keys)))
            .mount(&self.server)
            .await;
    }

    /// Mock the JWKS endpoint and verify it is fetched exactly `times` times
    pub async fn mock_jwks_expecting(&self, keys: &[&TestSigningKey], times: u64) {
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks(keys)))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Cache configuration pointing at this server
    pub fn config(&self) -> SigningKeysConfig {
        SigningKeysConfig::default().with_discovery_url(&self.discovery_url)
    }

    /// A fresh cache pointing at this server
    pub fn cache(&self) -> Arc<SigningKeysCache> {
        Arc::new(SigningKeysCache::new(self.config()).expect("Failed to create cache"))
    }
}

/// JWKS document for the given keys
pub fn jwks(keys: &[&TestSigningKey]) -> serde_json::Value {
    json!({ "keys": keys.iter().map(|k| k.jwk()).collect::<Vec<_>>() })
}

/// Get current Unix timestamp
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Claims of a complete user identity token
pub fn identity_claims(issuer: &str, audience: &str, exp_offset_secs: i64) -> serde_json::Value {
    let now = current_timestamp();
    json!({
        "sub": "9d874c83-cd07-4690-ab6d-ad9551dbacf4",
        "environment_id": "p-Q2caBopqjEisbiLbtjEoMh",
        "email": "ada@example.com",
        "family_name": "Lovelace",
        "given_name": "Ada",
        "iss": issuer,
        "aud": audience,
        "exp": (now as i64 + exp_offset_secs) as u64,
        "iat": now,
        "nbf": now,
    })
}
