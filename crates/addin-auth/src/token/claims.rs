//! Claims of a verified token

use serde_json::{Map, Value};

/// Claim types read from user identity tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimType {
    /// Subject / user id (`sub`, also issued as `nameid`)
    NameIdentifier,
    /// SKY environment id (`environment_id`)
    EnvironmentId,
    /// `email`
    Email,
    /// Last name (`family_name`)
    Surname,
    /// First name (`given_name`)
    GivenName,
}

impl ClaimType {
    /// Canonical claim name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NameIdentifier => "sub",
            Self::EnvironmentId => "environment_id",
            Self::Email => "email",
            Self::Surname => "family_name",
            Self::GivenName => "given_name",
        }
    }

    fn from_jwt_name(name: &str) -> Option<Self> {
        match name {
            "sub" | "nameid" => Some(Self::NameIdentifier),
            "environment_id" => Some(Self::EnvironmentId),
            "email" => Some(Self::Email),
            "family_name" => Some(Self::Surname),
            "given_name" => Some(Self::GivenName),
            _ => None,
        }
    }
}

/// A single claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Claim name, canonicalised for the names in [`ClaimType`]
    pub claim_type: String,
    /// Claim value as a string
    pub value: String,
}

/// Ordered list of claims produced by successful verification
///
/// Array-valued JWT claims contribute one claim per element, so a claim type
/// may occur several times; lookups return the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimsPrincipal {
    claims: Vec<Claim>,
}

impl ClaimsPrincipal {
    /// Empty principal
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a claim
    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim {
            claim_type: claim_type.into(),
            value: value.into(),
        });
        self
    }

    /// Build from a decoded JWT payload, preserving claim order
    pub fn from_json(payload: &Map<String, Value>) -> Self {
        let mut principal = Self::new();
        for (name, value) in payload {
            let claim_type = ClaimType::from_jwt_name(name)
                .map_or_else(|| name.clone(), |t| t.as_str().to_string());
            match value {
                Value::Array(items) => {
                    for item in items {
                        principal.push_value(&claim_type, item);
                    }
                }
                other => principal.push_value(&claim_type, other),
            }
        }
        principal
    }

    fn push_value(&mut self, claim_type: &str, value: &Value) {
        let value = match value {
            Value::Null => return,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.claims.push(Claim {
            claim_type: claim_type.to_string(),
            value,
        });
    }

    /// All claims in order
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// First value of the given claim type
    pub fn first(&self, claim_type: ClaimType) -> Option<&str> {
        self.first_named(claim_type.as_str())
    }

    /// First value of a claim by name
    pub fn first_named(&self, name: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == name)
            .map(|c| c.value.as_str())
    }
}
