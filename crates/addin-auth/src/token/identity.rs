//! The identity carried by a validated token

use serde::{Deserialize, Serialize};

use super::claims::{ClaimType, ClaimsPrincipal};
use crate::error::TokenValidationError;

/// The user an identity token was issued for
///
/// Only produced by successful validation; every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    /// User identifier
    pub user_id: String,
    /// SKY environment identifier
    pub environment_id: String,
    /// Email address
    pub email: String,
    /// Last name
    pub family_name: String,
    /// First name
    pub given_name: String,
}

impl UserIdentity {
    /// Extract the identity from verified claims
    ///
    /// # Errors
    ///
    /// Returns [`TokenValidationError::MalformedToken`] if any of the five
    /// claims is missing or empty, even though the signature verified.
    pub fn from_principal(principal: &ClaimsPrincipal) -> Result<Self, TokenValidationError> {
        let required = |claim_type: ClaimType| {
            principal
                .first(claim_type)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    TokenValidationError::malformed(format!(
                        "token is missing the '{}' claim",
                        claim_type.as_str()
                    ))
                })
        };

        Ok(Self {
            user_id: required(ClaimType::NameIdentifier)?,
            environment_id: required(ClaimType::EnvironmentId)?,
            email: required(ClaimType::Email)?,
            family_name: required(ClaimType::Surname)?,
            given_name: required(ClaimType::GivenName)?,
        })
    }
}
