//! User identity token parsing and validation

mod claims;
mod identity;
mod validator;
mod verifier;

pub use claims::{Claim, ClaimType, ClaimsPrincipal};
pub use identity::UserIdentity;
pub use validator::UserIdentityToken;
pub(crate) use validator::check_arguments;
pub use verifier::{
    JwtVerifier, MalformedHeader, TokenHeader, TokenVerifier, VerificationOutcome,
    VerificationParameters,
};
