//! Error types for CLI operations

use addin_auth::TokenValidationError;
use addin_auth::signing_keys::FetchError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The token was rejected
    #[error("Token rejected: {0}")]
    Rejected(#[from] TokenValidationError),

    /// Signing keys could not be discovered
    #[error("Key discovery failed: {0}")]
    KeyDiscovery(#[from] FetchError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<addin_auth::Error> for CliError {
    fn from(err: addin_auth::Error) -> Self {
        match err {
            addin_auth::Error::InvalidArgument(name) => {
                Self::InvalidArguments(format!("{name} must not be empty"))
            }
            addin_auth::Error::Validation(e) => Self::Rejected(e),
            addin_auth::Error::KeyDiscovery(e) => Self::KeyDiscovery(e),
        }
    }
}

impl CliError {
    /// Get user-friendly suggestions for resolving the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::KeyDiscovery(FetchError::InsecureUrl(_)) => {
                vec!["Use an https:// discovery URL (http:// is only accepted for localhost)"]
            }
            Self::KeyDiscovery(_) => vec![
                "Check network connectivity to the identity provider",
                "Verify --discovery-url points at an OpenID configuration document",
            ],
            Self::InvalidArguments(_) => vec![
                "Pass the token as an argument, via ADDIN_TOKEN, or '-' to read stdin",
                "Use --help to see expected format",
            ],
            _ => vec![],
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
