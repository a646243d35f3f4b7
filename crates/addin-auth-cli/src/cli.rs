//! CLI argument parsing and configuration types

use addin_auth::{DEFAULT_DISCOVERY_URL, SigningKeysConfig, ValidatorConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;
use uuid::Uuid;

/// Main CLI application structure
#[derive(Parser, Debug)]
#[command(
    name = "addin-auth",
    version,
    about = "Validate add-in user identity tokens and inspect the identity provider's signing keys",
    long_about = "Validates the user identity tokens a host application hands to its add-ins.\n\
                  Signing certificates are discovered through the identity provider's OpenID\n\
                  configuration document.\n\n\
                  SECURITY WARNINGS:\n\
                  - Tokens passed as arguments may end up in shell history; prefer ADDIN_TOKEN or '-'\n\
                  - Tokens are printed to debug logs only as key ids, never in full"
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// OpenID Connect discovery document of the identity provider
    #[arg(
        long,
        global = true,
        env = "ADDIN_DISCOVERY_URL",
        default_value = DEFAULT_DISCOVERY_URL
    )]
    pub discovery_url: String,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a user identity token
    Validate(ValidateArgs),

    /// Refresh and list the identity provider's signing keys
    Keys,
}

/// Arguments of `validate`
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Application id of the add-in the token must be issued to
    #[arg(long, short = 'a')]
    pub application_id: Uuid,

    /// The token; '-' reads it from stdin
    #[arg(env = "ADDIN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Clock skew tolerated on expiry checks, in seconds
    #[arg(long, default_value_t = 300)]
    pub clock_skew: u64,
}

impl ValidateArgs {
    /// Validator configuration for these arguments
    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig::default().with_clock_skew(Duration::from_secs(self.clock_skew))
    }
}

impl Cli {
    /// Signing key cache configuration for these arguments
    pub fn signing_keys_config(&self) -> SigningKeysConfig {
        SigningKeysConfig::default().with_discovery_url(&self.discovery_url)
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable
    Human,
    /// JSON
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPLICATION_ID: &str = "2d2a4bd0-62f0-4f66-a8b4-a7b0c8e4e9a1";

    #[test]
    fn test_validate_args() {
        let cli = Cli::try_parse_from([
            "addin-auth",
            "validate",
            "--application-id",
            APPLICATION_ID,
            "eyJhbGciOi.payload.sig",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Human);
        assert!(!cli.verbose);
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.application_id.to_string(), APPLICATION_ID);
                assert_eq!(args.token.as_deref(), Some("eyJhbGciOi.payload.sig"));
                assert_eq!(args.validator_config().clock_skew, Duration::from_secs(300));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "addin-auth",
            "keys",
            "--format",
            "json",
            "-v",
            "--discovery-url",
            "https://idp.example.com/.well-known/openid-configuration",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Keys));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert_eq!(
            cli.signing_keys_config().discovery_url,
            "https://idp.example.com/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_application_id_must_be_uuid() {
        let result = Cli::try_parse_from([
            "addin-auth",
            "validate",
            "--application-id",
            "not-a-uuid",
            "token",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_application_id_required() {
        assert!(Cli::try_parse_from(["addin-auth", "validate", "token"]).is_err());
    }
}
