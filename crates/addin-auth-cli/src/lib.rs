//! # Add-in Auth CLI
//!
//! Command-line interface for validating add-in user identity tokens and
//! inspecting the identity provider's signing keys.
//!
//! ## Usage
//!
//! ```bash
//! # Validate a token issued to an add-in
//! addin-auth validate --application-id 2d2a4bd0-62f0-4f66-a8b4-a7b0c8e4e9a1 "$TOKEN"
//!
//! # Read the token from stdin, JSON output
//! echo "$TOKEN" | addin-auth validate -a 2d2a4bd0-62f0-4f66-a8b4-a7b0c8e4e9a1 - --format json
//!
//! # List the published signing keys
//! addin-auth keys -v
//! ```
//!
//! Exits with status 0 when the command succeeds and 1 when the token is
//! rejected or the keys cannot be fetched.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub use cli::{Cli, Commands, OutputFormat};
pub use error::{CliError, CliResult};

/// Run the CLI application
///
/// # Errors
///
/// Returns the [`CliError`] of the failed command
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Validate(args) => commands::validate(&cli, args).await,
        Commands::Keys => commands::keys(&cli).await,
    }
}

/// Install the stderr log subscriber
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("addin_auth=debug,addin_auth_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
