//! Command implementations

use addin_auth::{SigningKeysCache, UserIdentityToken};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::cli::{Cli, ValidateArgs};
use crate::error::{CliError, CliResult};
use crate::output;

/// Validate a token and print the identity it carries
///
/// # Errors
///
/// Returns [`CliError::Rejected`] if the token is not valid, or
/// [`CliError::InvalidArguments`] if no token was supplied
pub async fn validate(cli: &Cli, args: &ValidateArgs) -> CliResult<()> {
    let token = read_token(args.token.as_deref()).await?;

    let cache = Arc::new(SigningKeysCache::new(cli.signing_keys_config())?);
    let validator = UserIdentityToken::with_config(cache, args.validator_config());

    match validator.validate(&token, args.application_id).await {
        Ok(identity) => {
            println!("{}", output::identity(cli.format, &identity)?);
            Ok(())
        }
        Err(addin_auth::Error::Validation(e)) => {
            if let Some(rendered) = output::rejection(cli.format, &e)? {
                println!("{rendered}");
            }
            Err(CliError::Rejected(e))
        }
        Err(e) => Err(e.into()),
    }
}

/// Refresh the signing keys and list them
///
/// # Errors
///
/// Returns [`CliError::KeyDiscovery`] if the keys cannot be fetched
pub async fn keys(cli: &Cli) -> CliResult<()> {
    let cache = SigningKeysCache::new(cli.signing_keys_config())?;
    cache.refresh().await?;

    let entries = cache.certificates().entries();
    debug!(count = entries.len(), "Listing signing keys");
    println!(
        "{}",
        output::keys(cli.format, cache.issuer().as_deref(), &entries)?
    );
    Ok(())
}

async fn read_token(argument: Option<&str>) -> CliResult<String> {
    match argument {
        Some("-") => {
            let mut token = String::new();
            tokio::io::stdin().read_to_string(&mut token).await?;
            Ok(token.trim().to_string())
        }
        Some(token) => Ok(token.to_string()),
        None => Err(CliError::InvalidArguments(
            "no token given (pass it as an argument, set ADDIN_TOKEN, or use '-' for stdin)"
                .to_string(),
        )),
    }
}
