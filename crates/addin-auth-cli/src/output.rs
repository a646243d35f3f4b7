//! Output formatting for CLI results

use addin_auth::signing_keys::Certificate;
use addin_auth::{TokenValidationError, UserIdentity};
use serde_json::json;
use std::sync::Arc;

use crate::cli::OutputFormat;
use crate::error::CliResult;

/// Render a validated identity
///
/// # Errors
///
/// Returns [`crate::CliError::Json`] if JSON encoding fails
pub fn identity(format: OutputFormat, identity: &UserIdentity) -> CliResult<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "valid": true,
            "identity": identity,
        }))?,
        OutputFormat::Human => format!(
            "Token is valid\n  user id:        {}\n  environment id: {}\n  name:           {} {}\n  email:          {}",
            identity.user_id,
            identity.environment_id,
            identity.given_name,
            identity.family_name,
            identity.email,
        ),
    })
}

/// Render a rejection; human output goes through the error path instead
///
/// # Errors
///
/// Returns [`crate::CliError::Json`] if JSON encoding fails
pub fn rejection(format: OutputFormat, error: &TokenValidationError) -> CliResult<Option<String>> {
    match format {
        OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(&json!({
            "valid": false,
            "kind": format!("{:?}", error.kind()),
            "message": error.message(),
        }))?)),
        OutputFormat::Human => Ok(None),
    }
}

/// Render the cached signing keys
///
/// # Errors
///
/// Returns [`crate::CliError::Json`] if JSON encoding fails
pub fn keys(
    format: OutputFormat,
    issuer: Option<&str>,
    entries: &[(String, Option<Arc<Certificate>>)],
) -> CliResult<String> {
    match format {
        OutputFormat::Json => {
            let keys: Vec<_> = entries
                .iter()
                .map(|(key_id, certificate)| match certificate {
                    Some(certificate) => json!({
                        "key_id": key_id,
                        "subject": certificate.subject(),
                        "key_family": format!("{:?}", certificate.key_family()),
                        "not_before": certificate.not_before().map(|t| t.to_rfc3339()),
                        "not_after": certificate.not_after().map(|t| t.to_rfc3339()),
                    }),
                    None => json!({ "key_id": key_id, "absent": true }),
                })
                .collect();
            Ok(serde_json::to_string_pretty(&json!({
                "issuer": issuer,
                "keys": keys,
            }))?)
        }
        OutputFormat::Human => {
            let mut out = format!("Issuer: {}\n", issuer.unwrap_or("(unknown)"));
            if entries.is_empty() {
                out.push_str("No signing keys published");
                return Ok(out);
            }
            out.push_str(&format!("{} signing key entries:", entries.len()));
            for (key_id, certificate) in entries {
                match certificate {
                    Some(certificate) => out.push_str(&format!(
                        "\n  {key_id}\n    subject: {}\n    type:    {:?}\n    expires: {}",
                        certificate.subject(),
                        certificate.key_family(),
                        certificate
                            .not_after()
                            .map_or_else(|| "unknown".to_string(), |t| t.to_rfc3339()),
                    )),
                    None => out.push_str(&format!("\n  {key_id} (not published)")),
                }
            }
            Ok(out)
        }
    }
}
