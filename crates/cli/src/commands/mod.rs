//! Command implementations.

pub mod admin;
pub mod client;
pub mod validate;

use std::io::BufRead;
use std::sync::Arc;

use logiport_portal::SessionContext;
use logiport_portal::cache::QueryCache;
use logiport_portal::config::PortalConfig;
use logiport_portal::remote::HttpPortalApi;
use logiport_portal::storage::FileStore;
use secrecy::SecretString;
use serde::Serialize;

use crate::error::CliError;

/// Build the session context and attach the HTTP backend.
///
/// Attaching revalidates a persisted admin token.
pub async fn connect(config: &PortalConfig) -> Result<SessionContext, CliError> {
    let store = Arc::new(FileStore::new(&config.state_file));
    let context = SessionContext::init(store, QueryCache::new(config.cache))?
        .with_client_ip(config.client_ip);

    let api = HttpPortalApi::new(&config.api_url, config.request_timeout)?;
    let outcome = context.attach_api(Arc::new(api)).await?;
    tracing::debug!(?outcome, "Backend attached");
    Ok(context)
}

/// Use `given`, or read one line from stdin.
pub fn secret_or_stdin(given: Option<String>) -> Result<SecretString, CliError> {
    if let Some(value) = given {
        return Ok(SecretString::from(value));
    }
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(SecretString::from(
        line.trim_end_matches(['\r', '\n']).to_owned(),
    ))
}

/// Write a value to stdout as pretty JSON.
#[allow(clippy::print_stdout)]
pub fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Write a line to stdout.
#[allow(clippy::print_stdout)]
pub fn print_line(line: &str) {
    println!("{line}");
}

/// Write a failure message to stderr.
#[allow(clippy::print_stderr)]
pub fn report(message: &str) {
    eprintln!("{message}");
}
