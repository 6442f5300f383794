//! CLI error type.

use logiport_portal::SessionError;
use logiport_portal::config::ConfigError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A session operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be encoded.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// The identifier given to `validate` was rejected.
    #[error("{0}")]
    InvalidIdentifier(String),
}

impl CliError {
    /// The message shown to the user.
    ///
    /// Session failures go through the portal's classifier; local problems
    /// are shown as-is.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Session(err) => err.classify().message,
            other => other.to_string(),
        }
    }
}
