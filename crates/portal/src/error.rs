//! Session error types.
//!
//! Every session operation returns [`SessionError`]. UI-facing code should
//! never display these directly; call [`SessionError::classify`] to get the
//! user-facing message.

use logiport_core::{IdentifierError, TokenError};
use thiserror::Error;

use crate::classify::{self, ClassifiedError};
use crate::remote::RemoteError;
use crate::storage::StorageError;

/// Minimum length of a client password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Local, pre-flight input errors. Never produced after a remote call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Login identifier failed validation.
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// The operation needs an email address.
    #[error("Please enter a valid email address (e.g. name@example.com)")]
    EmailRequired,

    /// The operation needs a mobile number.
    #[error("Please enter a 10-digit mobile number")]
    MobileRequired,

    #[error("Please enter your password")]
    EmptyPassword,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Please enter the verification code")]
    EmptyOtp,
}

/// Errors returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Input rejected before any remote call.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A blank token was offered for storage.
    #[error("invalid token: {0}")]
    Token(#[from] TokenError),

    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The backend could not complete the operation. The detail is for logs
    /// only.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The operation needs a session and none is held.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The client must change their password before anything else.
    #[error("password change required")]
    FirstLoginPending,

    /// The backend call failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The token store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Map this error to its user-facing category and message.
    #[must_use]
    pub fn classify(&self) -> ClassifiedError {
        classify::classify_session_error(self)
    }

    /// Whether this failure means the session that made the call is gone.
    #[must_use]
    pub fn invalidates_session(&self) -> bool {
        matches!(self, Self::Remote(err) if err.invalidates_session())
    }
}

/// Check a new client password against its confirmation.
///
/// # Errors
///
/// Returns `ValidationError` if the password is too short or does not match.
pub fn check_new_password(password: &str, confirm: Option<&str>) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    if confirm.is_some_and(|confirm| confirm != password) {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
