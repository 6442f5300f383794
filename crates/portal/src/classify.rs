//! Maps failures to user-facing messages.
//!
//! This is the single place errors are turned into text a user may see.
//! Free-text failures go through ordered tiers:
//!
//! 1. Known server-authored phrases (credentials, existence, expiry, rate
//!    limits, linkage, sessions) pass through verbatim.
//! 2. Connectivity failures and missing capabilities get fixed messages.
//! 3. Anything mentioning protocol internals collapses to a generic
//!    "operation failed" message.
//! 4. Short, jargon-free messages pass through.
//! 5. Everything else gets the generic fallback and is logged.

use std::fmt;

use serde::Serialize;
use tracing::{debug, error};

use crate::error::SessionError;
use crate::remote::{ApiErrorKind, RemoteError};

/// Longest free-text message passed through unchanged by the last tier.
const MAX_PASSTHROUGH_LEN: usize = 120;

pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";
pub const OPERATION_FAILED_MESSAGE: &str =
    "Operation failed. Please try again or contact support.";
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The service is temporarily unavailable. Please try again later.";
pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to connect. Please check your internet connection and try again.";
pub const TIMED_OUT_MESSAGE: &str = "The request timed out. Please try again.";
pub const RATE_LIMITED_MESSAGE: &str =
    "Too many attempts. Please wait a few minutes and try again.";
pub const NOT_AUTHENTICATED_MESSAGE: &str = "Please log in to continue.";
pub const FIRST_LOGIN_MESSAGE: &str = "Please change your password to continue.";

/// Phrases the backend uses in user-safe messages, with their category.
const KNOWN_PHRASES: &[(&str, ErrorCategory)] = &[
    ("rate limit", ErrorCategory::RateLimited),
    ("too many", ErrorCategory::RateLimited),
    ("already exists", ErrorCategory::AlreadyExists),
    ("already registered", ErrorCategory::AlreadyExists),
    ("not linked", ErrorCategory::NotLinked),
    ("session", ErrorCategory::SessionExpired),
    ("expired", ErrorCategory::ExpiredCredential),
    ("not found", ErrorCategory::NotFound),
    ("no account", ErrorCategory::NotFound),
    ("invalid credentials", ErrorCategory::AuthenticationFailed),
    ("invalid password", ErrorCategory::AuthenticationFailed),
    ("incorrect password", ErrorCategory::AuthenticationFailed),
    ("wrong password", ErrorCategory::AuthenticationFailed),
    ("invalid otp", ErrorCategory::AuthenticationFailed),
    ("invalid code", ErrorCategory::AuthenticationFailed),
];

const CONNECTIVITY_PHRASES: &[&str] = &[
    "failed to fetch",
    "fetch failed",
    "network",
    "connection refused",
    "connection reset",
    "offline",
];

const TIMEOUT_PHRASES: &[&str] = &["timed out", "timeout"];

const MISSING_CAPABILITY_PHRASES: &[&str] = &[
    "is not a function",
    "not available",
    "not implemented",
    "has no method",
    "method not found",
    "actor not ready",
];

/// Protocol and runtime terms that must never reach a user.
const JARGON: &[&str] = &[
    "canister",
    "wasm",
    "trap",
    "candid",
    "replica",
    "reject code",
    "principal",
    "agent",
    "cbor",
    "panicked",
    "stack trace",
    "backtrace",
    "undefined",
    "0x",
];

/// User-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    AuthenticationFailed,
    ServiceUnavailable,
    NetworkError,
    ValidationError,
    RateLimited,
    AlreadyExists,
    NotFound,
    ExpiredCredential,
    NotLinked,
    SessionExpired,
    UnknownError,
}

/// A failure ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
}

impl ClassifiedError {
    fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Fixed category and sentence for each tagged backend error.
#[must_use]
pub const fn classify_kind(kind: ApiErrorKind) -> (ErrorCategory, &'static str) {
    match kind {
        ApiErrorKind::InvalidCredentials => (
            ErrorCategory::AuthenticationFailed,
            "Invalid credentials. Please check your details and try again.",
        ),
        ApiErrorKind::InvalidPassword => (
            ErrorCategory::AuthenticationFailed,
            "Incorrect password. Please try again.",
        ),
        ApiErrorKind::InvalidOtp => (
            ErrorCategory::AuthenticationFailed,
            "Invalid verification code. Please try again.",
        ),
        ApiErrorKind::RateLimited => (ErrorCategory::RateLimited, RATE_LIMITED_MESSAGE),
        ApiErrorKind::AlreadyExists => (
            ErrorCategory::AlreadyExists,
            "An account with these details already exists. Please log in instead.",
        ),
        ApiErrorKind::NotFound => (
            ErrorCategory::NotFound,
            "We couldn't find an account with those details.",
        ),
        ApiErrorKind::ExpiredCredential => (
            ErrorCategory::ExpiredCredential,
            "This code has expired. Please request a new one.",
        ),
        ApiErrorKind::NotLinked => (
            ErrorCategory::NotLinked,
            "This mobile number is not linked to any account.",
        ),
        ApiErrorKind::SessionExpired => (
            ErrorCategory::SessionExpired,
            "Your session has expired. Please log in again.",
        ),
        ApiErrorKind::Unknown => (ErrorCategory::UnknownError, GENERIC_MESSAGE),
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn has_jargon(lower: &str) -> bool {
    contains_any(lower, JARGON)
}

/// Classify a free-text failure message.
#[must_use]
pub fn classify_message(message: &str) -> ClassifiedError {
    let trimmed = message.trim();
    let lower = trimmed.to_lowercase();
    let jargon = has_jargon(&lower);

    if !jargon
        && let Some((_, category)) = KNOWN_PHRASES
            .iter()
            .find(|(phrase, _)| lower.contains(phrase))
    {
        return ClassifiedError::new(*category, trimmed);
    }

    if contains_any(&lower, TIMEOUT_PHRASES) {
        return ClassifiedError::new(ErrorCategory::NetworkError, TIMED_OUT_MESSAGE);
    }
    if contains_any(&lower, CONNECTIVITY_PHRASES) {
        return ClassifiedError::new(ErrorCategory::NetworkError, NETWORK_ERROR_MESSAGE);
    }
    if contains_any(&lower, MISSING_CAPABILITY_PHRASES) {
        return ClassifiedError::new(
            ErrorCategory::ServiceUnavailable,
            SERVICE_UNAVAILABLE_MESSAGE,
        );
    }

    if jargon {
        error!(detail = %trimmed, "Internal error hidden from user");
        return ClassifiedError::new(ErrorCategory::UnknownError, OPERATION_FAILED_MESSAGE);
    }

    if !trimmed.is_empty() && trimmed.chars().count() <= MAX_PASSTHROUGH_LEN {
        debug!(detail = %trimmed, "Passing through unclassified message");
        return ClassifiedError::new(ErrorCategory::UnknownError, trimmed);
    }

    error!(detail = %trimmed, "Unclassified error");
    ClassifiedError::new(ErrorCategory::UnknownError, GENERIC_MESSAGE)
}

/// Classify a remote boundary failure.
#[must_use]
pub fn classify_remote(err: &RemoteError) -> ClassifiedError {
    match err {
        RemoteError::Rejected(kind) => {
            if *kind == ApiErrorKind::Unknown {
                error!(error = %err, "Unrecognized backend error variant");
            }
            let (category, message) = classify_kind(*kind);
            ClassifiedError::new(category, message)
        }
        RemoteError::Message(message) => classify_message(message),
        RemoteError::Unavailable { operation } => {
            debug!(operation, "Backend operation unavailable");
            ClassifiedError::new(
                ErrorCategory::ServiceUnavailable,
                SERVICE_UNAVAILABLE_MESSAGE,
            )
        }
        RemoteError::Network(_) => {
            ClassifiedError::new(ErrorCategory::NetworkError, NETWORK_ERROR_MESSAGE)
        }
        RemoteError::Timeout => ClassifiedError::new(ErrorCategory::NetworkError, TIMED_OUT_MESSAGE),
        RemoteError::Decode(_) | RemoteError::UnexpectedResponse(_) => {
            debug!(error = %err, "Malformed backend response");
            ClassifiedError::new(
                ErrorCategory::ServiceUnavailable,
                SERVICE_UNAVAILABLE_MESSAGE,
            )
        }
    }
}

pub(crate) fn classify_session_error(err: &SessionError) -> ClassifiedError {
    match err {
        SessionError::Validation(validation) => {
            ClassifiedError::new(ErrorCategory::ValidationError, validation.to_string())
        }
        SessionError::Token(_) => {
            ClassifiedError::new(ErrorCategory::ValidationError, "Invalid session token.")
        }
        SessionError::AuthenticationFailed(message) => {
            ClassifiedError::new(ErrorCategory::AuthenticationFailed, message.clone())
        }
        SessionError::ServiceUnavailable(_) => ClassifiedError::new(
            ErrorCategory::ServiceUnavailable,
            SERVICE_UNAVAILABLE_MESSAGE,
        ),
        SessionError::NotAuthenticated => {
            ClassifiedError::new(ErrorCategory::SessionExpired, NOT_AUTHENTICATED_MESSAGE)
        }
        SessionError::FirstLoginPending => {
            ClassifiedError::new(ErrorCategory::ValidationError, FIRST_LOGIN_MESSAGE)
        }
        SessionError::Remote(remote) => classify_remote(remote),
        SessionError::Storage(storage) => {
            error!(error = %storage, "Token storage failure");
            ClassifiedError::new(ErrorCategory::UnknownError, GENERIC_MESSAGE)
        }
    }
}
