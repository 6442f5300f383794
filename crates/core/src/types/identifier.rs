//! Login identifier validation.
//!
//! A client logs in with either an email address or a 10-digit mobile
//! number. [`validate`] is the total, non-failing check used by login forms;
//! [`LoginIdentifier::parse`] is the typed counterpart used by the session
//! managers before any remote call is made.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::email::{Email, EmailError};
use super::mobile::{MobileError, MobileNumber};

/// `word.word` without an @, e.g. `john.doe`.
static DOTTED_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+\.[A-Za-z]+").expect("Invalid regex"));

/// Substrings that mark an input as an email typed without its @.
const EMAIL_HINTS: &[&str] = &[
    ".com", ".net", ".org", ".in", ".co", ".io", "gmail", "yahoo", "outlook", "hotmail",
];

/// Reasons a login identifier is rejected.
///
/// The `Display` text is the user-facing message shown next to the field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Nothing was entered.
    #[error("Please enter your email address or mobile number")]
    Required,
    /// Contains an @ but is not a usable email.
    #[error("Please enter a valid email address (e.g. name@example.com)")]
    InvalidEmail,
    /// Looks like an email but the @ is missing.
    #[error("Email address is missing the @ symbol")]
    MissingAtSymbol,
    /// Mobile number with the wrong digit count.
    #[error("Mobile number must be exactly 10 digits")]
    MobileLength,
    /// Ten digits, but mixed with other characters.
    #[error("Mobile number must contain digits only")]
    DigitsOnly,
}

/// Result of [`validate`].
///
/// Always structurally complete: `normalized` is populated even for invalid
/// input so forms can echo the cleaned value back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCheck {
    /// Whether the identifier may be sent to the backend.
    pub is_valid: bool,
    /// Trimmed email, or the digits of a mobile number.
    pub normalized: String,
    /// Why the identifier was rejected.
    pub error: Option<IdentifierError>,
}

impl IdentifierCheck {
    fn valid(normalized: String) -> Self {
        Self {
            is_valid: true,
            normalized,
            error: None,
        }
    }

    fn invalid(normalized: String, error: IdentifierError) -> Self {
        Self {
            is_valid: false,
            normalized,
            error: Some(error),
        }
    }

    /// The user-facing message, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Validate and normalize an email-or-mobile login identifier.
///
/// Never panics and never fails; every input yields a verdict.
///
/// ```
/// use logiport_core::{IdentifierError, validate};
///
/// assert!(validate("user@example.com").is_valid);
/// assert_eq!(validate("9876543210").normalized, "9876543210");
/// assert_eq!(validate("john.doe").error, Some(IdentifierError::MissingAtSymbol));
/// ```
#[must_use]
pub fn validate(input: &str) -> IdentifierCheck {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return IdentifierCheck::invalid(String::new(), IdentifierError::Required);
    }

    if trimmed.contains('@') {
        return match Email::parse(trimmed) {
            Ok(email) => IdentifierCheck::valid(email.into_inner()),
            Err(_) => IdentifierCheck::invalid(trimmed.to_owned(), IdentifierError::InvalidEmail),
        };
    }

    if looks_like_email(trimmed) {
        return IdentifierCheck::invalid(trimmed.to_owned(), IdentifierError::MissingAtSymbol);
    }

    let digits = MobileNumber::digits_of(trimmed);
    if digits.len() != MobileNumber::DIGITS {
        return IdentifierCheck::invalid(digits, IdentifierError::MobileLength);
    }

    if digits.len() != trimmed.len() {
        return IdentifierCheck::invalid(digits, IdentifierError::DigitsOnly);
    }

    IdentifierCheck::valid(digits)
}

fn looks_like_email(s: &str) -> bool {
    if DOTTED_WORDS.is_match(s) {
        return true;
    }
    let lower = s.to_lowercase();
    EMAIL_HINTS.iter().any(|hint| lower.contains(hint))
}

/// A validated login identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LoginIdentifier {
    /// Email login.
    Email(Email),
    /// Mobile number login.
    Mobile(MobileNumber),
}

impl LoginIdentifier {
    /// Parse an identifier with the same rules as [`validate`].
    ///
    /// # Errors
    ///
    /// Returns the [`IdentifierError`] that [`validate`] would report.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let check = validate(input);
        if let Some(error) = check.error {
            return Err(error);
        }

        if check.normalized.contains('@') {
            Email::parse(&check.normalized)
                .map(Self::Email)
                .map_err(|_| IdentifierError::InvalidEmail)
        } else {
            MobileNumber::parse(&check.normalized)
                .map(Self::Mobile)
                .map_err(|_| IdentifierError::MobileLength)
        }
    }

    /// The normalized identifier as sent to the backend.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email(email) => email.as_str(),
            Self::Mobile(mobile) => mobile.as_str(),
        }
    }

    /// Returns `true` for email identifiers.
    #[must_use]
    pub const fn is_email(&self) -> bool {
        matches!(self, Self::Email(_))
    }
}

impl From<EmailError> for IdentifierError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::Empty => Self::Required,
            EmailError::MissingAtSymbol => Self::MissingAtSymbol,
            EmailError::TooLong { .. } | EmailError::InvalidFormat => Self::InvalidEmail,
        }
    }
}

impl From<MobileError> for IdentifierError {
    fn from(err: MobileError) -> Self {
        match err {
            MobileError::Empty => Self::Required,
            MobileError::WrongLength { .. } => Self::MobileLength,
            MobileError::NonDigit => Self::DigitsOnly,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email_is_unchanged() {
        let check = validate("user@example.com");
        assert!(check.is_valid);
        assert_eq!(check.normalized, "user@example.com");
        assert_eq!(check.error, None);
    }

    #[test]
    fn test_email_is_trimmed() {
        let check = validate("  user@example.com  ");
        assert!(check.is_valid);
        assert_eq!(check.normalized, "user@example.com");
    }

    #[test]
    fn test_valid_mobile() {
        let check = validate("9876543210");
        assert!(check.is_valid);
        assert_eq!(check.normalized, "9876543210");
    }

    #[test]
    fn test_short_mobile() {
        let check = validate("98765");
        assert!(!check.is_valid);
        assert_eq!(check.error, Some(IdentifierError::MobileLength));
        assert_eq!(
            check.error_message().unwrap(),
            "Mobile number must be exactly 10 digits"
        );
    }

    #[test]
    fn test_missing_at() {
        let check = validate("john.doe");
        assert!(!check.is_valid);
        assert_eq!(check.error, Some(IdentifierError::MissingAtSymbol));
    }

    #[test]
    fn test_missing_at_from_provider_hint() {
        let check = validate("johngmail");
        assert_eq!(check.error, Some(IdentifierError::MissingAtSymbol));
    }

    #[test]
    fn test_required() {
        for input in ["", "   ", "\t\n"] {
            let check = validate(input);
            assert!(!check.is_valid);
            assert_eq!(check.error, Some(IdentifierError::Required));
        }
    }

    #[test]
    fn test_bad_email_shape() {
        let check = validate("user@localhost");
        assert!(!check.is_valid);
        assert_eq!(check.error, Some(IdentifierError::InvalidEmail));
    }

    #[test]
    fn test_formatted_mobile_normalizes_but_is_invalid() {
        let check = validate("98765-43210");
        assert!(!check.is_valid);
        assert_eq!(check.normalized, "9876543210");
        assert_eq!(check.error, Some(IdentifierError::DigitsOnly));
    }

    #[test]
    fn test_login_identifier_parse() {
        assert!(LoginIdentifier::parse("user@example.com").unwrap().is_email());
        let mobile = LoginIdentifier::parse(" 9876543210 ").unwrap();
        assert_eq!(mobile.as_str(), "9876543210");
        assert!(!mobile.is_email());
        assert_eq!(
            LoginIdentifier::parse("98765"),
            Err(IdentifierError::MobileLength)
        );
    }

    #[test]
    fn test_error_conversions() {
        assert_eq!(
            IdentifierError::from(EmailError::InvalidFormat),
            IdentifierError::InvalidEmail
        );
        assert_eq!(
            IdentifierError::from(MobileError::NonDigit),
            IdentifierError::DigitsOnly
        );
    }
}
