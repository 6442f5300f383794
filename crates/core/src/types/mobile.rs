//! Mobile number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MobileNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MobileError {
    /// The input string is empty.
    #[error("mobile number cannot be empty")]
    Empty,
    /// The input does not contain exactly ten digits.
    #[error("mobile number must be exactly {expected} digits (got {actual})")]
    WrongLength {
        /// Required digit count.
        expected: usize,
        /// Digits found after stripping formatting.
        actual: usize,
    },
    /// The input has ten digits but also other characters.
    #[error("mobile number must contain digits only")]
    NonDigit,
}

/// A 10-digit mobile number.
///
/// The stored value is digits only. [`MobileNumber::parse`] is strict and
/// rejects formatting characters; [`MobileNumber::digits_of`] gives the
/// normalized digits of an arbitrary input for display or diagnostics.
///
/// ```
/// use logiport_core::MobileNumber;
///
/// assert_eq!(MobileNumber::parse(" 9876543210 ").unwrap().as_str(), "9876543210");
/// assert!(MobileNumber::parse("98765-43210").is_err());
/// assert!(MobileNumber::parse("98765").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MobileNumber(String);

impl MobileNumber {
    /// Number of digits in a mobile number.
    pub const DIGITS: usize = 10;

    /// Parse a `MobileNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, does not contain
    /// exactly ten digits, or contains anything other than digits.
    pub fn parse(s: &str) -> Result<Self, MobileError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MobileError::Empty);
        }

        let digits = Self::digits_of(s);
        if digits.len() != Self::DIGITS {
            return Err(MobileError::WrongLength {
                expected: Self::DIGITS,
                actual: digits.len(),
            });
        }

        if digits.len() != s.len() {
            return Err(MobileError::NonDigit);
        }

        Ok(Self(digits))
    }

    /// Strip every non-digit character from `s`.
    #[must_use]
    pub fn digits_of(s: &str) -> String {
        s.chars().filter(char::is_ascii_digit).collect()
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number with all but the last four digits masked.
    #[must_use]
    pub fn masked(&self) -> String {
        let visible = self.0.get(self.0.len().saturating_sub(4)..).unwrap_or("");
        format!("******{visible}")
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MobileNumber {
    type Err = MobileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for MobileNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
