//! Session token type.

use core::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Errors that can occur when constructing a [`SessionToken`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The token is empty or whitespace only.
    #[error("session token cannot be blank")]
    Blank,
}

/// An opaque bearer token issued by the portal backend.
///
/// Always trimmed and never blank. `Debug` is redacted so tokens can't leak
/// through logs; use [`SessionToken::as_str`] where the raw value is needed.
///
/// ```
/// use logiport_core::SessionToken;
///
/// let token = SessionToken::parse("  abc123  ").unwrap();
/// assert_eq!(token.as_str(), "abc123");
/// assert!(SessionToken::parse(" \t ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Parse a token, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Blank` if nothing remains after trimming.
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TokenError::Blank);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// A short, non-reversible fingerprint for log correlation.
    ///
    /// The first 8 hex digits of the token's SHA-256.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        let mut encoded = hex::encode(digest);
        encoded.truncate(8);
        encoded
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

impl TryFrom<String> for SessionToken {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

impl std::str::FromStr for SessionToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let token = SessionToken::parse("  abc123  ").unwrap();
        assert_eq!(token.as_str(), "abc123");
    }

    #[test]
    fn test_parse_blank() {
        for raw in ["", " ", "\t\n  "] {
            assert_eq!(SessionToken::parse(raw), Err(TokenError::Blank));
        }
    }

    #[test]
    fn test_debug_is_redacted() {
        let token = SessionToken::parse("super-secret-token").unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_fingerprint_hides_token_characters() {
        let token = SessionToken::parse("abcdefgh1234").unwrap();
        let fingerprint = token.fingerprint();
        assert_eq!(fingerprint.len(), 8);
        assert!(!fingerprint.contains("1234"));
        assert!(!fingerprint.contains("abcd"));
        assert_eq!(fingerprint, SessionToken::parse(" abcdefgh1234 ").unwrap().fingerprint());
        assert_ne!(fingerprint, SessionToken::parse("abcdefgh1235").unwrap().fingerprint());
    }

    #[test]
    fn test_deserialize_rejects_blank() {
        assert!(serde_json::from_str::<SessionToken>("\"   \"").is_err());
        let token: SessionToken = serde_json::from_str("\" tok \"").unwrap();
        assert_eq!(token.as_str(), "tok");
    }
}
