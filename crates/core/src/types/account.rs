//! Client account types.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::mobile::MobileNumber;
use super::token::SessionToken;

/// Token markers the backend embeds ahead of the client id, e.g.
/// `otp_CL1042_9f1c...`.
const CLIENT_ID_MARKERS: &[&str] = &["firstlogin_", "otp_", "signup_"];

/// A client account identifier (e.g. `CL1042`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Create a client id from a backend-supplied string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Best-effort client id extraction from a session token.
    ///
    /// Compatibility shim for backends that do not return `clientId` in the
    /// account-status response. Relies on the token format, which the backend
    /// does not guarantee; never use the result for authorization.
    #[must_use]
    pub fn from_token(token: &SessionToken) -> Option<Self> {
        let raw = token.as_str();
        CLIENT_ID_MARKERS.iter().find_map(|marker| {
            let start = raw.find(marker)? + marker.len();
            let rest = raw.get(start..)?;
            let id: String = rest
                .chars()
                .take_while(char::is_ascii_alphanumeric)
                .collect();
            (!id.is_empty()).then_some(Self(id))
        })
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account status as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatusResponse {
    /// Whether a password change is required before any other access.
    pub is_first_login: bool,
    /// Account role (e.g. `client`).
    pub role: String,
    /// Client id, when the backend supplies it.
    #[serde(default)]
    pub client_id: Option<ClientId>,
}

/// Derived client account status.
///
/// Never persisted; always fetched fresh through the client token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAccountStatus {
    /// Whether a password change is required before any other access.
    pub is_first_login: bool,
    /// Account role.
    pub role: String,
    /// Client id, from the backend or derived from the token.
    pub client_id: Option<ClientId>,
}

impl ClientAccountStatus {
    /// Build the status from a backend response, falling back to the token
    /// shim when the response carries no client id.
    #[must_use]
    pub fn from_response(response: AccountStatusResponse, token: &SessionToken) -> Self {
        let client_id = response
            .client_id
            .or_else(|| ClientId::from_token(token));
        Self {
            is_first_login: response.is_first_login,
            role: response.role,
            client_id,
        }
    }
}

/// Profile fields collected at signup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupProfile {
    /// Contact name.
    pub full_name: String,
    /// Company name, for business accounts.
    pub company_name: Option<String>,
    /// Contact mobile number.
    pub mobile: Option<MobileNumber>,
    /// Billing address.
    pub address: Option<String>,
}
