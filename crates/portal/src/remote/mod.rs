//! Boundary with the portal backend API.
//!
//! # Architecture
//!
//! - [`PortalApi`] is the object-safe async trait every backend handle
//!   implements. Each operation has a default body returning
//!   [`RemoteError::Unavailable`], so a handle only implements what it
//!   actually exposes and a missing capability is an ordinary error.
//! - [`RemoteHandle`] is the replaceable slot the session managers read the
//!   current handle from.
//! - [`HttpPortalApi`] talks JSON over HTTP to a deployed backend.
//!
//! # Error shapes
//!
//! The backend reports failures either as a tagged object carrying a
//! `__kind__` discriminant ([`ApiErrorKind`]) or as a free-text message.
//! Both arrive here as [`RemoteError`] and are turned into user-facing
//! messages by [`crate::classify`].

mod handle;
mod http;

pub use handle::RemoteHandle;
pub use http::HttpPortalApi;

use std::net::IpAddr;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use logiport_core::{
    AccountStatusResponse, ClientDraft, ClientSummary, Email, Invoice, InvoiceDraft, LoginRecord,
    MobileNumber, RevenueSummary, SessionToken, Shipment, ShipmentDraft, SignupProfile,
};

/// Tagged error variants returned by the backend.
///
/// Decoded from `{"__kind__": "<variant>"}`. Unrecognized tags decode to
/// [`ApiErrorKind::Unknown`] rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "__kind__", rename_all = "camelCase")]
pub enum ApiErrorKind {
    InvalidCredentials,
    InvalidPassword,
    InvalidOtp,
    RateLimited,
    AlreadyExists,
    NotFound,
    ExpiredCredential,
    NotLinked,
    SessionExpired,
    #[serde(other)]
    Unknown,
}

/// Result of an admin login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdminLoginOutcome {
    /// Password accepted; carries the raw (unvalidated) token.
    Success(String),
    /// Password rejected.
    InvalidPassword,
}

/// Errors that can occur when calling the backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The backend rejected the call with a tagged variant.
    #[error("rejected by backend: {0:?}")]
    Rejected(ApiErrorKind),

    /// The backend (or agent) failed with a free-text message.
    #[error("{0}")]
    Message(String),

    /// The current handle does not expose this operation.
    #[error("operation '{operation}' is not available on this backend")]
    Unavailable {
        /// Backend operation name.
        operation: &'static str,
    },

    /// The backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The call did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The response had an unexpected status or shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl RemoteError {
    /// Whether this failure means the token used for the call is no longer
    /// accepted by the backend.
    #[must_use]
    pub fn invalidates_session(&self) -> bool {
        match self {
            Self::Rejected(kind) => matches!(
                kind,
                ApiErrorKind::SessionExpired | ApiErrorKind::ExpiredCredential
            ),
            Self::Message(message) => {
                let lower = message.to_lowercase();
                lower.contains("invalid or expired")
                    || lower.contains("session expired")
                    || lower.contains("session has expired")
                    || lower.contains("token expired")
            }
            _ => false,
        }
    }
}

fn unavailable<T>(operation: &'static str) -> Result<T, RemoteError> {
    Err(RemoteError::Unavailable { operation })
}

/// Operations exposed by the portal backend.
///
/// Raw token strings returned by login operations are validated by the
/// session managers, not by implementations.
#[async_trait]
pub trait PortalApi: Send + Sync {
    // =========================================================================
    // Admin session
    // =========================================================================

    /// Log in with the shared admin password.
    async fn admin_login(&self, _password: &SecretString) -> Result<AdminLoginOutcome, RemoteError> {
        unavailable("adminLogin")
    }

    /// End an admin session.
    async fn admin_logout(&self, _token: &SessionToken) -> Result<bool, RemoteError> {
        unavailable("adminLogout")
    }

    /// Whether an admin token is still accepted.
    async fn validate_admin_session(&self, _token: &SessionToken) -> Result<bool, RemoteError> {
        unavailable("validateAdminSession")
    }

    // =========================================================================
    // Client session
    // =========================================================================

    /// Password login. `Ok(None)` means the credentials were rejected.
    async fn authenticate_client(
        &self,
        _identifier: &str,
        _password: &SecretString,
        _ip_address: Option<IpAddr>,
    ) -> Result<Option<String>, RemoteError> {
        unavailable("authenticateClient")
    }

    /// Send a one-time code to a mobile number.
    async fn send_otp(&self, _mobile: &MobileNumber) -> Result<(), RemoteError> {
        unavailable("sendOtp")
    }

    /// OTP login. `Ok(None)` means the code was rejected.
    async fn verify_otp_and_authenticate(
        &self,
        _mobile: &MobileNumber,
        _otp: &str,
        _ip_address: Option<IpAddr>,
    ) -> Result<Option<String>, RemoteError> {
        unavailable("verifyOtpAndAuthenticate")
    }

    /// Create an account and log it in.
    async fn client_signup(
        &self,
        _email: &Email,
        _password: &SecretString,
        _profile: &SignupProfile,
    ) -> Result<String, RemoteError> {
        unavailable("clientSignup")
    }

    /// End a client session.
    async fn client_logout(&self, _token: &SessionToken) -> Result<bool, RemoteError> {
        unavailable("clientLogout")
    }

    /// Fetch the account status behind a client token.
    async fn get_client_account_status(
        &self,
        _token: &SessionToken,
    ) -> Result<AccountStatusResponse, RemoteError> {
        unavailable("getClientAccountStatus")
    }

    /// Change the password of the account behind a client token.
    async fn change_client_password(
        &self,
        _token: &SessionToken,
        _current_password: &SecretString,
        _new_password: &SecretString,
    ) -> Result<(), RemoteError> {
        unavailable("changeClientPassword")
    }

    /// Recent logins of the account behind a client token.
    async fn get_client_login_history(
        &self,
        _token: &SessionToken,
    ) -> Result<Vec<LoginRecord>, RemoteError> {
        unavailable("getClientLoginHistory")
    }

    /// Shipments visible to a client.
    async fn list_client_shipments(
        &self,
        _token: &SessionToken,
    ) -> Result<Vec<Shipment>, RemoteError> {
        unavailable("listClientShipments")
    }

    /// Invoices visible to a client.
    async fn list_client_invoices(&self, _token: &SessionToken) -> Result<Vec<Invoice>, RemoteError> {
        unavailable("listClientInvoices")
    }

    // =========================================================================
    // Admin back office
    // =========================================================================

    /// All clients.
    async fn list_clients(&self, _token: &SessionToken) -> Result<Vec<ClientSummary>, RemoteError> {
        unavailable("listClients")
    }

    /// All shipments.
    async fn list_shipments(&self, _token: &SessionToken) -> Result<Vec<Shipment>, RemoteError> {
        unavailable("listShipments")
    }

    /// All invoices.
    async fn list_invoices(&self, _token: &SessionToken) -> Result<Vec<Invoice>, RemoteError> {
        unavailable("listInvoices")
    }

    /// Revenue aggregate.
    async fn get_revenue_summary(
        &self,
        _token: &SessionToken,
    ) -> Result<RevenueSummary, RemoteError> {
        unavailable("getRevenueSummary")
    }

    /// Create or update a client.
    async fn save_client(
        &self,
        _token: &SessionToken,
        _draft: &ClientDraft,
    ) -> Result<ClientSummary, RemoteError> {
        unavailable("saveClient")
    }

    /// Create or update a shipment.
    async fn save_shipment(
        &self,
        _token: &SessionToken,
        _draft: &ShipmentDraft,
    ) -> Result<Shipment, RemoteError> {
        unavailable("saveShipment")
    }

    /// Create or update an invoice.
    async fn save_invoice(
        &self,
        _token: &SessionToken,
        _draft: &InvoiceDraft,
    ) -> Result<Invoice, RemoteError> {
        unavailable("saveInvoice")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Bare;

    #[async_trait]
    impl PortalApi for Bare {}

    #[test]
    fn test_portal_api_is_object_safe() {
        fn _takes_boxed(_: Box<dyn PortalApi>) {}
    }

    #[tokio::test]
    async fn test_default_operations_are_unavailable() {
        let api: Box<dyn PortalApi> = Box::new(Bare);
        let err = api
            .admin_login(&SecretString::from("password"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RemoteError::Unavailable {
                operation: "adminLogin"
            }
        );
    }

    #[test]
    fn test_tagged_error_decoding() {
        let kind: ApiErrorKind = serde_json::from_str(r#"{"__kind__":"rateLimited"}"#).unwrap();
        assert_eq!(kind, ApiErrorKind::RateLimited);

        let kind: ApiErrorKind = serde_json::from_str(r#"{"__kind__":"quotaExceeded"}"#).unwrap();
        assert_eq!(kind, ApiErrorKind::Unknown);
    }

    #[test]
    fn test_admin_login_outcome_decoding() {
        let outcome: AdminLoginOutcome = serde_json::from_str(r#"{"success":"tok-1"}"#).unwrap();
        assert_eq!(outcome, AdminLoginOutcome::Success("tok-1".to_string()));

        let outcome: AdminLoginOutcome = serde_json::from_str(r#""invalidPassword""#).unwrap();
        assert_eq!(outcome, AdminLoginOutcome::InvalidPassword);
    }

    #[test]
    fn test_invalidates_session() {
        assert!(RemoteError::Rejected(ApiErrorKind::SessionExpired).invalidates_session());
        assert!(RemoteError::Rejected(ApiErrorKind::ExpiredCredential).invalidates_session());
        assert!(RemoteError::Message("Invalid or expired session".into()).invalidates_session());
        assert!(!RemoteError::Rejected(ApiErrorKind::RateLimited).invalidates_session());
        assert!(!RemoteError::Timeout.invalidates_session());
    }
}
