//! Client session.
//!
//! ```text
//! SignedOut --password | otp | signup--> PasswordChangeRequired
//!                                        | change_password
//!                                        v
//! SignedOut <--logout | token rejected-- Ready
//! ```
//!
//! Accounts created by an operator start with `is_first_login` set, and every
//! gated query fails with `FirstLoginPending` until the password is changed.
//! Changing the password keeps the token; it only refreshes the account
//! status. An expired token is detected lazily, when the account status
//! fetch reports it.

use std::net::IpAddr;

use logiport_core::{
    ClientAccountStatus, Email, Invoice, LoginIdentifier, LoginMethod, LoginRecord, MobileNumber,
    SessionToken, Shipment, SignupProfile,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument, warn};

use super::SessionCore;
use crate::cache::QueryKey;
use crate::error::{SessionError, ValidationError, check_new_password};

const INVALID_CREDENTIALS_MESSAGE: &str =
    "Invalid credentials. Please check your details and try again.";
const INVALID_OTP_MESSAGE: &str = "Invalid verification code. Please try again.";

/// What the client portal may show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientGate {
    /// No client token is held.
    SignedOut,
    /// Signed in, but the password must be changed before anything else.
    PasswordChangeRequired(ClientAccountStatus),
    /// Signed in with full access.
    Ready(ClientAccountStatus),
}

impl ClientGate {
    /// Whether gated client views may be shown.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// The client session.
///
/// Any token-bearing call the backend rejects as invalid or expired clears
/// the token and purges the cache before the error is returned.
#[derive(Debug)]
pub struct ClientSession {
    core: SessionCore,
    client_ip: Option<IpAddr>,
}

impl ClientSession {
    pub(crate) const fn new(core: SessionCore) -> Self {
        Self {
            core,
            client_ip: None,
        }
    }

    pub(crate) const fn set_client_ip(&mut self, ip: Option<IpAddr>) {
        self.client_ip = ip;
    }

    /// Store a token issued elsewhere, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Token` for a blank token; the session is left
    /// unchanged.
    pub async fn set_token(&self, raw: &str) -> Result<SessionToken, SessionError> {
        self.core.slot.set(raw).await
    }

    /// Forget the token locally, without a remote logout.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be written.
    pub async fn clear_token(&self) -> Result<(), SessionError> {
        self.core.slot.clear().await
    }

    /// Whether a client token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.core.slot.is_present().await
    }

    /// The held token, if any.
    pub async fn token(&self) -> Option<SessionToken> {
        self.core.slot.current().await
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Log in with an email or mobile number and a password.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed identifier or empty password
    /// - `AuthenticationFailed` if the backend rejects the credentials
    /// - `ServiceUnavailable` if the backend declares success with an empty
    ///   token
    /// - `Remote` for any other backend failure
    #[instrument(skip_all)]
    pub async fn login_with_password(
        &self,
        identifier: &str,
        password: &SecretString,
    ) -> Result<SessionToken, SessionError> {
        let identifier = LoginIdentifier::parse(identifier).map_err(ValidationError::from)?;
        if password.expose_secret().is_empty() {
            return Err(ValidationError::EmptyPassword.into());
        }

        let api = self.core.api().await?;
        match api
            .authenticate_client(identifier.as_str(), password, self.client_ip)
            .await?
        {
            Some(raw) => self.establish(&raw, LoginMethod::Password).await,
            None => {
                info!(email = identifier.is_email(), "Client credentials rejected");
                Err(SessionError::AuthenticationFailed(
                    INVALID_CREDENTIALS_MESSAGE.to_string(),
                ))
            }
        }
    }

    /// Send a one-time code to a mobile number.
    ///
    /// # Errors
    ///
    /// Returns `Validation` unless `mobile` is a 10-digit number, otherwise
    /// any backend failure.
    #[instrument(skip_all)]
    pub async fn send_otp(&self, mobile: &str) -> Result<MobileNumber, SessionError> {
        let mobile = parse_mobile(mobile)?;
        let api = self.core.api().await?;
        api.send_otp(&mobile).await?;
        info!(mobile = %mobile.masked(), "OTP sent");
        Ok(mobile)
    }

    /// Log in with a one-time code.
    ///
    /// # Errors
    ///
    /// - `Validation` for a malformed mobile number or empty code
    /// - `AuthenticationFailed` if the backend rejects the code
    /// - `ServiceUnavailable` if the backend declares success with an empty
    ///   token
    /// - `Remote` for any other backend failure
    #[instrument(skip_all)]
    pub async fn verify_otp(&self, mobile: &str, otp: &str) -> Result<SessionToken, SessionError> {
        let mobile = parse_mobile(mobile)?;
        let otp = otp.trim();
        if otp.is_empty() {
            return Err(ValidationError::EmptyOtp.into());
        }

        let api = self.core.api().await?;
        match api
            .verify_otp_and_authenticate(&mobile, otp, self.client_ip)
            .await?
        {
            Some(raw) => self.establish(&raw, LoginMethod::Otp).await,
            None => {
                info!(mobile = %mobile.masked(), "OTP rejected");
                Err(SessionError::AuthenticationFailed(
                    INVALID_OTP_MESSAGE.to_string(),
                ))
            }
        }
    }

    /// Create an account and log it in.
    ///
    /// # Errors
    ///
    /// - `Validation` unless `email` is an email address, or if the password
    ///   is too short or does not match `confirm`
    /// - `ServiceUnavailable` if the backend returns an empty token
    /// - `Remote` for any other backend failure
    #[instrument(skip_all)]
    pub async fn signup(
        &self,
        email: &str,
        password: &SecretString,
        confirm: Option<&SecretString>,
        profile: &SignupProfile,
    ) -> Result<SessionToken, SessionError> {
        let email = Email::parse(email).map_err(|_| ValidationError::EmailRequired)?;
        check_new_password(
            password.expose_secret(),
            confirm.map(|confirm| confirm.expose_secret()),
        )?;

        let api = self.core.api().await?;
        let raw = api.client_signup(&email, password, profile).await?;
        self.establish(&raw, LoginMethod::Signup).await
    }

    async fn establish(&self, raw: &str, method: LoginMethod) -> Result<SessionToken, SessionError> {
        let token = match self.core.slot.set(raw).await {
            Ok(token) => token,
            Err(SessionError::Token(_)) => {
                warn!(?method, "Backend returned an empty client token");
                return Err(SessionError::ServiceUnavailable(format!(
                    "empty token from {method:?} login"
                )));
            }
            Err(err) => return Err(err),
        };

        self.core.cache.on_login().await;
        info!(?method, token = %token.fingerprint(), "Client logged in");
        Ok(token)
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Account status for the held token.
    ///
    /// If the backend reports the token invalid or expired, the session is
    /// cleared before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a token, otherwise any remote error.
    #[instrument(skip_all)]
    pub async fn account_status(&self) -> Result<ClientAccountStatus, SessionError> {
        let token = self.core.slot.require().await?;
        let result = self
            .core
            .cached(QueryKey::AccountStatus, &token, |api, token| async move {
                api.get_client_account_status(&token)
                    .await
                    .map(|response| ClientAccountStatus::from_response(response, &token))
            })
            .await;
        self.core.settle(&token, result).await
    }

    /// Where the client stands.
    ///
    /// # Errors
    ///
    /// Returns any account status error other than an expired session, which
    /// yields `SignedOut`.
    pub async fn gate(&self) -> Result<ClientGate, SessionError> {
        if !self.is_authenticated().await {
            return Ok(ClientGate::SignedOut);
        }

        match self.account_status().await {
            Ok(status) if status.is_first_login => Ok(ClientGate::PasswordChangeRequired(status)),
            Ok(status) => Ok(ClientGate::Ready(status)),
            Err(SessionError::NotAuthenticated) => Ok(ClientGate::SignedOut),
            Err(err) if err.invalidates_session() => Ok(ClientGate::SignedOut),
            Err(err) => Err(err),
        }
    }

    /// Change the password of the signed-in account.
    ///
    /// The new password is checked locally before any remote call. The token
    /// stays valid; only the cached account status is dropped.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty current password, a new password shorter
    ///   than 8 characters, or a confirmation mismatch
    /// - `NotAuthenticated` without a token
    /// - `Remote` for any backend failure
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        current: &SecretString,
        new: &SecretString,
        confirm: &SecretString,
    ) -> Result<(), SessionError> {
        if current.expose_secret().is_empty() {
            return Err(ValidationError::EmptyPassword.into());
        }
        check_new_password(new.expose_secret(), Some(confirm.expose_secret()))?;

        let token = self.core.slot.require().await?;
        let api = self.core.api().await?;
        let result = api
            .change_client_password(&token, current, new)
            .await
            .map_err(SessionError::from);
        self.core.settle(&token, result).await?;

        self.core.cache.on_account_changed().await;
        info!("Client password changed");
        Ok(())
    }

    /// Log out.
    ///
    /// Remote logout failures are logged; the local token and every cached
    /// query are cleared regardless.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the token cannot be removed from the
    /// store. The in-memory session and the cache are cleared anyway.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<(), SessionError> {
        if let Some(token) = self.core.slot.current().await
            && let Some(api) = self.core.remote.current().await
        {
            match api.client_logout(&token).await {
                Ok(acknowledged) => debug!(acknowledged, "Remote client logout finished"),
                Err(err) => warn!(error = %err, "Remote client logout failed"),
            }
        }

        let result = self.core.teardown().await;
        info!("Client logged out");
        result
    }

    // =========================================================================
    // Gated queries
    // =========================================================================

    /// Recent logins of the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns `FirstLoginPending` until the password is changed,
    /// `NotAuthenticated` without a token, otherwise any remote error.
    #[instrument(skip_all)]
    pub async fn login_history(&self) -> Result<Vec<LoginRecord>, SessionError> {
        let token = self.ready_token().await?;
        let result = self
            .core
            .cached(QueryKey::LoginHistory, &token, |api, token| async move {
                api.get_client_login_history(&token).await
            })
            .await;
        self.core.settle(&token, result).await
    }

    /// Shipments of the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns `FirstLoginPending` until the password is changed,
    /// `NotAuthenticated` without a token, otherwise any remote error.
    #[instrument(skip_all)]
    pub async fn shipments(&self) -> Result<Vec<Shipment>, SessionError> {
        let token = self.ready_token().await?;
        let result = self
            .core
            .cached(QueryKey::ClientShipments, &token, |api, token| async move {
                api.list_client_shipments(&token).await
            })
            .await;
        self.core.settle(&token, result).await
    }

    /// Invoices of the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns `FirstLoginPending` until the password is changed,
    /// `NotAuthenticated` without a token, otherwise any remote error.
    #[instrument(skip_all)]
    pub async fn invoices(&self) -> Result<Vec<Invoice>, SessionError> {
        let token = self.ready_token().await?;
        let result = self
            .core
            .cached(QueryKey::ClientInvoices, &token, |api, token| async move {
                api.list_client_invoices(&token).await
            })
            .await;
        self.core.settle(&token, result).await
    }

    async fn ready_token(&self) -> Result<SessionToken, SessionError> {
        match self.gate().await? {
            ClientGate::Ready(_) => self.core.slot.require().await,
            ClientGate::PasswordChangeRequired(_) => Err(SessionError::FirstLoginPending),
            ClientGate::SignedOut => Err(SessionError::NotAuthenticated),
        }
    }
}

fn parse_mobile(input: &str) -> Result<MobileNumber, ValidationError> {
    if input.contains('@') {
        return Err(ValidationError::MobileRequired);
    }
    MobileNumber::parse(input).map_err(|err| ValidationError::Identifier(err.into()))
}

#[cfg(test)]
mod tests {
    use logiport_core::IdentifierError;

    use super::*;

    #[test]
    fn test_parse_mobile_rejects_email() {
        assert_eq!(
            parse_mobile("user@example.com"),
            Err(ValidationError::MobileRequired)
        );
    }

    #[test]
    fn test_parse_mobile_length() {
        assert_eq!(
            parse_mobile("98765"),
            Err(ValidationError::Identifier(IdentifierError::MobileLength))
        );
        assert_eq!(parse_mobile(" 9876543210 ").map(|m| m.masked().len()), Ok(10));
    }
}
