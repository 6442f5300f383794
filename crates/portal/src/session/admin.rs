//! Admin session: one shared password, one live token.
//!
//! Only a rejected password is reported as a credential problem. Every other
//! login failure (no handle, transport errors, malformed responses, a
//! missing endpoint, an empty token on success) surfaces as
//! `ServiceUnavailable` and is logged, so infrastructure trouble is never
//! mistaken for a wrong password.

use std::sync::atomic::{AtomicUsize, Ordering};

use logiport_core::{
    ClientDraft, ClientSummary, Invoice, InvoiceDraft, RevenueSummary, SessionToken, Shipment,
    ShipmentDraft,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument, warn};

use super::SessionCore;
use crate::cache::{AdminMutation, QueryKey};
use crate::error::{SessionError, ValidationError};
use crate::remote::AdminLoginOutcome;

const INVALID_PASSWORD_MESSAGE: &str = "Invalid admin password. Please try again.";

/// Result of an admin token revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevalidationOutcome {
    /// No backend handle is attached.
    NoHandle,
    /// No admin token is held.
    NoToken,
    /// The backend still accepts the token.
    Valid,
    /// The token was rejected and has been cleared.
    Invalidated,
    /// The handle or token changed mid-check; the result was dropped.
    Superseded,
}

/// Counts in-flight revalidations for the lifetime of the guard.
struct ValidatingGuard<'a>(&'a AtomicUsize);

impl<'a> ValidatingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ValidatingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The admin session.
#[derive(Debug)]
pub struct AdminSession {
    core: SessionCore,
    validating: AtomicUsize,
}

impl AdminSession {
    pub(crate) const fn new(core: SessionCore) -> Self {
        Self {
            core,
            validating: AtomicUsize::new(0),
        }
    }

    /// Log in with the admin password.
    ///
    /// On success the new token replaces any previous one. On a rejected
    /// password the previous token is left untouched.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty password
    /// - `AuthenticationFailed` if the backend rejects the password
    /// - `ServiceUnavailable` for any other failure
    #[instrument(skip_all)]
    pub async fn login(&self, password: &SecretString) -> Result<SessionToken, SessionError> {
        if password.expose_secret().is_empty() {
            return Err(ValidationError::EmptyPassword.into());
        }

        let api = self.core.api().await?;
        let outcome = match api.admin_login(password).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "Admin login failed");
                return Err(SessionError::ServiceUnavailable(err.to_string()));
            }
        };

        match outcome {
            AdminLoginOutcome::InvalidPassword => {
                info!("Admin password rejected");
                Err(SessionError::AuthenticationFailed(
                    INVALID_PASSWORD_MESSAGE.to_string(),
                ))
            }
            AdminLoginOutcome::Success(raw) => match self.core.slot.set(&raw).await {
                Ok(token) => {
                    info!(token = %token.fingerprint(), "Admin logged in");
                    Ok(token)
                }
                Err(SessionError::Token(_)) => {
                    warn!("Backend returned an empty admin token");
                    Err(SessionError::ServiceUnavailable(
                        "empty token from adminLogin".to_string(),
                    ))
                }
                Err(err) => Err(err),
            },
        }
    }

    /// Log out.
    ///
    /// The remote logout is best-effort; the local token and every cached
    /// query are cleared regardless of its outcome.
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
            match api.admin_logout(&token).await {
                Ok(true) => debug!("Remote admin logout acknowledged"),
                Ok(false) => debug!("Remote admin logout declined"),
                Err(err) => warn!(error = %err, "Remote admin logout failed"),
            }
        }

        let result = self.core.teardown().await;
        info!("Admin logged out");
        result
    }

    /// Check the held token against the backend, clearing it if rejected.
    ///
    /// A negative answer and a failed check are treated alike. The result is
    /// dropped if the backend handle was replaced while the check ran, and
    /// the token is only cleared if it is still the one that was checked.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if a rejected token cannot be removed.
    #[instrument(skip_all)]
    pub async fn revalidate(&self) -> Result<RevalidationOutcome, SessionError> {
        let generation = self.core.remote.generation();
        let Some(api) = self.core.remote.current().await else {
            return Ok(RevalidationOutcome::NoHandle);
        };
        let Some(token) = self.core.slot.current().await else {
            return Ok(RevalidationOutcome::NoToken);
        };

        let _guard = ValidatingGuard::enter(&self.validating);
        let result = api.validate_admin_session(&token).await;

        if self.core.remote.generation() != generation {
            debug!("Backend handle replaced during revalidation");
            return Ok(RevalidationOutcome::Superseded);
        }

        match result {
            Ok(true) => {
                debug!("Admin session still valid");
                return Ok(RevalidationOutcome::Valid);
            }
            Ok(false) => info!("Admin session rejected by backend"),
            Err(err) => warn!(error = %err, "Admin session check failed"),
        }

        if self.core.slot.clear_if_current(&token).await? {
            self.core.cache.on_logout().await;
            Ok(RevalidationOutcome::Invalidated)
        } else {
            Ok(RevalidationOutcome::Superseded)
        }
    }

    /// Whether an admin token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.core.slot.is_present().await
    }

    /// Whether a revalidation is in flight.
    pub fn is_validating(&self) -> bool {
        self.validating.load(Ordering::SeqCst) > 0
    }

    /// The held token, if any.
    pub async fn token(&self) -> Option<SessionToken> {
        self.core.slot.current().await
    }

    // =========================================================================
    // Back office queries
    // =========================================================================

    /// All clients.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a token, otherwise any remote error.
    #[instrument(skip_all)]
    pub async fn clients(&self) -> Result<Vec<ClientSummary>, SessionError> {
        let token = self.core.slot.require().await?;
        let result = self
            .core
            .cached(QueryKey::Clients, &token, |api, token| async move {
                api.list_clients(&token).await
            })
            .await;
        self.core.settle(&token, result).await
    }

    /// All shipments.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a token, otherwise any remote error.
    #[instrument(skip_all)]
    pub async fn shipments(&self) -> Result<Vec<Shipment>, SessionError> {
        let token = self.core.slot.require().await?;
        let result = self
            .core
            .cached(QueryKey::Shipments, &token, |api, token| async move {
                api.list_shipments(&token).await
            })
            .await;
        self.core.settle(&token, result).await
    }

    /// All invoices.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a token, otherwise any remote error.
    #[instrument(skip_all)]
    pub async fn invoices(&self) -> Result<Vec<Invoice>, SessionError> {
        let token = self.core.slot.require().await?;
        let result = self
            .core
            .cached(QueryKey::Invoices, &token, |api, token| async move {
                api.list_invoices(&token).await
            })
            .await;
        self.core.settle(&token, result).await
    }

    /// Revenue aggregate.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a token, otherwise any remote error.
    #[instrument(skip_all)]
    pub async fn revenue(&self) -> Result<RevenueSummary, SessionError> {
        let token = self.core.slot.require().await?;
        let result = self
            .core
            .cached(QueryKey::Revenue, &token, |api, token| async move {
                api.get_revenue_summary(&token).await
            })
            .await;
        self.core.settle(&token, result).await
    }

    // =========================================================================
    // Back office mutations
    // =========================================================================

    /// Create or update a client.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a token, otherwise any remote error.
    #[instrument(skip_all)]
    pub async fn save_client(&self, draft: &ClientDraft) -> Result<ClientSummary, SessionError> {
        let token = self.core.slot.require().await?;
        let api = self.core.api().await?;
        let result = api.save_client(&token, draft).await.map_err(SessionError::from);
        let saved = self.core.settle(&token, result).await?;
        self.core.cache.on_admin_mutation(AdminMutation::Client).await;
        Ok(saved)
    }

    /// Create or update a shipment.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a token, otherwise any remote error.
    #[instrument(skip_all)]
    pub async fn save_shipment(&self, draft: &ShipmentDraft) -> Result<Shipment, SessionError> {
        let token = self.core.slot.require().await?;
        let api = self.core.api().await?;
        let result = api.save_shipment(&token, draft).await.map_err(SessionError::from);
        let saved = self.core.settle(&token, result).await?;
        self.core
            .cache
            .on_admin_mutation(AdminMutation::Shipment)
            .await;
        Ok(saved)
    }

    /// Create or update an invoice.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a token, otherwise any remote error.
    #[instrument(skip_all)]
    pub async fn save_invoice(&self, draft: &InvoiceDraft) -> Result<Invoice, SessionError> {
        let token = self.core.slot.require().await?;
        let api = self.core.api().await?;
        let result = api.save_invoice(&token, draft).await.map_err(SessionError::from);
        let saved = self.core.settle(&token, result).await?;
        self.core
            .cache
            .on_admin_mutation(AdminMutation::Invoice)
            .await;
        Ok(saved)
    }
}
