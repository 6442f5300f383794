//! Integration tests for the Logiport portal sessions.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p logiport-integration-tests
//! ```
//!
//! # Test Harness
//!
//! [`FakePortal`] is an in-memory [`PortalApi`] with just enough backend
//! behavior to drive the session managers end to end: accounts, tokens with
//! the backend's marker format, OTP codes, login history, shipments and
//! invoices. Individual operations can be overridden to simulate rejections,
//! outages and slow responses.
//!
//! # Test Categories
//!
//! - `admin_session` - admin login, logout and revalidation
//! - `client_session` - client login paths, token slot, first-login gate
//! - `query_cache` - cache keys and invalidation on session transitions
//! - `scenarios` - end-to-end flows across both sessions

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use logiport_core::{
    AccountStatusResponse, ClientDraft, ClientId, ClientSummary, Email, Invoice, InvoiceDraft,
    InvoiceStatus, LoginMethod, LoginRecord, MobileNumber, RevenueSummary, SessionToken, Shipment,
    ShipmentDraft, ShipmentStatus, SignupProfile,
};
use logiport_portal::SessionContext;
use logiport_portal::cache::QueryCache;
use logiport_portal::remote::{AdminLoginOutcome, ApiErrorKind, PortalApi, RemoteError};
use logiport_portal::storage::{MemoryStore, TokenStore};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};

/// Password accepted by [`FakePortal::admin_login`].
pub const ADMIN_PASSWORD: &str = "correct-horse";

/// Code every OTP sent by [`FakePortal`] carries.
pub const OTP_CODE: &str = "424242";

/// A client account known to the fake backend.
#[derive(Debug, Clone)]
struct Account {
    id: ClientId,
    name: String,
    email: Option<Email>,
    mobile: Option<MobileNumber>,
    company_name: Option<String>,
    password: String,
    first_login: bool,
    history: Vec<LoginRecord>,
}

impl Account {
    fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            mobile: self.mobile.clone(),
            company_name: self.company_name.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    accounts: Vec<Account>,
    admin_tokens: HashSet<String>,
    client_tokens: HashMap<String, ClientId>,
    pending_otps: HashMap<String, String>,
    shipments: Vec<Shipment>,
    invoices: Vec<Invoice>,
    sequence: u64,
    calls: HashMap<&'static str, usize>,
}

impl State {
    fn next(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn account_mut(&mut self, id: &ClientId) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| &account.id == id)
    }

    fn client_of(&self, token: &SessionToken) -> Result<ClientId, RemoteError> {
        self.client_tokens
            .get(token.as_str())
            .cloned()
            .ok_or_else(|| RemoteError::Message("Invalid or expired session".to_string()))
    }

    fn require_admin(&self, token: &SessionToken) -> Result<(), RemoteError> {
        if self.admin_tokens.contains(token.as_str()) {
            Ok(())
        } else {
            Err(RemoteError::Rejected(ApiErrorKind::SessionExpired))
        }
    }

    fn issue_client_token(
        &mut self,
        id: &ClientId,
        method: LoginMethod,
        ip_address: Option<IpAddr>,
    ) -> Option<String> {
        let n = self.next();
        let first_login = self.account_mut(id)?.first_login;
        let marker = match method {
            LoginMethod::Signup => "signup_",
            LoginMethod::Otp => "otp_",
            LoginMethod::Password if first_login => "firstlogin_",
            LoginMethod::Password => "session_",
        };
        let token = format!("{marker}{id}_{n:04}");
        self.client_tokens.insert(token.clone(), id.clone());
        self.account_mut(id)?.history.push(LoginRecord {
            logged_in_at: Utc::now(),
            method,
            ip_address: ip_address.map(|ip| ip.to_string()),
        });
        Some(token)
    }
}

/// Overrides applied on top of the default fake behavior.
#[derive(Debug, Default)]
struct Overrides {
    admin_login: Option<Result<AdminLoginOutcome, RemoteError>>,
    validate_admin: Option<Result<bool, RemoteError>>,
    validate_delay: Option<Duration>,
    logout_error: Option<RemoteError>,
    blank_client_tokens: bool,
}

/// In-memory portal backend.
#[derive(Debug, Default)]
pub struct FakePortal {
    state: Mutex<State>,
    overrides: Mutex<Overrides>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakePortal {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a client account. Returns its id.
    ///
    /// # Panics
    ///
    /// Panics if `email` or `mobile` is malformed.
    #[allow(clippy::unwrap_used)]
    pub fn add_account(
        &self,
        email: Option<&str>,
        mobile: Option<&str>,
        password: &str,
        first_login: bool,
    ) -> ClientId {
        let mut state = lock(&self.state);
        let id = ClientId::new(format!("CL{}", 100 + state.accounts.len()));
        state.accounts.push(Account {
            id: id.clone(),
            name: format!("Client {id}"),
            email: email.map(|email| Email::parse(email).unwrap()),
            mobile: mobile.map(|mobile| MobileNumber::parse(mobile).unwrap()),
            company_name: None,
            password: password.to_string(),
            first_login,
            history: Vec::new(),
        });
        id
    }

    /// Add a shipment for `client_id`.
    pub fn add_shipment(&self, client_id: &ClientId, tracking_number: &str) {
        lock(&self.state).shipments.push(Shipment {
            tracking_number: tracking_number.to_string(),
            client_id: client_id.clone(),
            status: ShipmentStatus::InTransit,
            origin: "Mumbai".to_string(),
            destination: "Pune".to_string(),
            updated_at: Utc::now(),
        });
    }

    /// Add an invoice for `client_id`.
    pub fn add_invoice(&self, client_id: &ClientId, invoice_number: &str, amount: Decimal) {
        lock(&self.state).invoices.push(Invoice {
            invoice_number: invoice_number.to_string(),
            client_id: client_id.clone(),
            amount,
            status: InvoiceStatus::Pending,
            issued_at: Utc::now(),
        });
    }

    /// Forget every issued client token, as if they all expired.
    pub fn expire_client_tokens(&self) {
        lock(&self.state).client_tokens.clear();
    }

    /// Forget every issued admin token.
    pub fn revoke_admin_tokens(&self) {
        lock(&self.state).admin_tokens.clear();
    }

    /// Whether the fake still accepts `token` as an admin token.
    #[must_use]
    pub fn admin_token_live(&self, token: &str) -> bool {
        lock(&self.state).admin_tokens.contains(token)
    }

    /// How many times `operation` was called.
    #[must_use]
    pub fn calls(&self, operation: &str) -> usize {
        lock(&self.state).calls.get(operation).copied().unwrap_or(0)
    }

    /// Make `adminLogin` return `result` instead of checking the password.
    pub fn override_admin_login(&self, result: Result<AdminLoginOutcome, RemoteError>) {
        lock(&self.overrides).admin_login = Some(result);
    }

    /// Make `validateAdminSession` return `result`.
    pub fn override_validate_admin(&self, result: Result<bool, RemoteError>) {
        lock(&self.overrides).validate_admin = Some(result);
    }

    /// Delay `validateAdminSession` by `delay`.
    pub fn delay_validate_admin(&self, delay: Duration) {
        lock(&self.overrides).validate_delay = Some(delay);
    }

    /// Make both logout operations fail with `error`.
    pub fn fail_logout(&self, error: RemoteError) {
        lock(&self.overrides).logout_error = Some(error);
    }

    /// Make client login operations succeed with a blank token.
    pub fn issue_blank_client_tokens(&self) {
        lock(&self.overrides).blank_client_tokens = true;
    }

    fn record(&self, operation: &'static str) {
        *lock(&self.state).calls.entry(operation).or_default() += 1;
    }

    fn blank_client_tokens(&self) -> bool {
        lock(&self.overrides).blank_client_tokens
    }

    fn logout_error(&self) -> Option<RemoteError> {
        lock(&self.overrides).logout_error.clone()
    }
}

#[async_trait]
impl PortalApi for FakePortal {
    async fn admin_login(&self, password: &SecretString) -> Result<AdminLoginOutcome, RemoteError> {
        self.record("adminLogin");
        if let Some(result) = lock(&self.overrides).admin_login.clone() {
            return result;
        }

        if password.expose_secret() != ADMIN_PASSWORD {
            return Ok(AdminLoginOutcome::InvalidPassword);
        }
        let mut state = lock(&self.state);
        let token = format!("admin_{:04}", state.next());
        state.admin_tokens.insert(token.clone());
        Ok(AdminLoginOutcome::Success(token))
    }

    async fn admin_logout(&self, token: &SessionToken) -> Result<bool, RemoteError> {
        self.record("adminLogout");
        if let Some(err) = self.logout_error() {
            return Err(err);
        }
        Ok(lock(&self.state).admin_tokens.remove(token.as_str()))
    }

    async fn validate_admin_session(&self, token: &SessionToken) -> Result<bool, RemoteError> {
        self.record("validateAdminSession");
        let delay = lock(&self.overrides).validate_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(result) = lock(&self.overrides).validate_admin.clone() {
            return result;
        }
        Ok(lock(&self.state).admin_tokens.contains(token.as_str()))
    }

    async fn authenticate_client(
        &self,
        identifier: &str,
        password: &SecretString,
        ip_address: Option<IpAddr>,
    ) -> Result<Option<String>, RemoteError> {
        self.record("authenticateClient");
        if self.blank_client_tokens() {
            return Ok(Some("   ".to_string()));
        }

        let mut state = lock(&self.state);
        let id = state
            .accounts
            .iter()
            .find(|account| {
                let matches_email = account
                    .email
                    .as_ref()
                    .is_some_and(|email| email.as_str() == identifier);
                let matches_mobile = account
                    .mobile
                    .as_ref()
                    .is_some_and(|mobile| mobile.as_str() == identifier);
                (matches_email || matches_mobile) && account.password == password.expose_secret()
            })
            .map(|account| account.id.clone());

        Ok(id.and_then(|id| state.issue_client_token(&id, LoginMethod::Password, ip_address)))
    }

    async fn send_otp(&self, mobile: &MobileNumber) -> Result<(), RemoteError> {
        self.record("sendOtp");
        let mut state = lock(&self.state);
        let linked = state
            .accounts
            .iter()
            .any(|account| account.mobile.as_ref() == Some(mobile));
        if !linked {
            return Err(RemoteError::Rejected(ApiErrorKind::NotLinked));
        }
        state
            .pending_otps
            .insert(mobile.as_str().to_string(), OTP_CODE.to_string());
        Ok(())
    }

    async fn verify_otp_and_authenticate(
        &self,
        mobile: &MobileNumber,
        otp: &str,
        ip_address: Option<IpAddr>,
    ) -> Result<Option<String>, RemoteError> {
        self.record("verifyOtpAndAuthenticate");
        if self.blank_client_tokens() {
            return Ok(Some(String::new()));
        }

        let mut state = lock(&self.state);
        if state.pending_otps.get(mobile.as_str()).map(String::as_str) != Some(otp) {
            return Ok(None);
        }
        state.pending_otps.remove(mobile.as_str());
        let id = state
            .accounts
            .iter()
            .find(|account| account.mobile.as_ref() == Some(mobile))
            .map(|account| account.id.clone());
        Ok(id.and_then(|id| state.issue_client_token(&id, LoginMethod::Otp, ip_address)))
    }

    async fn client_signup(
        &self,
        email: &Email,
        password: &SecretString,
        profile: &SignupProfile,
    ) -> Result<String, RemoteError> {
        self.record("clientSignup");
        let mut state = lock(&self.state);
        if state
            .accounts
            .iter()
            .any(|account| account.email.as_ref() == Some(email))
        {
            return Err(RemoteError::Rejected(ApiErrorKind::AlreadyExists));
        }

        let id = ClientId::new(format!("CL{}", 100 + state.accounts.len()));
        state.accounts.push(Account {
            id: id.clone(),
            name: profile.full_name.clone(),
            email: Some(email.clone()),
            mobile: profile.mobile.clone(),
            company_name: profile.company_name.clone(),
            password: password.expose_secret().to_string(),
            first_login: true,
            history: Vec::new(),
        });
        state
            .issue_client_token(&id, LoginMethod::Signup, None)
            .ok_or_else(|| RemoteError::Message("Account creation failed".to_string()))
    }

    async fn client_logout(&self, token: &SessionToken) -> Result<bool, RemoteError> {
        self.record("clientLogout");
        if let Some(err) = self.logout_error() {
            return Err(err);
        }
        Ok(lock(&self.state)
            .client_tokens
            .remove(token.as_str())
            .is_some())
    }

    async fn get_client_account_status(
        &self,
        token: &SessionToken,
    ) -> Result<AccountStatusResponse, RemoteError> {
        self.record("getClientAccountStatus");
        let mut state = lock(&self.state);
        let id = state.client_of(token)?;
        let account = state
            .account_mut(&id)
            .ok_or(RemoteError::Rejected(ApiErrorKind::NotFound))?;
        Ok(AccountStatusResponse {
            is_first_login: account.first_login,
            role: "client".to_string(),
            client_id: None,
        })
    }

    async fn change_client_password(
        &self,
        token: &SessionToken,
        current_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), RemoteError> {
        self.record("changeClientPassword");
        let mut state = lock(&self.state);
        let id = state.client_of(token)?;
        let account = state
            .account_mut(&id)
            .ok_or(RemoteError::Rejected(ApiErrorKind::NotFound))?;
        if account.password != current_password.expose_secret() {
            return Err(RemoteError::Rejected(ApiErrorKind::InvalidPassword));
        }
        account.password = new_password.expose_secret().to_string();
        account.first_login = false;
        Ok(())
    }

    async fn get_client_login_history(
        &self,
        token: &SessionToken,
    ) -> Result<Vec<LoginRecord>, RemoteError> {
        self.record("getClientLoginHistory");
        let mut state = lock(&self.state);
        let id = state.client_of(token)?;
        Ok(state
            .account_mut(&id)
            .map(|account| account.history.clone())
            .unwrap_or_default())
    }

    async fn list_client_shipments(
        &self,
        token: &SessionToken,
    ) -> Result<Vec<Shipment>, RemoteError> {
        self.record("listClientShipments");
        let state = lock(&self.state);
        let id = state.client_of(token)?;
        Ok(state
            .shipments
            .iter()
            .filter(|shipment| shipment.client_id == id)
            .cloned()
            .collect())
    }

    async fn list_client_invoices(&self, token: &SessionToken) -> Result<Vec<Invoice>, RemoteError> {
        self.record("listClientInvoices");
        let state = lock(&self.state);
        let id = state.client_of(token)?;
        Ok(state
            .invoices
            .iter()
            .filter(|invoice| invoice.client_id == id)
            .cloned()
            .collect())
    }

    async fn list_clients(&self, token: &SessionToken) -> Result<Vec<ClientSummary>, RemoteError> {
        self.record("listClients");
        let state = lock(&self.state);
        state.require_admin(token)?;
        Ok(state.accounts.iter().map(Account::summary).collect())
    }

    async fn list_shipments(&self, token: &SessionToken) -> Result<Vec<Shipment>, RemoteError> {
        self.record("listShipments");
        let state = lock(&self.state);
        state.require_admin(token)?;
        Ok(state.shipments.clone())
    }

    async fn list_invoices(&self, token: &SessionToken) -> Result<Vec<Invoice>, RemoteError> {
        self.record("listInvoices");
        let state = lock(&self.state);
        state.require_admin(token)?;
        Ok(state.invoices.clone())
    }

    async fn get_revenue_summary(
        &self,
        token: &SessionToken,
    ) -> Result<RevenueSummary, RemoteError> {
        self.record("getRevenueSummary");
        let state = lock(&self.state);
        state.require_admin(token)?;

        let billable = state
            .invoices
            .iter()
            .filter(|invoice| invoice.status != InvoiceStatus::Cancelled);
        let total_invoiced: Decimal = billable.clone().map(|invoice| invoice.amount).sum();
        let total_paid: Decimal = billable
            .clone()
            .filter(|invoice| invoice.status == InvoiceStatus::Paid)
            .map(|invoice| invoice.amount)
            .sum();
        Ok(RevenueSummary {
            total_invoiced,
            total_paid,
            outstanding: total_invoiced - total_paid,
            invoice_count: u32::try_from(billable.count()).unwrap_or(u32::MAX),
        })
    }

    async fn save_client(
        &self,
        token: &SessionToken,
        draft: &ClientDraft,
    ) -> Result<ClientSummary, RemoteError> {
        self.record("saveClient");
        let mut state = lock(&self.state);
        state.require_admin(token)?;

        if let Some(id) = &draft.id {
            let account = state
                .account_mut(id)
                .ok_or(RemoteError::Rejected(ApiErrorKind::NotFound))?;
            account.name.clone_from(&draft.name);
            account.email.clone_from(&draft.email);
            account.mobile.clone_from(&draft.mobile);
            account.company_name.clone_from(&draft.company_name);
            return Ok(account.summary());
        }

        let id = ClientId::new(format!("CL{}", 100 + state.accounts.len()));
        let account = Account {
            id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            mobile: draft.mobile.clone(),
            company_name: draft.company_name.clone(),
            password: "changeme123".to_string(),
            first_login: true,
            history: Vec::new(),
        };
        let summary = account.summary();
        state.accounts.push(account);
        Ok(summary)
    }

    async fn save_shipment(
        &self,
        token: &SessionToken,
        draft: &ShipmentDraft,
    ) -> Result<Shipment, RemoteError> {
        self.record("saveShipment");
        let mut state = lock(&self.state);
        state.require_admin(token)?;

        let tracking_number = match &draft.tracking_number {
            Some(number) => number.clone(),
            None => format!("LP{:06}", state.next()),
        };
        let shipment = Shipment {
            tracking_number: tracking_number.clone(),
            client_id: draft.client_id.clone(),
            status: draft.status,
            origin: draft.origin.clone(),
            destination: draft.destination.clone(),
            updated_at: Utc::now(),
        };
        state
            .shipments
            .retain(|existing| existing.tracking_number != tracking_number);
        state.shipments.push(shipment.clone());
        Ok(shipment)
    }

    async fn save_invoice(
        &self,
        token: &SessionToken,
        draft: &InvoiceDraft,
    ) -> Result<Invoice, RemoteError> {
        self.record("saveInvoice");
        let mut state = lock(&self.state);
        state.require_admin(token)?;

        let invoice_number = match &draft.invoice_number {
            Some(number) => number.clone(),
            None => format!("INV-{:05}", state.next()),
        };
        let invoice = Invoice {
            invoice_number: invoice_number.clone(),
            client_id: draft.client_id.clone(),
            amount: draft.amount,
            status: draft.status,
            issued_at: Utc::now(),
        };
        state
            .invoices
            .retain(|existing| existing.invoice_number != invoice_number);
        state.invoices.push(invoice.clone());
        Ok(invoice)
    }
}

/// A session context over a fresh [`MemoryStore`], with `api` attached.
///
/// # Panics
///
/// Panics if the context cannot be built.
#[allow(clippy::unwrap_used)]
pub async fn context_with(
    store: Arc<MemoryStore>,
    api: Arc<FakePortal>,
) -> SessionContext {
    let context = SessionContext::init(store, QueryCache::default()).unwrap();
    context.attach_api(api).await.unwrap();
    context
}

/// A session context over an empty store, with a fresh [`FakePortal`].
pub async fn fresh_context() -> (SessionContext, Arc<MemoryStore>, Arc<FakePortal>) {
    let store = Arc::new(MemoryStore::new());
    let api = FakePortal::new();
    let context = context_with(store.clone(), api.clone()).await;
    (context, store, api)
}

/// Read a stored token value directly.
///
/// # Panics
///
/// Panics if the store fails.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn stored(store: &MemoryStore, key: &str) -> Option<String> {
    store.get(key).unwrap()
}
