//! HTTP implementation of [`PortalApi`].
//!
//! Every operation is a `POST {api_url}/api/{operation}` with a JSON object
//! of arguments. Responses use a single envelope:
//!
//! ```text
//! {"ok": <value>}
//! {"err": {"__kind__": "rateLimited"}}
//! {"err": "Free-text failure"}
//! ```

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;

use logiport_core::{
    AccountStatusResponse, ClientDraft, ClientSummary, Email, Invoice, InvoiceDraft, LoginRecord,
    MobileNumber, RevenueSummary, SessionToken, Shipment, ShipmentDraft, SignupProfile,
};

use super::{AdminLoginOutcome, ApiErrorKind, PortalApi, RemoteError};

/// Response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Envelope<T> {
    Ok(T),
    Err(WireError),
}

/// Error payload inside the envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireError {
    Tagged(ApiErrorKind),
    Message(String),
}

impl From<WireError> for RemoteError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Tagged(kind) => Self::Rejected(kind),
            WireError::Message(message) => Self::Message(message),
        }
    }
}

/// Portal backend client over HTTP.
#[derive(Clone)]
pub struct HttpPortalApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPortalApi {
    /// Create a client for the backend at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: api_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, operation: &str) -> String {
        format!("{}/api/{operation}", self.base_url)
    }

    /// Call `operation` with `args` and decode the envelope.
    #[instrument(skip(self, args))]
    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        args: Value,
    ) -> Result<T, RemoteError> {
        let response = self
            .client
            .post(self.endpoint(operation))
            .json(&args)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteError::Unavailable { operation });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::Rejected(ApiErrorKind::RateLimited));
        }

        let body = response.text().await.map_err(map_transport_error)?;

        // Error envelopes may come with a non-2xx status; try them first.
        match decode_envelope::<T>(&body) {
            Ok(value) => Ok(value),
            Err(RemoteError::Decode(reason)) if !status.is_success() => {
                debug!(%status, reason = %reason, "Non-envelope error response");
                Err(RemoteError::UnexpectedResponse(format!(
                    "HTTP {status}: {}",
                    body.chars().take(200).collect::<String>()
                )))
            }
            Err(err) => Err(err),
        }
    }
}

/// Decode a response body envelope.
fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    match envelope {
        Envelope::Ok(value) => Ok(value),
        Envelope::Err(err) => Err(err.into()),
    }
}

fn map_transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout
    } else if err.is_decode() {
        RemoteError::Decode(err.to_string())
    } else {
        RemoteError::Network(err.to_string())
    }
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn admin_login(&self, password: &SecretString) -> Result<AdminLoginOutcome, RemoteError> {
        self.call(
            "adminLogin",
            json!({ "password": password.expose_secret() }),
        )
        .await
    }

    async fn admin_logout(&self, token: &SessionToken) -> Result<bool, RemoteError> {
        self.call("adminLogout", json!({ "token": token.as_str() }))
            .await
    }

    async fn validate_admin_session(&self, token: &SessionToken) -> Result<bool, RemoteError> {
        self.call("validateAdminSession", json!({ "token": token.as_str() }))
            .await
    }

    async fn authenticate_client(
        &self,
        identifier: &str,
        password: &SecretString,
        ip_address: Option<IpAddr>,
    ) -> Result<Option<String>, RemoteError> {
        self.call(
            "authenticateClient",
            json!({
                "identifier": identifier,
                "password": password.expose_secret(),
                "ipAddress": ip_address.map(|ip| ip.to_string()),
            }),
        )
        .await
    }

    async fn send_otp(&self, mobile: &MobileNumber) -> Result<(), RemoteError> {
        self.call("sendOtp", json!({ "mobile": mobile.as_str() }))
            .await
    }

    async fn verify_otp_and_authenticate(
        &self,
        mobile: &MobileNumber,
        otp: &str,
        ip_address: Option<IpAddr>,
    ) -> Result<Option<String>, RemoteError> {
        self.call(
            "verifyOtpAndAuthenticate",
            json!({
                "mobile": mobile.as_str(),
                "otp": otp,
                "ipAddress": ip_address.map(|ip| ip.to_string()),
            }),
        )
        .await
    }

    async fn client_signup(
        &self,
        email: &Email,
        password: &SecretString,
        profile: &SignupProfile,
    ) -> Result<String, RemoteError> {
        self.call(
            "clientSignup",
            json!({
                "email": email.as_str(),
                "password": password.expose_secret(),
                "profile": profile,
            }),
        )
        .await
    }

    async fn client_logout(&self, token: &SessionToken) -> Result<bool, RemoteError> {
        self.call("clientLogout", json!({ "token": token.as_str() }))
            .await
    }

    async fn get_client_account_status(
        &self,
        token: &SessionToken,
    ) -> Result<AccountStatusResponse, RemoteError> {
        self.call("getClientAccountStatus", json!({ "token": token.as_str() }))
            .await
    }

    async fn change_client_password(
        &self,
        token: &SessionToken,
        current_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), RemoteError> {
        self.call(
            "changeClientPassword",
            json!({
                "token": token.as_str(),
                "currentPassword": current_password.expose_secret(),
                "newPassword": new_password.expose_secret(),
            }),
        )
        .await
    }

    async fn get_client_login_history(
        &self,
        token: &SessionToken,
    ) -> Result<Vec<LoginRecord>, RemoteError> {
        self.call("getClientLoginHistory", json!({ "token": token.as_str() }))
            .await
    }

    async fn list_client_shipments(
        &self,
        token: &SessionToken,
    ) -> Result<Vec<Shipment>, RemoteError> {
        self.call("listClientShipments", json!({ "token": token.as_str() }))
            .await
    }

    async fn list_client_invoices(&self, token: &SessionToken) -> Result<Vec<Invoice>, RemoteError> {
        self.call("listClientInvoices", json!({ "token": token.as_str() }))
            .await
    }

    async fn list_clients(&self, token: &SessionToken) -> Result<Vec<ClientSummary>, RemoteError> {
        self.call("listClients", json!({ "token": token.as_str() }))
            .await
    }

    async fn list_shipments(&self, token: &SessionToken) -> Result<Vec<Shipment>, RemoteError> {
        self.call("listShipments", json!({ "token": token.as_str() }))
            .await
    }

    async fn list_invoices(&self, token: &SessionToken) -> Result<Vec<Invoice>, RemoteError> {
        self.call("listInvoices", json!({ "token": token.as_str() }))
            .await
    }

    async fn get_revenue_summary(
        &self,
        token: &SessionToken,
    ) -> Result<RevenueSummary, RemoteError> {
        self.call("getRevenueSummary", json!({ "token": token.as_str() }))
            .await
    }

    async fn save_client(
        &self,
        token: &SessionToken,
        draft: &ClientDraft,
    ) -> Result<ClientSummary, RemoteError> {
        self.call(
            "saveClient",
            json!({ "token": token.as_str(), "client": draft }),
        )
        .await
    }

    async fn save_shipment(
        &self,
        token: &SessionToken,
        draft: &ShipmentDraft,
    ) -> Result<Shipment, RemoteError> {
        self.call(
            "saveShipment",
            json!({ "token": token.as_str(), "shipment": draft }),
        )
        .await
    }

    async fn save_invoice(
        &self,
        token: &SessionToken,
        draft: &InvoiceDraft,
    ) -> Result<Invoice, RemoteError> {
        self.call(
            "saveInvoice",
            json!({ "token": token.as_str(), "invoice": draft }),
        )
        .await
    }
}
