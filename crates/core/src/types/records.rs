//! Read models fetched through a session and held in the query cache.
//!
//! These mirror the backend's response shapes; the portal never persists
//! them locally.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::ClientId;
use super::email::Email;
use super::mobile::MobileNumber;
use super::status::{InvoiceStatus, LoginMethod, ShipmentStatus};

/// One entry of a client's login history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRecord {
    pub logged_in_at: DateTime<Utc>,
    pub method: LoginMethod,
    pub ip_address: Option<String>,
}

/// A client as listed in the admin back office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub id: ClientId,
    pub name: String,
    pub email: Option<Email>,
    pub mobile: Option<MobileNumber>,
    pub company_name: Option<String>,
}

/// A shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub tracking_number: String,
    pub client_id: ClientId,
    pub status: ShipmentStatus,
    pub origin: String,
    pub destination: String,
    pub updated_at: DateTime<Utc>,
}

/// An invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_number: String,
    pub client_id: ClientId,
    pub amount: Decimal,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
}

/// Aggregate revenue shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub total_invoiced: Decimal,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
    pub invoice_count: u32,
}

/// Create-or-update payload for a client. `id: None` creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDraft {
    pub id: Option<ClientId>,
    pub name: String,
    pub email: Option<Email>,
    pub mobile: Option<MobileNumber>,
    pub company_name: Option<String>,
}

/// Create-or-update payload for a shipment. `tracking_number: None` creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentDraft {
    pub tracking_number: Option<String>,
    pub client_id: ClientId,
    pub status: ShipmentStatus,
    pub origin: String,
    pub destination: String,
}

/// Create-or-update payload for an invoice. `invoice_number: None` creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub invoice_number: Option<String>,
    pub client_id: ClientId,
    pub amount: Decimal,
    pub status: InvoiceStatus,
}
