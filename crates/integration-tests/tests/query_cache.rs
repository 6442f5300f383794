//! Integration tests for query caching across session transitions.

#![allow(clippy::unwrap_used)]

use logiport_core::{ClientDraft, InvoiceDraft, InvoiceStatus, ShipmentDraft, ShipmentStatus};
use logiport_integration_tests::{ADMIN_PASSWORD, fresh_context};
use logiport_portal::cache::QueryKey;
use rust_decimal::Decimal;
use secrecy::SecretString;

fn secret(raw: &str) -> SecretString {
    SecretString::from(raw.to_string())
}

#[tokio::test]
async fn test_repeated_queries_hit_cache() {
    let (context, _store, api) = fresh_context().await;
    context.admin().login(&secret(ADMIN_PASSWORD)).await.unwrap();

    for _ in 0..3 {
        context.admin().clients().await.unwrap();
        context.admin().revenue().await.unwrap();
    }

    assert_eq!(api.calls("listClients"), 1);
    assert_eq!(api.calls("getRevenueSummary"), 1);
}

#[tokio::test]
async fn test_entries_are_keyed_by_token() {
    let (context, _store, api) = fresh_context().await;
    api.add_account(Some("ops@acme.in"), None, "password123", false);

    let first = context
        .client()
        .login_with_password("ops@acme.in", &secret("password123"))
        .await
        .unwrap();
    context.client().account_status().await.unwrap();
    assert!(
        context
            .cache()
            .get(&QueryKey::AccountStatus(first.clone()))
            .await
            .is_some()
    );

    let second = context
        .client()
        .login_with_password("ops@acme.in", &secret("password123"))
        .await
        .unwrap();
    assert!(
        context
            .cache()
            .get(&QueryKey::AccountStatus(first))
            .await
            .is_none()
    );

    context.client().account_status().await.unwrap();
    assert_eq!(api.calls("getClientAccountStatus"), 2);
    assert!(
        context
            .cache()
            .get(&QueryKey::AccountStatus(second))
            .await
            .is_some()
    );
}

#[tokio::test]
async fn test_login_drops_account_queries_only() {
    let (context, _store, api) = fresh_context().await;
    context.admin().login(&secret(ADMIN_PASSWORD)).await.unwrap();
    context.admin().shipments().await.unwrap();
    api.add_account(None, Some("9876543210"), "password123", false);

    context
        .client()
        .login_with_password("9876543210", &secret("password123"))
        .await
        .unwrap();
    context.admin().shipments().await.unwrap();

    assert_eq!(api.calls("listShipments"), 1);
}

#[tokio::test]
async fn test_password_change_refreshes_account_status() {
    let (context, _store, api) = fresh_context().await;
    api.add_account(Some("ops@acme.in"), None, "welcome123", true);
    context
        .client()
        .login_with_password("ops@acme.in", &secret("welcome123"))
        .await
        .unwrap();
    assert!(context.client().account_status().await.unwrap().is_first_login);

    context
        .client()
        .change_password(
            &secret("welcome123"),
            &secret("newpassword1"),
            &secret("newpassword1"),
        )
        .await
        .unwrap();

    assert!(!context.client().account_status().await.unwrap().is_first_login);
    assert_eq!(api.calls("getClientAccountStatus"), 2);
}

#[tokio::test]
async fn test_logout_empties_cache_for_both_sessions() {
    let (context, _store, api) = fresh_context().await;
    api.add_account(Some("ops@acme.in"), None, "password123", false);
    context.admin().login(&secret(ADMIN_PASSWORD)).await.unwrap();
    context
        .client()
        .login_with_password("ops@acme.in", &secret("password123"))
        .await
        .unwrap();
    context.admin().clients().await.unwrap();
    context.client().account_status().await.unwrap();
    context.client().shipments().await.unwrap();
    assert!(context.cache().entry_count().await >= 3);

    context.client().logout().await.unwrap();

    assert_eq!(context.cache().entry_count().await, 0);
    assert!(context.admin().is_authenticated().await);
    context.admin().clients().await.unwrap();
    assert_eq!(api.calls("listClients"), 2);
}

#[tokio::test]
async fn test_invoice_save_refreshes_revenue() {
    let (context, _store, api) = fresh_context().await;
    let id = api.add_account(Some("ops@acme.in"), None, "password123", false);
    api.add_invoice(&id, "INV-00001", Decimal::new(125_000, 2));
    context.admin().login(&secret(ADMIN_PASSWORD)).await.unwrap();

    let before = context.admin().revenue().await.unwrap();
    context.admin().clients().await.unwrap();
    assert_eq!(before.invoice_count, 1);

    context
        .admin()
        .save_invoice(&InvoiceDraft {
            invoice_number: None,
            client_id: id,
            amount: Decimal::new(50_000, 2),
            status: InvoiceStatus::Paid,
        })
        .await
        .unwrap();

    let after = context.admin().revenue().await.unwrap();
    assert_eq!(after.invoice_count, 2);
    assert_eq!(after.total_paid, Decimal::new(50_000, 2));
    assert_eq!(api.calls("getRevenueSummary"), 2);

    context.admin().clients().await.unwrap();
    assert_eq!(api.calls("listClients"), 1);
}

#[tokio::test]
async fn test_shipment_and_client_saves() {
    let (context, _store, api) = fresh_context().await;
    let id = api.add_account(Some("ops@acme.in"), None, "password123", false);
    context.admin().login(&secret(ADMIN_PASSWORD)).await.unwrap();
    context.admin().shipments().await.unwrap();
    context.admin().clients().await.unwrap();
    context.admin().invoices().await.unwrap();

    let shipment = context
        .admin()
        .save_shipment(&ShipmentDraft {
            tracking_number: None,
            client_id: id,
            status: ShipmentStatus::Booked,
            origin: "Chennai".to_string(),
            destination: "Kochi".to_string(),
        })
        .await
        .unwrap();
    let shipments = context.admin().shipments().await.unwrap();
    assert!(
        shipments
            .iter()
            .any(|listed| listed.tracking_number == shipment.tracking_number)
    );
    assert_eq!(api.calls("listShipments"), 2);

    context
        .admin()
        .save_client(&ClientDraft {
            id: None,
            name: "Kaveri Freight".to_string(),
            email: None,
            mobile: None,
            company_name: Some("Kaveri Freight Pvt Ltd".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(context.admin().clients().await.unwrap().len(), 2);
    assert_eq!(api.calls("listClients"), 2);

    context.admin().invoices().await.unwrap();
    assert_eq!(api.calls("listInvoices"), 1);
}
