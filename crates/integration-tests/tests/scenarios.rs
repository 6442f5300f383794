//! End-to-end flows across both sessions.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use logiport_core::{ClientId, SignupProfile};
use logiport_integration_tests::{ADMIN_PASSWORD, FakePortal, context_with, fresh_context, stored};
use logiport_portal::SessionError;
use logiport_portal::session::{ClientGate, RevalidationOutcome};
use logiport_portal::storage::{ADMIN_TOKEN_KEY, CLIENT_TOKEN_KEY, MemoryStore};
use rust_decimal::Decimal;
use secrecy::SecretString;

fn secret(raw: &str) -> SecretString {
    SecretString::from(raw.to_string())
}

#[tokio::test]
async fn test_signup_then_first_password_change() {
    let (context, store, api) = fresh_context().await;
    let client = context.client();

    let token = client
        .signup(
            "  asha@kaveri.in ",
            &secret("welcome123"),
            Some(&secret("welcome123")),
            &SignupProfile {
                full_name: "Asha Menon".to_string(),
                company_name: Some("Kaveri Freight".to_string()),
                ..SignupProfile::default()
            },
        )
        .await
        .unwrap();
    let id = ClientId::new("CL100");
    api.add_shipment(&id, "LP000042");
    api.add_invoice(&id, "INV-00042", Decimal::new(99_900, 2));

    let ClientGate::PasswordChangeRequired(status) = client.gate().await.unwrap() else {
        panic!("expected the first-login gate");
    };
    assert_eq!(status.client_id, Some(id.clone()));
    assert!(matches!(
        client.invoices().await.unwrap_err(),
        SessionError::FirstLoginPending
    ));

    client
        .change_password(
            &secret("welcome123"),
            &secret("kaveri-2024"),
            &secret("kaveri-2024"),
        )
        .await
        .unwrap();

    assert!(client.gate().await.unwrap().is_ready());
    assert_eq!(client.token().await, Some(token.clone()));
    assert_eq!(
        stored(&store, CLIENT_TOKEN_KEY).as_deref(),
        Some(token.as_str())
    );
    assert_eq!(client.shipments().await.unwrap().len(), 1);
    assert_eq!(client.invoices().await.unwrap().len(), 1);

    client.logout().await.unwrap();
    client
        .login_with_password("asha@kaveri.in", &secret("kaveri-2024"))
        .await
        .unwrap();
    assert!(client.gate().await.unwrap().is_ready());
    assert_eq!(client.login_history().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_stale_admin_token_is_dropped_on_next_start() {
    let store = Arc::new(MemoryStore::new());
    let api = FakePortal::new();
    {
        let context = context_with(store.clone(), api.clone()).await;
        context.admin().login(&secret(ADMIN_PASSWORD)).await.unwrap();
    }
    api.revoke_admin_tokens();

    let context = context_with(store.clone(), api.clone()).await;

    assert!(!context.admin().is_authenticated().await);
    assert_eq!(stored(&store, ADMIN_TOKEN_KEY), None);
    assert_eq!(api.calls("validateAdminSession"), 1);
    assert_eq!(api.calls("adminLogout"), 0);
    assert_eq!(
        context.admin().revalidate().await.unwrap(),
        RevalidationOutcome::NoToken
    );
}

#[tokio::test]
async fn test_sessions_survive_restart_independently() {
    let store = Arc::new(MemoryStore::new());
    let api = FakePortal::new();
    api.add_account(None, Some("9876543210"), "password123", false);
    {
        let context = context_with(store.clone(), api.clone()).await;
        context.admin().login(&secret(ADMIN_PASSWORD)).await.unwrap();
        context
            .client()
            .login_with_password("9876543210", &secret("password123"))
            .await
            .unwrap();
    }

    let context = context_with(store.clone(), api.clone()).await;
    assert!(context.admin().is_authenticated().await);
    assert!(context.client().gate().await.unwrap().is_ready());

    context.logout_all().await.unwrap();
    assert_eq!(stored(&store, ADMIN_TOKEN_KEY), None);
    assert_eq!(stored(&store, CLIENT_TOKEN_KEY), None);
    assert_eq!(api.calls("adminLogout"), 1);
    assert_eq!(api.calls("clientLogout"), 1);
}
