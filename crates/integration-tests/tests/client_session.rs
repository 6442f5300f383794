//! Integration tests for the client session.

#![allow(clippy::unwrap_used)]

use logiport_core::{ClientId, LoginMethod, SignupProfile};
use logiport_integration_tests::{OTP_CODE, fresh_context, stored};
use logiport_portal::remote::RemoteError;
use logiport_portal::session::ClientGate;
use logiport_portal::storage::CLIENT_TOKEN_KEY;
use logiport_portal::{ErrorCategory, SessionError, ValidationError};
use secrecy::SecretString;

fn secret(raw: &str) -> SecretString {
    SecretString::from(raw.to_string())
}

fn profile(name: &str) -> SignupProfile {
    SignupProfile {
        full_name: name.to_string(),
        ..SignupProfile::default()
    }
}

// =============================================================================
// Token slot
// =============================================================================

#[tokio::test]
async fn test_blank_token_leaves_session_unchanged() {
    let (context, store, _api) = fresh_context().await;
    context.client().set_token("existing").await.unwrap();

    for blank in ["", "   ", "\t\n"] {
        let err = context.client().set_token(blank).await.unwrap_err();
        assert!(matches!(err, SessionError::Token(_)));
    }

    assert_eq!(
        stored(&store, CLIENT_TOKEN_KEY).as_deref(),
        Some("existing")
    );
}

#[tokio::test]
async fn test_token_is_trimmed_before_storing() {
    let (context, store, _api) = fresh_context().await;

    let token = context.client().set_token("  abc123  ").await.unwrap();

    assert_eq!(token.as_str(), "abc123");
    assert_eq!(stored(&store, CLIENT_TOKEN_KEY).as_deref(), Some("abc123"));
    assert!(context.client().is_authenticated().await);
}

#[tokio::test]
async fn test_clear_token_is_idempotent() {
    let (context, store, api) = fresh_context().await;
    context.client().set_token("abc123").await.unwrap();

    context.client().clear_token().await.unwrap();
    context.client().clear_token().await.unwrap();

    assert!(!context.client().is_authenticated().await);
    assert_eq!(stored(&store, CLIENT_TOKEN_KEY), None);
    assert_eq!(api.calls("clientLogout"), 0);
}

// =============================================================================
// Login paths
// =============================================================================

#[tokio::test]
async fn test_password_login_by_email_and_mobile() {
    let (context, store, api) = fresh_context().await;
    api.add_account(
        Some("ops@acme.in"),
        Some("9876543210"),
        "password123",
        false,
    );

    let by_email = context
        .client()
        .login_with_password("  ops@acme.in ", &secret("password123"))
        .await
        .unwrap();
    assert!(by_email.as_str().starts_with("session_CL100_"));

    let by_mobile = context
        .client()
        .login_with_password("9876543210", &secret("password123"))
        .await
        .unwrap();
    assert_ne!(by_email, by_mobile);
    assert_eq!(
        stored(&store, CLIENT_TOKEN_KEY).as_deref(),
        Some(by_mobile.as_str())
    );
}

#[tokio::test]
async fn test_rejected_credentials() {
    let (context, _store, api) = fresh_context().await;
    api.add_account(Some("ops@acme.in"), None, "password123", false);

    let err = context
        .client()
        .login_with_password("ops@acme.in", &secret("password124"))
        .await
        .unwrap_err();

    let classified = err.classify();
    assert_eq!(classified.category, ErrorCategory::AuthenticationFailed);
    assert_eq!(
        classified.message,
        "Invalid credentials. Please check your details and try again."
    );
    assert!(!context.client().is_authenticated().await);
}

#[tokio::test]
async fn test_malformed_identifier_never_reaches_backend() {
    let (context, _store, api) = fresh_context().await;

    for identifier in ["", "ops@", "12345", "not an identifier"] {
        let err = context
            .client()
            .login_with_password(identifier, &secret("password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)), "{identifier}");
    }

    let err = context
        .client()
        .login_with_password("ops@acme.in", &secret(""))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::EmptyPassword)
    ));

    assert_eq!(api.calls("authenticateClient"), 0);
}

#[tokio::test]
async fn test_blank_token_from_backend_is_service_unavailable() {
    let (context, store, api) = fresh_context().await;
    api.add_account(Some("ops@acme.in"), Some("9876543210"), "password123", false);
    api.issue_blank_client_tokens();

    let err = context
        .client()
        .login_with_password("ops@acme.in", &secret("password123"))
        .await
        .unwrap_err();
    assert_eq!(err.classify().category, ErrorCategory::ServiceUnavailable);

    context.client().send_otp("9876543210").await.unwrap();
    let err = context
        .client()
        .verify_otp("9876543210", OTP_CODE)
        .await
        .unwrap_err();
    assert_eq!(err.classify().category, ErrorCategory::ServiceUnavailable);

    assert!(!context.client().is_authenticated().await);
    assert_eq!(stored(&store, CLIENT_TOKEN_KEY), None);
}

#[tokio::test]
async fn test_otp_login() {
    let (context, _store, api) = fresh_context().await;
    api.add_account(None, Some("9876543210"), "password123", false);

    let mobile = context.client().send_otp(" 9876543210 ").await.unwrap();
    assert_eq!(mobile.as_str(), "9876543210");

    let err = context
        .client()
        .verify_otp("9876543210", "000000")
        .await
        .unwrap_err();
    assert_eq!(
        err.classify().message,
        "Invalid verification code. Please try again."
    );

    let token = context
        .client()
        .verify_otp("9876543210", OTP_CODE)
        .await
        .unwrap();
    assert!(token.as_str().starts_with("otp_CL100_"));

    let history = context.client().login_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history.first().map(|record| record.method), Some(LoginMethod::Otp));
}

#[tokio::test]
async fn test_otp_to_email_requires_mobile() {
    let (context, _store, api) = fresh_context().await;

    let err = context.client().send_otp("ops@acme.in").await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::MobileRequired)
    ));
    assert_eq!(
        err.classify().message,
        "Please enter a 10-digit mobile number"
    );
    assert_eq!(api.calls("sendOtp"), 0);
}

#[tokio::test]
async fn test_otp_to_unlinked_mobile() {
    let (context, _store, _api) = fresh_context().await;

    let err = context.client().send_otp("9876543210").await.unwrap_err();

    assert!(matches!(err, SessionError::Remote(_)));
    assert_eq!(err.classify().category, ErrorCategory::NotLinked);
}

#[tokio::test]
async fn test_empty_otp_is_rejected_locally() {
    let (context, _store, api) = fresh_context().await;

    let err = context
        .client()
        .verify_otp("9876543210", "  ")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::EmptyOtp)
    ));
    assert_eq!(api.calls("verifyOtpAndAuthenticate"), 0);
}

#[tokio::test]
async fn test_signup_validation() {
    let (context, _store, api) = fresh_context().await;
    let client = context.client();

    let err = client
        .signup("9876543210", &secret("password123"), None, &profile("Asha"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::EmailRequired)
    ));

    let err = client
        .signup("asha@acme.in", &secret("short"), None, &profile("Asha"))
        .await
        .unwrap_err();
    assert_eq!(err.classify().message, "Password must be at least 8 characters");

    let err = client
        .signup(
            "asha@acme.in",
            &secret("password123"),
            Some(&secret("password124")),
            &profile("Asha"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.classify().message, "Passwords do not match");

    assert_eq!(api.calls("clientSignup"), 0);
}

#[tokio::test]
async fn test_signup_logs_in_with_first_login_pending() {
    let (context, _store, _api) = fresh_context().await;

    let token = context
        .client()
        .signup(
            "asha@acme.in",
            &secret("password123"),
            Some(&secret("password123")),
            &profile("Asha"),
        )
        .await
        .unwrap();

    assert!(token.as_str().starts_with("signup_"));
    let status = context.client().account_status().await.unwrap();
    assert!(status.is_first_login);
    assert_eq!(status.client_id, Some(ClientId::new("CL100")));
}

#[tokio::test]
async fn test_duplicate_signup() {
    let (context, _store, api) = fresh_context().await;
    api.add_account(Some("asha@acme.in"), None, "password123", false);

    let err = context
        .client()
        .signup("asha@acme.in", &secret("password123"), None, &profile("Asha"))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Remote(_)));
    assert!(!context.client().is_authenticated().await);
}

// =============================================================================
// Expiry and the first-login gate
// =============================================================================

#[tokio::test]
async fn test_expired_token_clears_session() {
    let (context, store, api) = fresh_context().await;
    api.add_account(Some("ops@acme.in"), None, "password123", false);
    context
        .client()
        .login_with_password("ops@acme.in", &secret("password123"))
        .await
        .unwrap();
    api.expire_client_tokens();

    let err = context.client().account_status().await.unwrap_err();

    assert!(err.invalidates_session());
    assert_eq!(err.classify().category, ErrorCategory::SessionExpired);
    assert!(!context.client().is_authenticated().await);
    assert_eq!(stored(&store, CLIENT_TOKEN_KEY), None);
    assert!(matches!(
        context.client().gate().await.unwrap(),
        ClientGate::SignedOut
    ));
}

#[tokio::test]
async fn test_rejected_query_clears_session_despite_cached_status() {
    let (context, store, api) = fresh_context().await;
    let id = api.add_account(Some("ops@acme.in"), None, "password123", false);
    api.add_shipment(&id, "LP000001");
    context
        .client()
        .login_with_password("ops@acme.in", &secret("password123"))
        .await
        .unwrap();
    context.client().shipments().await.unwrap();
    api.expire_client_tokens();

    let err = context.client().login_history().await.unwrap_err();

    assert_eq!(api.calls("getClientAccountStatus"), 1);
    assert_eq!(err.classify().category, ErrorCategory::SessionExpired);
    assert!(!context.client().is_authenticated().await);
    assert_eq!(stored(&store, CLIENT_TOKEN_KEY), None);
    assert_eq!(context.cache().entry_count().await, 0);
    assert_eq!(context.client().gate().await.unwrap(), ClientGate::SignedOut);
}

#[tokio::test]
async fn test_rejected_password_change_clears_session() {
    let (context, store, api) = fresh_context().await;
    api.add_account(Some("ops@acme.in"), None, "welcome123", true);
    context
        .client()
        .login_with_password("ops@acme.in", &secret("welcome123"))
        .await
        .unwrap();
    api.expire_client_tokens();

    let err = context
        .client()
        .change_password(
            &secret("welcome123"),
            &secret("newpassword1"),
            &secret("newpassword1"),
        )
        .await
        .unwrap_err();

    assert!(err.invalidates_session());
    assert!(!context.client().is_authenticated().await);
    assert_eq!(stored(&store, CLIENT_TOKEN_KEY), None);
}

#[tokio::test]
async fn test_first_login_blocks_queries() {
    let (context, _store, api) = fresh_context().await;
    let id = api.add_account(Some("ops@acme.in"), None, "welcome123", true);
    api.add_shipment(&id, "LP000001");
    let token = context
        .client()
        .login_with_password("ops@acme.in", &secret("welcome123"))
        .await
        .unwrap();
    assert!(token.as_str().starts_with("firstlogin_CL100_"));

    assert!(matches!(
        context.client().gate().await.unwrap(),
        ClientGate::PasswordChangeRequired(_)
    ));
    let err = context.client().shipments().await.unwrap_err();
    assert!(matches!(err, SessionError::FirstLoginPending));
    assert_eq!(api.calls("listClientShipments"), 0);
}

#[tokio::test]
async fn test_change_password_validates_before_remote_call() {
    let (context, _store, api) = fresh_context().await;
    api.add_account(Some("ops@acme.in"), None, "welcome123", true);
    context
        .client()
        .login_with_password("ops@acme.in", &secret("welcome123"))
        .await
        .unwrap();

    let cases = [
        ("", "newpassword1", "newpassword1"),
        ("welcome123", "short", "short"),
        ("welcome123", "newpassword1", "newpassword2"),
    ];
    for (current, new, confirm) in cases {
        let err = context
            .client()
            .change_password(&secret(current), &secret(new), &secret(confirm))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
    }

    assert_eq!(api.calls("changeClientPassword"), 0);
}

#[tokio::test]
async fn test_change_password_with_wrong_current_password() {
    let (context, _store, api) = fresh_context().await;
    api.add_account(Some("ops@acme.in"), None, "welcome123", true);
    context
        .client()
        .login_with_password("ops@acme.in", &secret("welcome123"))
        .await
        .unwrap();

    let err = context
        .client()
        .change_password(
            &secret("welcome124"),
            &secret("newpassword1"),
            &secret("newpassword1"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.classify().category, ErrorCategory::AuthenticationFailed);
    assert!(context.client().is_authenticated().await);
}

#[tokio::test]
async fn test_change_password_requires_token() {
    let (context, _store, api) = fresh_context().await;

    let err = context
        .client()
        .change_password(
            &secret("welcome123"),
            &secret("newpassword1"),
            &secret("newpassword1"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::NotAuthenticated));
    assert_eq!(api.calls("changeClientPassword"), 0);
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_clears_even_when_remote_fails() {
    let (context, store, api) = fresh_context().await;
    api.add_account(Some("ops@acme.in"), None, "password123", false);
    context
        .client()
        .login_with_password("ops@acme.in", &secret("password123"))
        .await
        .unwrap();
    context.client().account_status().await.unwrap();
    api.fail_logout(RemoteError::Timeout);

    context.client().logout().await.unwrap();

    assert!(!context.client().is_authenticated().await);
    assert_eq!(stored(&store, CLIENT_TOKEN_KEY), None);
    assert_eq!(context.cache().entry_count().await, 0);
    assert_eq!(api.calls("clientLogout"), 1);
}
