//! Integration tests for refresh-on-401 over real HTTP.
//!
//! Run with: `cargo test -p bidii-integration-tests --test token_refresh`

use std::time::Duration;

use bidii_core::{Class, Route, SessionKey};
use bidii_integration_tests::{ADMIN_EMAIL, Harness};
use bidii_portal::ApiErrorKind;
use bidii_portal::error::SESSION_EXPIRED;
use secrecy::ExposeSecret;

fn stored_access(harness: &Harness) -> Option<String> {
    harness
        .client
        .session()
        .access_token()
        .expect("read")
        .map(|token| token.expose_secret().to_owned())
}

// =============================================================================
// Refresh and replay
// =============================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_replayed() {
    let harness = Harness::signed_in(ADMIN_EMAIL).await.expect("harness");
    harness.backend.seed_classes(&["Form 1", "Form 2"]);
    harness.backend.expire_access_token();

    let classes = harness.client.list::<Class>().await.expect("list");
    assert_eq!(classes.len(), 2);

    assert_eq!(harness.backend.refresh_calls(), 1);
    let attempts: Vec<_> = harness
        .backend
        .requests()
        .into_iter()
        .filter(|request| request.path == "create_class/")
        .map(|request| request.bearer)
        .collect();
    assert_eq!(
        attempts,
        vec![Some("access-1".to_owned()), Some("access-2".to_owned())]
    );
    assert_eq!(stored_access(&harness).as_deref(), Some("access-2"));
    assert_eq!(harness.navigator.history(), vec![Route::Dashboard]);
}

#[tokio::test]
async fn test_refresh_request_carries_no_bearer() {
    let harness = Harness::signed_in(ADMIN_EMAIL).await.expect("harness");
    harness.backend.expire_access_token();

    harness.client.list::<Class>().await.expect("list");

    let refresh = harness
        .backend
        .requests()
        .into_iter()
        .find(|request| request.path == "token/refresh/")
        .expect("refresh sent");
    assert_eq!(refresh.bearer, None);
}

#[tokio::test]
async fn test_valid_token_needs_no_refresh() {
    let harness = Harness::signed_in(ADMIN_EMAIL).await.expect("harness");

    harness.client.list::<Class>().await.expect("list");
    harness.client.list::<Class>().await.expect("list");

    assert_eq!(harness.backend.refresh_calls(), 0);
    assert_eq!(harness.backend.calls_to("create_class/"), 2);
}

// =============================================================================
// Refresh failure
// =============================================================================

#[tokio::test]
async fn test_rejected_refresh_purges_session_and_redirects_to_login() {
    let harness = Harness::signed_in(ADMIN_EMAIL).await.expect("harness");
    harness.backend.expire_access_token();
    harness.backend.reject_refresh();

    let err = harness.client.list::<Class>().await.expect_err("expired");
    assert_eq!(err.kind, ApiErrorKind::SessionExpired);
    assert_eq!(err.message, SESSION_EXPIRED);

    assert_eq!(harness.backend.refresh_calls(), 1);
    assert_eq!(harness.backend.calls_to("create_class/"), 1);
    assert!(harness.stored_session().expect("session file").is_empty());
    assert_eq!(harness.navigator.last(), Some(Route::Login));
}

#[tokio::test]
async fn test_missing_refresh_token_skips_refresh_endpoint() {
    let harness = Harness::signed_in(ADMIN_EMAIL).await.expect("harness");
    harness
        .client
        .session()
        .write(SessionKey::RefreshToken, "")
        .expect("write");
    harness.backend.expire_access_token();

    let err = harness.client.list::<Class>().await.expect_err("expired");
    assert!(err.is_session_expired());

    assert_eq!(harness.backend.refresh_calls(), 0);
    assert!(harness.stored_session().expect("session file").is_empty());
    assert_eq!(harness.navigator.last(), Some(Route::Login));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rejections_share_one_refresh() {
    let harness = Harness::signed_in(ADMIN_EMAIL).await.expect("harness");
    harness.backend.seed_classes(&["Form 1"]);
    harness.backend.delay_refresh(Duration::from_millis(150));
    harness.backend.expire_access_token();

    let (a, b, c) = tokio::join!(
        harness.client.list::<Class>(),
        harness.client.list::<Class>(),
        harness.client.list::<Class>(),
    );
    for result in [a, b, c] {
        assert_eq!(result.expect("list").len(), 1);
    }

    assert_eq!(harness.backend.refresh_calls(), 1);
    assert_eq!(stored_access(&harness).as_deref(), Some("access-2"));
}
