use futures::future::join_all;
use patrol_client_core::{AppEvent, EventBus, GuardOutcome, SessionGuard};
use patrol_shared::uac::{PageAccess, Role};
use reqwest::{Method, StatusCode};
use serde_json::json;

use crate::helpers::{fixtures, no_cb, signed_in, signed_in_with_stale_token};

#[tokio::test]
async fn identity_is_fetched_once_and_cached() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::GET, "/auth/me", StatusCode::OK, fixtures::me_admin());
    let guard = SessionGuard::new(client, EventBus::default());

    // Act
    let first = guard
        .ensure_authenticated(PageAccess::AdminRequired, false)
        .await;
    let second = guard
        .ensure_authenticated(PageAccess::Authenticated, false)
        .await;

    // Assert
    assert!(matches!(first, GuardOutcome::Allowed(ref s) if s.role == Role::Admin));
    assert_eq!(first, second);
    assert_eq!(backend.count(Method::GET, "/auth/me"), 1);
}

#[tokio::test]
async fn concurrent_checks_share_one_request() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::GET, "/auth/me", StatusCode::OK, fixtures::me_user());
    let guard = SessionGuard::new(client, EventBus::default());

    // Act
    let outcomes = join_all(
        (0..4).map(|_| guard.ensure_authenticated(PageAccess::Authenticated, false)),
    )
    .await;

    // Assert
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, GuardOutcome::Allowed(_))));
    assert_eq!(backend.count(Method::GET, "/auth/me"), 1);
}

#[tokio::test]
async fn force_refresh_asks_again() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::GET, "/auth/me", StatusCode::OK, fixtures::me_user());
    let guard = SessionGuard::new(client, EventBus::default());

    // Act
    let _ = guard
        .ensure_authenticated(PageAccess::Authenticated, false)
        .await;
    let _ = guard
        .ensure_authenticated(PageAccess::Authenticated, true)
        .await;

    // Assert
    assert_eq!(backend.count(Method::GET, "/auth/me"), 2);
}

#[tokio::test]
async fn non_admin_is_sent_away_from_admin_pages() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::GET, "/auth/me", StatusCode::OK, fixtures::me_user());
    let guard = SessionGuard::new(client, EventBus::default());

    // Act
    let outcome = guard
        .ensure_authenticated(PageAccess::AdminRequired, false)
        .await;

    // Assert
    let GuardOutcome::RedirectAway(session) = outcome else {
        panic!("expected a redirect away, got {outcome:?}");
    };
    assert_eq!(session.role, Role::User);
    assert_eq!(guard.current(), Some(session));
}

#[tokio::test]
async fn expired_session_goes_to_login() {
    // Arrange
    let (backend, client) = signed_in_with_stale_token(false);
    backend.respond_json(Method::GET, "/auth/me", StatusCode::OK, fixtures::me_admin());
    let guard = SessionGuard::new(client, EventBus::default());

    // Act
    let outcome = guard
        .ensure_authenticated(PageAccess::Authenticated, false)
        .await;

    // Assert
    assert_eq!(outcome, GuardOutcome::RedirectToLogin);
    assert!(guard.current().is_none());
}

#[tokio::test]
async fn rejected_identity_goes_to_login() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(
        Method::GET,
        "/auth/me",
        StatusCode::OK,
        json!({"ok": false, "msg": "sesión inválida"}),
    );
    let guard = SessionGuard::new(client, EventBus::default());

    // Act
    let outcome = guard
        .ensure_authenticated(PageAccess::Authenticated, false)
        .await;

    // Assert
    assert_eq!(outcome, GuardOutcome::RedirectToLogin);
}

#[tokio::test]
async fn role_change_is_published() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_sequence(
        Method::GET,
        "/auth/me",
        vec![
            patrol_client_core::RawResponse::json(StatusCode::OK, &fixtures::me_user()),
            patrol_client_core::RawResponse::json(StatusCode::OK, &fixtures::me_user()),
            patrol_client_core::RawResponse::json(StatusCode::OK, &fixtures::me_admin()),
        ],
    );
    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let guard = SessionGuard::new(client, bus);

    // Act
    for _ in 0..3 {
        let _ = guard
            .ensure_authenticated(PageAccess::Authenticated, true)
            .await;
    }

    // Assert
    let roles: Vec<Role> = events
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            AppEvent::RoleChanged(session) => Some(session.role),
            _ => None,
        })
        .collect();
    // Unchanged role on the second check is not announced
    assert_eq!(roles, vec![Role::User, Role::Admin]);
}

#[tokio::test]
async fn sign_out_forgets_everything() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::GET, "/auth/me", StatusCode::OK, fixtures::me_admin());
    backend.respond_json(Method::POST, "/auth/logout", StatusCode::OK, json!({"ok": true}));
    let bus = EventBus::default();
    let guard = SessionGuard::new(client.clone(), bus.clone());
    let _ = guard
        .ensure_authenticated(PageAccess::Authenticated, false)
        .await;
    let mut events = bus.subscribe();

    // Act
    guard.sign_out();

    // Assert
    assert!(guard.current().is_none());
    assert!(client.token_store().get().is_none());
    assert_eq!(events.try_next(), Some(AppEvent::SignedOut));
}

#[tokio::test]
async fn ui_variant_delivers_through_channel() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::GET, "/auth/me", StatusCode::OK, fixtures::me_admin());
    let guard = SessionGuard::new(client, EventBus::default());

    // Act
    let rx = guard.ensure_authenticated_ui(PageAccess::AdminRequired, false, no_cb);
    let outcome = rx.await.unwrap();

    // Assert
    assert!(matches!(outcome, GuardOutcome::Allowed(_)));
}
