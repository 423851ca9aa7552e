use patrol_client_core::LoginOutcome;
use patrol_shared::req_args::LoginReqArgs;
use patrol_test_helper::FakeBackend;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret as _;
use serde_json::json;

use crate::helpers::fixtures;

fn login_args() -> LoginReqArgs {
    LoginReqArgs::new("admin@example.com", "secreto".to_string().into())
}

#[tokio::test]
async fn login_success_stores_token() {
    // Arrange
    let backend = FakeBackend::new();
    backend.respond_json(
        Method::POST,
        "/auth/login",
        StatusCode::OK,
        fixtures::login_ok("abc"),
    );
    let client = backend.client();

    // Act
    let outcome = client.login(login_args()).await.unwrap();

    // Assert
    assert_eq!(outcome, LoginOutcome::Success);
    assert_eq!(client.token_store().get().unwrap().expose_secret(), "abc");
    let sent = backend.last_request(Method::POST, "/auth/login").unwrap();
    assert_eq!(
        sent.body,
        Some(json!({"email": "admin@example.com", "password": "secreto"}))
    );
}

#[tokio::test]
async fn login_rejected_with_server_message() {
    // Arrange
    let backend = FakeBackend::new();
    backend.respond_json(
        Method::POST,
        "/auth/login",
        StatusCode::UNAUTHORIZED,
        json!({"ok": false, "message": "Credenciales inválidas"}),
    );
    let client = backend.client();

    // Act
    let outcome = client.login(login_args()).await.unwrap();

    // Assert
    assert_eq!(
        outcome,
        LoginOutcome::Rejected("Credenciales inválidas".to_string())
    );
    assert!(client.token_store().get().is_none());
    // A failed login never triggers a refresh
    assert_eq!(backend.count(Method::POST, "/auth/refresh"), 0);
}

#[tokio::test]
async fn login_rejected_without_message() {
    // Arrange
    let backend = FakeBackend::new();
    backend.respond_json(Method::POST, "/auth/login", StatusCode::FORBIDDEN, json!({}));
    let client = backend.client();

    // Act
    let outcome = client.login(login_args()).await.unwrap();

    // Assert
    assert_eq!(outcome, LoginOutcome::Rejected("HTTP 403".to_string()));
}

#[tokio::test]
async fn login_not_ok_body_is_rejected() {
    // Arrange
    let backend = FakeBackend::new();
    backend.respond_json(
        Method::POST,
        "/auth/login",
        StatusCode::OK,
        json!({"ok": false, "msg": "Usuario inactivo"}),
    );
    let client = backend.client();

    // Act
    let outcome = client.login(login_args()).await.unwrap();

    // Assert
    assert_eq!(outcome, LoginOutcome::Rejected("Usuario inactivo".to_string()));
}

#[tokio::test]
async fn logout_clears_token_even_when_backend_fails() {
    // Arrange
    let backend = FakeBackend::new();
    backend.fail_with_network_error(Method::POST, "/auth/logout");
    let client = backend.client_with_token(Some("abc"));

    // Act
    let result = client.logout().await;

    // Assert
    assert!(result.is_err());
    assert!(client.token_store().get().is_none());
}

#[tokio::test]
async fn logout_treats_unauthorized_as_done() {
    // Arrange
    let backend = FakeBackend::new();
    backend.respond_json(Method::POST, "/auth/logout", StatusCode::UNAUTHORIZED, json!({}));
    let client = backend.client_with_token(Some("abc"));

    // Act
    let result = client.logout().await;

    // Assert
    assert_eq!(result, Ok(()));
    let sent = backend.last_request(Method::POST, "/auth/logout").unwrap();
    assert_eq!(sent.header("Authorization"), None);
}
