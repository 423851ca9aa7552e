use futures::future::join_all;
use patrol_client_core::{RawResponse, RequestError, NO_QUERY};
use patrol_shared::const_config::path::{PATH_LOCATIONS, PATH_USERS_CREATE};
use patrol_test_helper::TOKEN_FRESH;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret as _;
use serde_json::{json, Value};

use crate::helpers::{fixtures, signed_in, signed_in_with_stale_token};

#[tokio::test]
async fn concurrent_unauthorized_calls_share_one_refresh() {
    // Arrange
    let (backend, client) = signed_in_with_stale_token(true);
    backend.respond_json(Method::GET, "/ubicaciones", StatusCode::OK, fixtures::three_locations());
    let concurrent_calls = 5;
    let path = PATH_LOCATIONS;

    // Act
    let results =
        join_all((0..concurrent_calls).map(|_| client.request(&path, NO_QUERY, None))).await;

    // Assert
    assert!(results.iter().all(Result::is_ok), "{results:?}");
    assert_eq!(backend.count(Method::POST, "/auth/refresh"), 1);
    // Every call was sent once with the old token and once after the refresh
    assert_eq!(
        backend.count(Method::GET, "/ubicaciones"),
        concurrent_calls * 2
    );
    assert_eq!(
        client.token_store().get().unwrap().expose_secret(),
        TOKEN_FRESH
    );
    assert!(!client.is_refresh_in_flight());
}

#[tokio::test]
async fn failed_refresh_reports_unauthenticated() {
    // Arrange
    let (backend, client) = signed_in_with_stale_token(false);
    backend.respond_json(Method::GET, "/ubicaciones", StatusCode::OK, json!([]));
    let path = PATH_LOCATIONS;

    // Act
    let results = join_all((0..3).map(|_| client.request(&path, NO_QUERY, None))).await;

    // Assert
    for result in results {
        assert_eq!(result, Err(RequestError::Unauthenticated));
    }
    assert_eq!(backend.count(Method::POST, "/auth/refresh"), 1);
    // No retry once the refresh failed
    assert_eq!(backend.count(Method::GET, "/ubicaciones"), 3);
}

#[tokio::test]
async fn call_after_failed_refresh_tries_again() {
    // Arrange
    let (backend, client) = signed_in_with_stale_token(false);
    backend.respond_json(Method::GET, "/ubicaciones", StatusCode::OK, json!([]));
    let path = PATH_LOCATIONS;
    let first = join_all((0..2).map(|_| client.request(&path, NO_QUERY, None))).await;
    assert_eq!(backend.count(Method::POST, "/auth/refresh"), 1);

    // Act
    let second = client.request(&PATH_LOCATIONS, NO_QUERY, None).await;

    // Assert
    assert!(first.iter().all(Result::is_err), "{first:?}");
    assert_eq!(second, Err(RequestError::Unauthenticated));
    // Sent after the failure was known, so it is not folded into it
    assert_eq!(backend.count(Method::POST, "/auth/refresh"), 2);
}

#[tokio::test]
async fn retries_at_most_once() {
    // Arrange
    let (backend, client) = signed_in();
    // Even with valid credentials this route keeps answering 401
    backend.respond_json(
        Method::GET,
        "/ubicaciones",
        StatusCode::UNAUTHORIZED,
        json!({"msg": "nope"}),
    );

    // Act
    let result = client.request(&PATH_LOCATIONS, NO_QUERY, None).await;

    // Assert
    assert_eq!(result, Err(RequestError::Unauthenticated));
    assert_eq!(backend.count(Method::GET, "/ubicaciones"), 2);
    assert_eq!(backend.count(Method::POST, "/auth/refresh"), 1);
}

#[tokio::test]
async fn later_expiry_starts_a_new_refresh() {
    // Arrange
    let (backend, client) = signed_in_with_stale_token(true);
    backend.respond_json(Method::GET, "/ubicaciones", StatusCode::OK, json!([]));

    // Act
    client.request(&PATH_LOCATIONS, NO_QUERY, None).await.unwrap();
    client.token_store().set("expired-again".to_string().into());
    client.request(&PATH_LOCATIONS, NO_QUERY, None).await.unwrap();

    // Assert
    assert_eq!(backend.count(Method::POST, "/auth/refresh"), 2);
}

#[tokio::test]
async fn cache_bust_only_on_reads() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::GET, "/ubicaciones", StatusCode::OK, json!([]));
    backend.respond_json(Method::POST, "/users", StatusCode::CREATED, json!({"ok": true}));

    // Act
    client.request(&PATH_LOCATIONS, NO_QUERY, None).await.unwrap();
    client
        .request(&PATH_USERS_CREATE, NO_QUERY, Some(json!({"email": "a@b.c"})))
        .await
        .unwrap();

    // Assert
    let read = backend.last_request(Method::GET, "/ubicaciones").unwrap();
    assert!(read.query_value("_ts").is_some(), "{}", read.url);
    assert_eq!(read.header("Content-Type"), None);
    let write = backend.last_request(Method::POST, "/users").unwrap();
    assert_eq!(write.query_value("_ts"), None);
    assert_eq!(write.header("Content-Type"), Some("application/json"));
    assert_eq!(
        write.header("Authorization"),
        Some(format!("Bearer {TOKEN_FRESH}").as_str())
    );
    assert_eq!(write.header("Accept"), Some("application/json"));
}

#[tokio::test]
async fn no_authorization_header_without_token() {
    // Arrange
    let backend = patrol_test_helper::FakeBackend::new();
    backend.respond_json(Method::GET, "/ubicaciones", StatusCode::OK, json!([]));
    let client = backend.client();

    // Act
    client.request(&PATH_LOCATIONS, NO_QUERY, None).await.unwrap();

    // Assert
    let request = backend.last_request(Method::GET, "/ubicaciones").unwrap();
    assert_eq!(request.header("Authorization"), None);
}

#[tokio::test]
async fn no_content_is_null() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_sequence(
        Method::GET,
        "/ubicaciones",
        vec![RawResponse::new(StatusCode::NO_CONTENT, "")],
    );

    // Act
    let actual = client.request(&PATH_LOCATIONS, NO_QUERY, None).await;

    // Assert
    assert_eq!(actual, Ok(Value::Null));
}

#[tokio::test]
async fn server_message_is_kept() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(
        Method::GET,
        "/ubicaciones",
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"message": "mantenimiento"}),
    );

    // Act
    let actual = client.request(&PATH_LOCATIONS, NO_QUERY, None).await;

    // Assert
    let err = actual.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 503: mantenimiento");
}

#[tokio::test]
async fn network_failure_is_not_retried() {
    // Arrange
    let (backend, client) = signed_in();
    backend.fail_with_network_error(Method::GET, "/ubicaciones");

    // Act
    let actual = client.request(&PATH_LOCATIONS, NO_QUERY, None).await;

    // Assert
    assert!(matches!(actual, Err(RequestError::Network(_))), "{actual:?}");
    assert_eq!(backend.count(Method::GET, "/ubicaciones"), 1);
    assert_eq!(backend.count(Method::POST, "/auth/refresh"), 0);
}
