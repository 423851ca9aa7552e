use patrol_client_core::RequestError;
use patrol_shared::{
    id::EntityId,
    paging::ListQuery,
    user::UserForm,
};
use reqwest::{Method, StatusCode};
use serde_json::json;

use crate::helpers::{fixtures, signed_in};

#[tokio::test]
async fn list_sends_paging_and_search() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::GET, "/users", StatusCode::OK, fixtures::users_page(2, 10, 25));
    let query = ListQuery {
        page: 2,
        size: 10,
        q: " ana ".to_string(),
    };

    // Act
    let page = client.list_users(&query).await.unwrap();

    // Assert
    assert_eq!(page.items.len(), 10);
    assert_eq!(page.total, 25);
    assert_eq!(page.items[0].email, "user11@example.com");
    let sent = backend.last_request(Method::GET, "/users").unwrap();
    assert_eq!(sent.query_value("page"), Some("2"));
    assert_eq!(sent.query_value("size"), Some("10"));
    assert_eq!(sent.query_value("q"), Some("ana"));
}

#[tokio::test]
async fn blank_search_is_not_sent() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::GET, "/users", StatusCode::OK, fixtures::users_page(1, 10, 3));

    // Act
    client.list_users(&ListQuery::default()).await.unwrap();

    // Assert
    let sent = backend.last_request(Method::GET, "/users").unwrap();
    assert_eq!(sent.query_value("q"), None);
}

#[tokio::test]
async fn create_sends_draft() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::POST, "/users", StatusCode::CREATED, json!({"ok": true}));
    let form = UserForm {
        email: "nuevo@example.com".to_string(),
        password: "clave".to_string(),
        nombre: "Nuevo".to_string(),
        ..UserForm::new_for_create("patrullero")
    };

    // Act
    client.create_user(&form.to_draft().unwrap()).await.unwrap();

    // Assert
    let sent = backend.last_request(Method::POST, "/users").unwrap();
    insta::assert_json_snapshot!(sent.body, @r#"
    {
      "email": "nuevo@example.com",
      "is_active": true,
      "nombre": "Nuevo",
      "password": "clave",
      "roles": [
        "patrullero"
      ]
    }
    "#);
}

#[tokio::test]
async fn update_without_password_leaves_it_out() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::PUT, "/users/7", StatusCode::OK, json!({"ok": true}));
    let form = UserForm {
        email: "ana@example.com".to_string(),
        role: "usuario".to_string(),
        is_active: false,
        ..Default::default()
    };

    // Act
    client
        .update_user(&EntityId::from(7), &form.to_patch().unwrap())
        .await
        .unwrap();

    // Assert
    let sent = backend.last_request(Method::PUT, "/users/7").unwrap();
    let body = sent.body.unwrap();
    assert!(body.get("password").is_none(), "{body}");
    assert_eq!(body["is_active"], json!(false));
}

#[tokio::test]
async fn delete_reports_server_message() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(
        Method::DELETE,
        "/users/3",
        StatusCode::CONFLICT,
        json!({"msg": "no se puede eliminar"}),
    );

    // Act
    let result = client.delete_user(&EntityId::from(3)).await;

    // Assert
    assert_eq!(
        result.unwrap_err().to_string(),
        "HTTP 409: no se puede eliminar"
    );
}

#[tokio::test]
async fn get_single_user_unwraps_envelope() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(
        Method::GET,
        "/users/9",
        StatusCode::OK,
        json!({"user": {"id": 9, "email": "x@example.com", "rol": "admin"}}),
    );

    // Act
    let user = client.get_user(&EntityId::from(9)).await.unwrap();

    // Assert
    assert_eq!(user.id, EntityId::from(9));
    assert_eq!(user.role.as_deref(), Some("admin"));
}

#[tokio::test]
async fn roles_fall_back_when_catalogue_missing() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::GET, "/users/roles", StatusCode::NOT_FOUND, json!({}));

    // Act
    let roles = client.list_roles().await.unwrap();

    // Assert
    assert_eq!(roles, vec!["usuario", "patrullero", "admin"]);
}

#[tokio::test]
async fn roles_catalogue_is_used_when_available() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(
        Method::GET,
        "/users/roles",
        StatusCode::OK,
        json!({"roles": ["admin", "supervisor"]}),
    );

    // Act
    let roles = client.list_roles().await.unwrap();

    // Assert
    assert_eq!(roles, vec!["admin", "supervisor"]);
}

#[tokio::test]
async fn roles_do_not_hide_expired_session() {
    // Arrange
    let (backend, client) = crate::helpers::signed_in_with_stale_token(false);
    backend.respond_json(Method::GET, "/users/roles", StatusCode::OK, json!([]));

    // Act
    let result = client.list_roles().await;

    // Assert
    assert_eq!(result, Err(RequestError::Unauthenticated));
}
