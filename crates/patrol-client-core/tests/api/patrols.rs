use patrol_shared::{id::EntityId, paging::ListQuery, patrol::PatrolForm};
use reqwest::{Method, StatusCode};
use serde_json::json;

use crate::helpers::{fixtures, signed_in};

#[tokio::test]
async fn list_reads_items_and_meta() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(
        Method::GET,
        "/patrullas",
        StatusCode::OK,
        fixtures::patrols_page(1, 10, 4),
    );

    // Act
    let page = client.list_patrols(&ListQuery::default()).await.unwrap();

    // Assert
    assert_eq!(page.items.len(), 4);
    assert_eq!(page.total, 4);
    assert_eq!(page.items[3].codigo.as_deref(), Some("P-04"));
}

#[tokio::test]
async fn create_and_update_bodies() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::POST, "/patrullas", StatusCode::CREATED, json!({"ok": true}));
    backend.respond_json(Method::PUT, "/patrullas/5", StatusCode::OK, json!({"ok": true}));
    let form = PatrolForm {
        codigo: " P-05 ".to_string(),
        alias: "Norte".to_string(),
        ..PatrolForm::new_for_create()
    };

    // Act
    client.create_patrol(&form.to_draft().unwrap()).await.unwrap();
    client
        .update_patrol(&EntityId::from(5), &form.to_patch())
        .await
        .unwrap();

    // Assert
    let created = backend.last_request(Method::POST, "/patrullas").unwrap();
    assert_eq!(
        created.body,
        Some(json!({"codigo": "P-05", "alias": "Norte", "placa": null, "is_activa": true}))
    );
    let updated = backend.last_request(Method::PUT, "/patrullas/5").unwrap();
    assert_eq!(
        updated.body,
        Some(json!({"alias": "Norte", "placa": null, "is_activa": true}))
    );
}

#[tokio::test]
async fn delete_with_empty_response() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_sequence(
        Method::DELETE,
        "/patrullas/2",
        vec![patrol_client_core::RawResponse::new(StatusCode::NO_CONTENT, "")],
    );

    // Act
    let result = client.delete_patrol(&EntityId::from(2)).await;

    // Assert
    assert_eq!(result, Ok(()));
}
