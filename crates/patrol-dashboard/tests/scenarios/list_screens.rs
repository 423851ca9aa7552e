use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use patrol_client_core::RawResponse;
use patrol_dashboard::screens::{ListScreen, ToastKind};
use patrol_shared::{patrol::Patrol, uac::Role, user::User};
use patrol_time::{Instant, Millis};
use reqwest::{Method, StatusCode};
use serde_json::json;

use crate::helpers::{fixtures, no_cb, settle, signed_in};

fn patrol_screen() -> ListScreen<Patrol> {
    let mut screen = ListScreen::new(Millis::new(250), 10, Millis::new(2000));
    screen.on_role_changed(Role::Admin);
    screen
}

#[tokio::test]
async fn deleting_last_row_of_last_page_steps_back() {
    // Arrange
    let (backend, client) = signed_in();
    let total = Arc::new(AtomicU64::new(11));
    let listed_total = Arc::clone(&total);
    backend.on(Method::GET, "/patrullas", move |request| {
        let page = request
            .query_value("page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(1);
        let total = listed_total.load(Ordering::SeqCst);
        Ok(RawResponse::json(
            StatusCode::OK,
            &fixtures::patrols_page(page, 10, total),
        ))
    });
    let deleted_total = Arc::clone(&total);
    backend.on(Method::DELETE, "/patrullas/11", move |_| {
        deleted_total.store(10, Ordering::SeqCst);
        Ok(RawResponse::new(StatusCode::NO_CONTENT, ""))
    });
    let mut screen = patrol_screen();
    let now = Instant::now();
    settle(&mut screen, &client, now).await;
    assert!(screen.go_to_page(2));
    settle(&mut screen, &client, now).await;
    assert_eq!(screen.items().len(), 1);
    let only_row = screen.items()[0].clone();

    // Act
    screen.ask_delete(&only_row);
    screen.confirm_delete(&client, no_cb);
    settle(&mut screen, &client, now).await;

    // Assert
    assert_eq!(backend.count(Method::DELETE, "/patrullas/11"), 1);
    assert_eq!(screen.query().page, 1);
    assert_eq!(screen.total(), 10);
    assert_eq!(screen.items().len(), 10);
    let last_list = backend.last_request(Method::GET, "/patrullas").unwrap();
    assert_eq!(last_list.query_value("page"), Some("1"));
    let toast = screen.toasts().latest().unwrap();
    assert_eq!(toast.kind, ToastKind::Success);
    assert_eq!(toast.message, "Patrulla eliminada");
}

#[tokio::test]
async fn search_burst_sends_one_request() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(
        Method::GET,
        "/patrullas",
        StatusCode::OK,
        fixtures::patrols_page(1, 10, 3),
    );
    let mut screen = patrol_screen();
    let start = Instant::now();
    settle(&mut screen, &client, start).await;
    let at = |ms: u64| start + Duration::from_millis(ms);

    // Act
    screen.set_search_input("P", at(0));
    screen.tick(&client, at(100), no_cb);
    screen.set_search_input("P-", at(120));
    screen.tick(&client, at(240), no_cb);
    screen.set_search_input("P-0", at(260));
    settle(&mut screen, &client, at(300)).await;
    let before_quiet = backend.count(Method::GET, "/patrullas");
    settle(&mut screen, &client, at(600)).await;

    // Assert
    assert_eq!(before_quiet, 1, "nothing is sent while typing");
    assert_eq!(backend.count(Method::GET, "/patrullas"), 2);
    let request = backend.last_request(Method::GET, "/patrullas").unwrap();
    assert_eq!(request.query_value("q"), Some("P-0"));
    assert_eq!(request.query_value("page"), Some("1"));
}

#[tokio::test]
async fn page_size_change_goes_back_to_first_page() {
    // Arrange
    let (backend, client) = signed_in();
    backend.on(Method::GET, "/users", |request| {
        let page = request
            .query_value("page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(1);
        let size = request
            .query_value("size")
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        Ok(RawResponse::json(
            StatusCode::OK,
            &fixtures::users_page(page, size, 35),
        ))
    });
    let mut screen: ListScreen<User> = ListScreen::new(Millis::new(300), 10, Millis::new(2000));
    let now = Instant::now();
    settle(&mut screen, &client, now).await;
    assert!(screen.go_to_page(4));
    settle(&mut screen, &client, now).await;
    assert_eq!(screen.items().len(), 5);
    assert!(!screen.go_to_page(5), "only four pages of ten");

    // Act
    screen.set_page_size(20);
    settle(&mut screen, &client, now).await;

    // Assert
    let pagination = screen.pagination();
    assert_eq!(pagination.page, 1);
    assert_eq!(pagination.page_count(), 2);
    assert!(pagination.has_next());
    assert_eq!(screen.items().len(), 20);
    let request = backend.last_request(Method::GET, "/users").unwrap();
    assert_eq!(request.query_value("size"), Some("20"));
}

#[tokio::test]
async fn failed_create_keeps_editor_open() {
    // Arrange
    let (backend, client) = signed_in();
    backend
        .respond_json(
            Method::GET,
            "/patrullas",
            StatusCode::OK,
            fixtures::patrols_page(1, 10, 0),
        )
        .respond_json(
            Method::POST,
            "/patrullas",
            StatusCode::CONFLICT,
            json!({"message": "El código ya existe"}),
        );
    let mut screen = patrol_screen();
    let now = Instant::now();
    settle(&mut screen, &client, now).await;

    // Act
    screen.open_create();
    screen.editor_form_mut().unwrap().codigo = "P-01".to_string();
    screen.submit_editor(&client, now, no_cb);
    settle(&mut screen, &client, now).await;

    // Assert
    assert_eq!(backend.count(Method::POST, "/patrullas"), 1);
    let editor = screen.editor().expect("editor stays open");
    assert_eq!(editor.form.codigo, "P-01");
    let toast = screen.toasts().latest().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert!(toast.message.contains("El código ya existe"));
}

#[tokio::test]
async fn expired_session_asks_for_login() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(
        Method::GET,
        "/patrullas",
        StatusCode::UNAUTHORIZED,
        json!({"msg": "No autenticado"}),
    );
    let mut screen = patrol_screen();

    // Act
    settle(&mut screen, &client, Instant::now()).await;

    // Assert
    assert!(screen.take_redirect_to_login());
    assert!(screen.items().is_empty());
}
