use patrol_client_core::{AppEvent, EventBus, LoginOutcome, SessionGuard};
use patrol_dashboard::{dashboard::DashboardState, map::CanvasMap, routes::{Navigator, Route}};
use patrol_shared::{location::LocationState, req_args::LoginReqArgs, uac::Role};
use patrol_test_helper::{FakeBackend, TOKEN_FRESH};
use patrol_time::{Instant, Millis};
use reqwest::{Method, StatusCode};
use secrecy::SecretString;

use crate::helpers::{fixtures, next_frame, no_cb, signed_in, MAX_FRAMES};

async fn wait_for_navigation(navigator: &mut Navigator) {
    for _ in 0..MAX_FRAMES {
        navigator.tick();
        if !navigator.is_checking() {
            return;
        }
        next_frame().await;
    }
    panic!("identity check never finished");
}

async fn wait_for_render(
    state: &mut DashboardState<CanvasMap>,
    client: &patrol_client_core::Client,
    bus: &EventBus,
) {
    for _ in 0..MAX_FRAMES {
        state.tick(client, bus, Instant::now(), no_cb);
        if state.last_render().is_some() && state.cycles_in_flight() == 0 {
            return;
        }
        next_frame().await;
    }
    panic!("no snapshot was rendered");
}

#[tokio::test]
async fn login_lands_on_dashboard_with_live_kpis() {
    // Arrange
    patrol_test_helper::start_tracing();
    let backend = FakeBackend::new();
    backend
        .respond_json(
            Method::POST,
            "/auth/login",
            StatusCode::OK,
            fixtures::login_ok(TOKEN_FRESH),
        )
        .respond_json(Method::GET, "/auth/me", StatusCode::OK, fixtures::me_admin())
        .respond_json(
            Method::GET,
            "/ubicaciones",
            StatusCode::OK,
            fixtures::three_locations(),
        )
        .require_fresh_token(true);
    let client = backend.client();
    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let guard = SessionGuard::new(client.clone(), bus.clone());
    let mut navigator = Navigator::default();

    // Act
    let outcome = client
        .login(LoginReqArgs::new(
            "admin@example.com",
            SecretString::from("secreto"),
        ))
        .await
        .unwrap();
    navigator.navigate(&guard, Route::Dashboard, true, no_cb);
    wait_for_navigation(&mut navigator).await;

    let mut dashboard = DashboardState::new(CanvasMap::default(), Millis::new(5000));
    dashboard.start(&bus, Instant::now());
    wait_for_render(&mut dashboard, &client, &bus).await;

    // Assert
    assert_eq!(outcome, LoginOutcome::Success);
    assert_eq!(navigator.current(), Route::Dashboard);
    assert_eq!(navigator.session().map(|s| s.role), Some(Role::Admin));

    let kpis = dashboard.kpis();
    assert_eq!((kpis.total, kpis.active, kpis.inactive), (3, 2, 1));
    assert_eq!(dashboard.map().surface().marker_count(), 3);
    assert_eq!(
        dashboard
            .rows()
            .iter()
            .filter(|r| r.state == LocationState::Active)
            .count(),
        2
    );
    assert_eq!(backend.count(Method::GET, "/ubicaciones"), 1);

    let events = events.drain();
    assert!(events
        .iter()
        .any(|e| matches!(e, AppEvent::RoleChanged(s) if s.role == Role::Admin)));
    assert!(events
        .iter()
        .any(|e| matches!(e, AppEvent::SnapshotPublished(s) if s.kpis.total == 3)));
}

#[tokio::test]
async fn rejected_login_stays_on_login_page() {
    // Arrange
    patrol_test_helper::start_tracing();
    let backend = FakeBackend::new();
    backend
        .respond_json(
            Method::POST,
            "/auth/login",
            StatusCode::UNAUTHORIZED,
            serde_json::json!({"ok": false, "message": "Credenciales inválidas"}),
        )
        .respond_json(
            Method::GET,
            "/auth/me",
            StatusCode::UNAUTHORIZED,
            serde_json::json!({"msg": "No autenticado"}),
        );
    let client = backend.client();
    let guard = SessionGuard::new(client.clone(), EventBus::default());
    let mut navigator = Navigator::default();

    // Act
    let outcome = client
        .login(LoginReqArgs::new("x@example.com", SecretString::from("mal")))
        .await;
    navigator.navigate(&guard, Route::Dashboard, true, no_cb);
    wait_for_navigation(&mut navigator).await;

    // Assert
    assert!(!matches!(outcome, Ok(LoginOutcome::Success)));
    assert_eq!(navigator.current(), Route::Login);
    assert!(navigator.session().is_none());
}

#[tokio::test]
async fn regular_user_is_kept_off_admin_pages() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(Method::GET, "/auth/me", StatusCode::OK, fixtures::me_user());
    let guard = SessionGuard::new(client, EventBus::default());
    let mut navigator = Navigator::default();

    // Act
    navigator.navigate(&guard, Route::Users, true, no_cb);
    wait_for_navigation(&mut navigator).await;

    // Assert
    assert_eq!(navigator.current(), Route::Dashboard);
    assert_eq!(navigator.session().map(|s| s.role), Some(Role::User));
}

#[tokio::test]
async fn expired_session_during_poll_asks_for_login() {
    // Arrange
    let (backend, client) = signed_in();
    backend.respond_json(
        Method::GET,
        "/ubicaciones",
        StatusCode::UNAUTHORIZED,
        serde_json::json!({"msg": "No autenticado"}),
    );
    let bus = EventBus::default();
    let mut dashboard = DashboardState::new(CanvasMap::default(), Millis::new(5000));
    dashboard.start(&bus, Instant::now());

    // Act
    let mut redirected = false;
    for _ in 0..MAX_FRAMES {
        dashboard.tick(&client, &bus, Instant::now(), no_cb);
        if dashboard.take_redirect_to_login() {
            redirected = true;
            break;
        }
        next_frame().await;
    }

    // Assert
    assert!(redirected);
    assert!(dashboard.last_render().is_none());
}
