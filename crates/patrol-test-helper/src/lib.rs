#![warn(unused_crate_dependencies)]

use std::{
    collections::{HashMap, VecDeque},
    fmt::Debug,
    ops::Deref,
    sync::{Arc, LazyLock, Mutex},
};

use futures::{future::BoxFuture, FutureExt as _};
use patrol_client_core::{
    Client, MemoryTokenStore, RawRequest, RawResponse, TokenStore, Transport, TransportError,
};
use patrol_shared::telemetry::{self, get_subscriber, init_subscriber};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

pub mod fixtures;

pub const FAKE_BASE_URL: &str = "http://backend.test";

/// Path prefix every request arrives with
pub const FAKE_API_ROOT: &str = "http://backend.test/api";

pub const TOKEN_STALE: &str = "stale-token";
pub const TOKEN_FRESH: &str = "fresh-token";

// Ensure that the `tracing` stack is only initialised once
pub static TRACING: LazyLock<String> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let log_file_name = format!("client_tests{}", rand::random::<u32>());
        let (file, path) = telemetry::create_trace_file(&log_file_name).unwrap();
        let subscriber = get_subscriber(subscriber_name, default_filter_level, file);
        init_subscriber(subscriber).unwrap();
        format!("Traces for tests being written to: {path:?}")
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber).unwrap();
        "Traces set to std::io::sink".to_string()
    }
});

pub fn start_tracing() {
    // Accessing TRACING also forces the LazyLock to initialize
    let logging_msg = TRACING.deref();
    println!("{logging_msg}");
}

/// Empty function for use when a call back isn't needed
pub fn no_cb() {}

type Handler = Box<dyn FnMut(&RawRequest) -> Result<RawResponse, TransportError> + Send>;

/// In memory stand in for the backend. Responses are decided when the request
/// is sent and delivered after yielding once to the executor, so concurrent
/// callers really do overlap
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<FakeInner>>,
}

#[derive(Default)]
struct FakeInner {
    routes: HashMap<(Method, String), Handler>,
    requests: Vec<RawRequest>,
    /// When set, every call other than login and refresh needs this bearer
    required_token: Option<String>,
    refresh_succeeds: bool,
}

impl Debug for FakeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().expect("mutex poisoned");
        f.debug_struct("FakeBackend")
            .field("routes", &inner.routes.keys().collect::<Vec<_>>())
            .field("request_count", &inner.requests.len())
            .finish()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// `path` is relative to the api root, for example `/users/4`
    pub fn on<F>(&self, method: Method, path: &str, handler: F) -> &Self
    where
        F: FnMut(&RawRequest) -> Result<RawResponse, TransportError> + Send + 'static,
    {
        self.inner
            .lock()
            .expect("mutex poisoned")
            .routes
            .insert((method, format!("{FAKE_API_ROOT}{path}")), Box::new(handler));
        self
    }

    pub fn respond_json(&self, method: Method, path: &str, status: StatusCode, body: Value) -> &Self {
        self.on(method, path, move |_| Ok(RawResponse::json(status, &body)))
    }

    /// Responses are used in order, the last one repeats
    pub fn respond_sequence(&self, method: Method, path: &str, responses: Vec<RawResponse>) -> &Self {
        let mut responses: VecDeque<RawResponse> = responses.into();
        self.on(method, path, move |_| {
            let response = if responses.len() > 1 {
                responses.pop_front()
            } else {
                responses.front().cloned()
            };
            Ok(response.unwrap_or_else(|| RawResponse::new(StatusCode::NOT_FOUND, "")))
        })
    }

    pub fn fail_with_network_error(&self, method: Method, path: &str) -> &Self {
        self.on(method, path, |_| {
            Err(TransportError::Send("connection refused".to_string()))
        })
    }

    /// Every protected call needs `Bearer <TOKEN_FRESH>`. `POST /auth/refresh`
    /// hands out that token when `refresh_succeeds`, otherwise it answers 401
    pub fn require_fresh_token(&self, refresh_succeeds: bool) -> &Self {
        let mut inner = self.inner.lock().expect("mutex poisoned");
        inner.required_token = Some(TOKEN_FRESH.to_string());
        inner.refresh_succeeds = refresh_succeeds;
        drop(inner);
        self
    }

    /// Client with a memory token store pointed at this backend
    pub fn client(&self) -> Client {
        self.client_with_token(None)
    }

    pub fn client_with_token(&self, token: Option<&str>) -> Client {
        let store = MemoryTokenStore::default();
        if let Some(token) = token {
            store.set(token.to_string().into());
        }
        Client::with_transport(FAKE_BASE_URL, Arc::new(self.clone()), Arc::new(store))
    }

    pub fn requests(&self) -> Vec<RawRequest> {
        self.inner.lock().expect("mutex poisoned").requests.clone()
    }

    /// Number of requests received for `path` (relative to the api root)
    pub fn count(&self, method: Method, path: &str) -> usize {
        let full = format!("{FAKE_API_ROOT}{path}");
        self.inner
            .lock()
            .expect("mutex poisoned")
            .requests
            .iter()
            .filter(|r| r.method == method && r.path() == full)
            .count()
    }

    pub fn last_request(&self, method: Method, path: &str) -> Option<RawRequest> {
        let full = format!("{FAKE_API_ROOT}{path}");
        self.inner
            .lock()
            .expect("mutex poisoned")
            .requests
            .iter()
            .rev()
            .find(|r| r.method == method && r.path() == full)
            .cloned()
    }

    fn respond(&self, request: RawRequest) -> Result<RawResponse, TransportError> {
        let mut inner = self.inner.lock().expect("mutex poisoned");
        inner.requests.push(request.clone());
        let path = request.path().to_string();
        let is_refresh = path == format!("{FAKE_API_ROOT}/auth/refresh");
        let is_login = path == format!("{FAKE_API_ROOT}/auth/login");

        if let Some(required) = inner.required_token.clone() {
            if is_refresh && !inner.routes.contains_key(&(request.method.clone(), path.clone())) {
                return Ok(if inner.refresh_succeeds {
                    RawResponse::json(StatusCode::OK, &json!({"access_token": TOKEN_FRESH}))
                } else {
                    RawResponse::json(StatusCode::UNAUTHORIZED, &json!({"msg": "expired"}))
                });
            }
            let expected = format!("Bearer {required}");
            if !is_refresh && !is_login && request.header("Authorization") != Some(expected.as_str()) {
                return Ok(RawResponse::json(
                    StatusCode::UNAUTHORIZED,
                    &json!({"msg": "No autenticado"}),
                ));
            }
        }

        match inner.routes.get_mut(&(request.method.clone(), path)) {
            Some(handler) => handler(&request),
            None => Ok(RawResponse::json(
                StatusCode::NOT_FOUND,
                &json!({"message": "not found"}),
            )),
        }
    }
}

impl Transport for FakeBackend {
    fn send(&self, request: RawRequest) -> BoxFuture<'static, Result<RawResponse, TransportError>> {
        let outcome = self.respond(request);
        async move {
            tokio::task::yield_now().await;
            outcome
        }
        .boxed()
    }
}
