use std::{
    fmt::Debug,
    future::Future,
    sync::{Arc, Mutex},
};

use futures::channel::oneshot;
use patrol_shared::{
    const_config::{
        client::{CLIENT_CACHE_BUST_PARAM, CLIENT_DEFAULT_BASE_URL},
        path::{PathSpec, PATH_AUTH_REFRESH},
    },
    req_args::{error_message, refreshed_access_token},
};
use patrol_time::Timestamp;
use reqwest::StatusCode;
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::Value;

use crate::errors::{RequestError, TransportError};

pub mod api;
mod single_flight;
mod token_store;
mod transport;

pub use single_flight::{SharedResult, SingleFlight};
pub use token_store::{platform_token_store, MemoryTokenStore, TokenStore};
pub use transport::{RawRequest, RawResponse, ReqwestTransport, Transport};

#[cfg(target_arch = "wasm32")]
pub use token_store::LocalStorageTokenStore;

pub const NO_QUERY: &[(&str, String)] = &[];

/// Handle to the backend. Cheap to clone, all clones share the credentials and
/// the pending refresh
#[derive(Debug, Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    token_store: Arc<dyn TokenStore>,
    refresh: SingleFlight<Result<(), RequestError>>,
    credentials: Arc<Mutex<CredentialEpoch>>,
    base_url: Arc<str>,
}

/// Counts changes to the stored credentials. A 401 for a request sent before
/// the last change reuses that change's outcome instead of refreshing again
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CredentialEpoch {
    generation: u64,
    usable: bool,
}

impl CredentialEpoch {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `usable` is false when the change left no credentials worth retrying
    /// with (failed refresh, logout)
    pub fn advance(&mut self, usable: bool) {
        self.generation += 1;
        self.usable = usable;
    }

    /// Outcome to reuse for a request sent at `sent_with`, `None` if nothing
    /// changed since then
    pub fn settled_since(&self, sent_with: u64) -> Option<Result<(), RequestError>> {
        (self.generation != sent_with).then(|| {
            if self.usable {
                Ok(())
            } else {
                Err(RequestError::Unauthenticated)
            }
        })
    }
}

/// Progress of one logical call through the authentication retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRetryState {
    /// First attempt
    Idle,
    /// Got a 401 and is waiting on the shared refresh
    RefreshInFlight,
    /// Refresh done, the one retry has been issued
    Retried,
}

impl AuthRetryState {
    /// Next state after an authentication failure, `None` means give up
    pub fn on_unauthorized(self) -> Option<Self> {
        match self {
            AuthRetryState::Idle => Some(AuthRetryState::RefreshInFlight),
            AuthRetryState::RefreshInFlight | AuthRetryState::Retried => None,
        }
    }

    /// Next state once the refresh finished, `None` means give up
    pub fn on_refresh(self, refreshed: bool) -> Option<Self> {
        match (self, refreshed) {
            (AuthRetryState::RefreshInFlight, true) => Some(AuthRetryState::Retried),
            _ => None,
        }
    }
}

impl Client {
    /// Uses the real network and the platform's token store
    #[tracing::instrument(name = "NEW CLIENT-CORE")]
    pub fn new(base_url: &str) -> Result<Self, RequestError> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(
            base_url,
            Arc::new(transport),
            platform_token_store(),
        ))
    }

    pub fn with_transport(
        base_url: &str,
        transport: Arc<dyn Transport>,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            transport,
            token_store,
            refresh: Default::default(),
            credentials: Default::default(),
            base_url: normalize_base_url(base_url).into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.token_store
    }

    /// Sends the request with the credentials attached, refreshing once on an
    /// authentication failure. Empty bodies come back as [`Value::Null`]
    #[tracing::instrument(skip(self, body), fields(method = %path_spec.method, path = %path_spec.path))]
    // WARNING: Must skip body as it may contain passwords
    pub async fn request(
        &self,
        path_spec: &PathSpec,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, RequestError> {
        let mut state = AuthRetryState::Idle;
        loop {
            let sent_with = self.credential_epoch().generation();
            let response = self.execute(path_spec, query, body.clone()).await?;
            if response.status != StatusCode::UNAUTHORIZED {
                return normalize_response(response);
            }
            state = state
                .on_unauthorized()
                .ok_or(RequestError::Unauthenticated)?;
            let refreshed = self.refresh_credentials_since(sent_with).await.is_ok();
            state = state
                .on_refresh(refreshed)
                .ok_or(RequestError::Unauthenticated)?;
            tracing::debug!(?state, "retrying after credential refresh");
        }
    }

    /// Serializes `body` as JSON before sending
    pub async fn request_json<B>(
        &self,
        path_spec: &PathSpec,
        body: &B,
    ) -> Result<Value, RequestError>
    where
        B: serde::Serialize,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| RequestError::Decode(format!("failed to encode request body: {e}")))?;
        self.request(path_spec, NO_QUERY, Some(body)).await
    }

    /// Single attempt, no retry and no interpretation of the status
    pub async fn execute(
        &self,
        path_spec: &PathSpec,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<RawResponse, TransportError> {
        let request = self.build_request(path_spec, query, body)?;
        self.transport.send(request).await
    }

    /// Shared by every caller that hits a 401 while it is pending
    pub fn refresh_credentials(&self) -> SharedResult<Result<(), RequestError>> {
        self.refresh_credentials_since(self.credential_epoch().generation())
    }

    /// Requests sent at `sent_with` that come back 401 after the credentials
    /// already changed get that change's outcome, only callers still on the
    /// current generation join or start a refresh
    fn refresh_credentials_since(&self, sent_with: u64) -> SharedResult<Result<(), RequestError>> {
        let client = self.clone();
        self.refresh.run_unless(
            || {
                let settled = self.credential_epoch().settled_since(sent_with);
                if settled.is_some() {
                    tracing::debug!("credentials changed since the request was sent");
                }
                settled
            },
            move || async move {
                let result = client.refresh_once().await;
                client.advance_credentials(result.is_ok());
                result
            },
        )
    }

    async fn refresh_once(&self) -> Result<(), RequestError> {
        let response = self.execute(&PATH_AUTH_REFRESH, NO_QUERY, None).await?;
        if !response.status.is_success() {
            tracing::info!(status = %response.status, "credential refresh rejected");
            return Err(RequestError::Unauthenticated);
        }
        let body = normalize_response(response)?;
        if let Some(token) = refreshed_access_token(&body) {
            self.token_store.set(SecretString::from(token));
        }
        Ok(())
    }

    pub fn credential_epoch(&self) -> CredentialEpoch {
        *self.credentials.lock().expect("mutex poisoned")
    }

    /// Called whenever the stored credentials change (refresh, login, logout)
    pub(crate) fn advance_credentials(&self, usable: bool) {
        self.credentials
            .lock()
            .expect("mutex poisoned")
            .advance(usable);
    }

    pub fn is_refresh_in_flight(&self) -> bool {
        self.refresh.is_in_flight()
    }

    fn build_request(
        &self,
        path_spec: &PathSpec,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<RawRequest, TransportError> {
        let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, path_spec.path))
            .map_err(|e| TransportError::Send(format!("invalid url: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            if path_spec.is_get() {
                pairs.append_pair(
                    CLIENT_CACHE_BUST_PARAM,
                    &Timestamp::now().as_unix_millis().to_string(),
                );
            }
        }
        let mut url = String::from(url);
        // An empty `?` is left behind when there were no pairs
        if url.ends_with('?') {
            url.pop();
        }

        let mut headers = vec![("Accept", "application/json".to_string())];
        if body.is_some() {
            headers.push(("Content-Type", "application/json".to_string()));
        }
        if let Some(token) = self.token_store.get() {
            headers.push((
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            ));
        }
        Ok(RawRequest {
            method: path_spec.method.clone(),
            url,
            headers,
            body,
        })
    }

    /// Runs `operation` on the platform executor and hands the result back
    /// through a channel the page can poll every frame
    pub fn spawn_for_ui<T, Fut, F>(&self, operation: Fut, ui_notify: F) -> oneshot::Receiver<T>
    where
        T: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        F: UiCallBack,
    {
        let (tx, rx) = oneshot::channel();
        spawn(async move {
            let result = operation.await;
            if tx.send(result).is_err() {
                tracing::debug!("page stopped waiting for the result");
            }
            ui_notify();
        });
        rx
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::with_transport(
            CLIENT_DEFAULT_BASE_URL,
            Arc::new(NoTransport),
            platform_token_store(),
        )
    }
}

/// Used until the real client is configured, every call fails
#[derive(Debug)]
struct NoTransport;

impl Transport for NoTransport {
    fn send(
        &self,
        _request: RawRequest,
    ) -> futures::future::BoxFuture<'static, Result<RawResponse, TransportError>> {
        use futures::FutureExt as _;
        async { Err(TransportError::Send("client not configured".into())) }.boxed()
    }
}

/// Trims trailing slashes and makes sure the base ends with `/api`
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/api")
    }
}

/// 2xx with a body is parsed, 2xx without one (including 204) is
/// [`Value::Null`], anything else is an error with the server's message
#[tracing::instrument(level = "debug", skip(response), fields(status = %response.status), err(Debug))]
pub fn normalize_response(response: RawResponse) -> Result<Value, RequestError> {
    let status = response.status;
    if status == StatusCode::UNAUTHORIZED {
        return Err(RequestError::Unauthenticated);
    }
    if status.is_success() {
        if status == StatusCode::NO_CONTENT || response.is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_slice(&response.body)
            .map_err(|e| RequestError::Decode(format!("failed to parse result as json: {e}")));
    }
    let server_message = serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|body| error_message(&body));
    Err(RequestError::http(status, server_message))
}

fn spawn<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::spawn(future);
    }
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(future);
    }
}

pub trait UiCallBack: 'static + Send + FnOnce() {}
impl<T> UiCallBack for T where T: 'static + Send + FnOnce() {}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::plain("http://localhost:5000", "http://localhost:5000/api")]
    #[case::trailing_slashes("http://localhost:5000//", "http://localhost:5000/api")]
    #[case::already_api("https://x.org/api/", "https://x.org/api")]
    fn base_url(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_base_url(input), expected);
    }

    #[rstest]
    #[case::no_content(RawResponse::new(StatusCode::NO_CONTENT, ""), Ok(Value::Null))]
    #[case::empty_ok(RawResponse::new(StatusCode::OK, ""), Ok(Value::Null))]
    #[case::json(RawResponse::json(StatusCode::OK, &json!({"a": 1})), Ok(json!({"a": 1})))]
    #[case::http_with_msg(
        RawResponse::json(StatusCode::CONFLICT, &json!({"msg": "duplicado"})),
        Err(RequestError::Http { status: 409, message: "HTTP 409: duplicado".into() })
    )]
    #[case::http_plain(
        RawResponse::new(StatusCode::BAD_GATEWAY, "<html>"),
        Err(RequestError::Http { status: 502, message: "HTTP 502".into() })
    )]
    #[case::unauthorized(RawResponse::new(StatusCode::UNAUTHORIZED, ""), Err(RequestError::Unauthenticated))]
    fn response_normalization(
        #[case] input: RawResponse,
        #[case] expected: Result<Value, RequestError>,
    ) {
        assert_eq!(normalize_response(input), expected);
    }

    #[test]
    fn bad_json_is_decode_error() {
        let actual = normalize_response(RawResponse::new(StatusCode::OK, "{nope"));
        assert!(matches!(actual, Err(RequestError::Decode(_))));
    }

    #[test]
    fn retry_state_machine_allows_exactly_one_retry() {
        let state = AuthRetryState::Idle;
        let state = state.on_unauthorized().unwrap();
        assert_eq!(state, AuthRetryState::RefreshInFlight);
        assert_eq!(state.on_refresh(false), None);
        let state = state.on_refresh(true).unwrap();
        assert_eq!(state, AuthRetryState::Retried);
        assert_eq!(state.on_unauthorized(), None);
    }

    #[test]
    fn credential_epoch_reuses_the_last_change() {
        let mut epoch = CredentialEpoch::default();
        let sent_with = epoch.generation();
        assert_eq!(epoch.settled_since(sent_with), None);

        epoch.advance(true);
        assert_eq!(epoch.settled_since(sent_with), Some(Ok(())));
        assert_eq!(epoch.settled_since(epoch.generation()), None);

        epoch.advance(false);
        assert_eq!(
            epoch.settled_since(sent_with),
            Some(Err(RequestError::Unauthenticated))
        );
    }
}
