//! The seam between the request layer and the network

use std::fmt::Debug;

use futures::{channel::oneshot, future::BoxFuture, FutureExt as _};
use reqwest::{Method, StatusCode};

use crate::errors::TransportError;

/// Fully built request. The url already includes the query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
}

impl RawRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Url without the query string
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        let (_, query) = self.url.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// No content or only whitespace
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

/// Anything that can carry a [`RawRequest`] to the backend. The returned
/// future must not depend on the borrow of `self`
pub trait Transport: Debug + Send + Sync + 'static {
    fn send(&self, request: RawRequest) -> BoxFuture<'static, Result<RawResponse, TransportError>>;
}

/// Production transport. Cookies are kept by the underlying client so the
/// backend's session cookie rides along with every call
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[tracing::instrument(name = "NEW REQWEST TRANSPORT")]
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Send(format!("unable to create http client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(request), fields(method = %request.method, url = %request.url))]
    // WARNING: Must skip request as the body and headers may contain credentials
    fn send(&self, request: RawRequest) -> BoxFuture<'static, Result<RawResponse, TransportError>> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body.to_string());
        }

        // Only plain data crosses the channel so the returned future is `Send`
        // on every platform
        let (tx, rx) = oneshot::channel();
        let on_done = move |response: reqwest::Result<reqwest::Response>| async move {
            let outcome = read_response(response).await;
            if tx.send(outcome).is_err() {
                tracing::debug!("response arrived after the caller stopped waiting");
            }
        };
        reqwest_cross::fetch(builder, on_done);

        async move { rx.await.unwrap_or(Err(TransportError::Cancelled)) }.boxed()
    }
}

async fn read_response(
    response: reqwest::Result<reqwest::Response>,
) -> Result<RawResponse, TransportError> {
    let response = response.map_err(|e| {
        tracing::info!("Response is err: {e:#?}");
        TransportError::Send(e.to_string())
    })?;
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| TransportError::Body(e.to_string()))?;
    Ok(RawResponse {
        status,
        body: body.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accessors() {
        let request = RawRequest {
            method: Method::GET,
            url: "http://h/api/users?page=2&q=ana&_ts=5".into(),
            headers: vec![("Accept", "application/json".into())],
            body: None,
        };
        assert_eq!(request.path(), "http://h/api/users");
        assert_eq!(request.query_value("q"), Some("ana"));
        assert_eq!(request.query_value("size"), None);
        assert_eq!(request.header("accept"), Some("application/json"));
    }

    #[test]
    fn whitespace_body_is_empty() {
        assert!(RawResponse::new(StatusCode::OK, " \n").is_empty());
        assert!(!RawResponse::new(StatusCode::OK, "{}").is_empty());
    }
}
