use reqwest::StatusCode;

/// Failure of a backend call as seen by the pages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// Credentials missing or expired and a refresh did not help. Pages send
    /// the operator back to the login screen
    #[error("not authenticated")]
    Unauthenticated,
    /// `message` is already formatted as `HTTP <status>[: <server message>]`
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response from server: {0}")]
    Decode(String),
}

impl RequestError {
    pub fn http(status: StatusCode, server_message: Option<String>) -> Self {
        let mut message = format!("HTTP {}", status.as_u16());
        if let Some(server_message) = server_message {
            message.push_str(": ");
            message.push_str(&server_message);
        }
        Self::Http {
            status: status.as_u16(),
            message,
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("failed to send request: {0}")]
    Send(String),
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("request was dropped before a response arrived")]
    Cancelled,
}

impl From<TransportError> for RequestError {
    fn from(value: TransportError) -> Self {
        Self::Network(value.to_string())
    }
}
