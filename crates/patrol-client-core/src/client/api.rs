use patrol_shared::{
    const_config::path::{PATH_AUTH_LOGIN, PATH_AUTH_LOGOUT, PATH_AUTH_ME, PATH_LOCATIONS},
    errors::WireError,
    location::{normalize_snapshot, LocationSnapshot},
    req_args::{LoginReqArgs, LoginResponse},
    uac::Session,
};
use secrecy::SecretString;

use crate::{
    client::{normalize_response, NO_QUERY},
    errors::RequestError,
    Client,
};

mod patrols;
mod users;

#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    /// Message to show next to the form
    Rejected(String),
}

impl LoginOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<WireError> for RequestError {
    fn from(value: WireError) -> Self {
        match value {
            WireError::NotOk(_) => RequestError::Unauthenticated,
            other => RequestError::Decode(other.to_string()),
        }
    }
}

impl Client {
    /// Bad credentials are not an error, they come back as
    /// [`LoginOutcome::Rejected`]. Login is never retried through a refresh
    #[tracing::instrument]
    pub async fn login(&self, args: LoginReqArgs) -> Result<LoginOutcome, RequestError> {
        let body = serde_json::to_value(&args)
            .map_err(|e| RequestError::Decode(format!("failed to encode login: {e}")))?;
        let response = self.execute(&PATH_AUTH_LOGIN, NO_QUERY, Some(body)).await?;
        let status = response.status;
        let body = serde_json::from_slice(&response.body).unwrap_or(serde_json::Value::Null);
        let login_response = LoginResponse::from_wire(&body);
        if !status.is_success() {
            return Ok(LoginOutcome::Rejected(
                login_response
                    .message
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            ));
        }
        if !login_response.ok {
            return Ok(LoginOutcome::Rejected(
                login_response
                    .message
                    .unwrap_or_else(|| "invalid response from server".to_string()),
            ));
        }
        if let Some(token) = login_response.access_token {
            self.token_store().set(SecretString::from(token));
        }
        self.advance_credentials(true);
        Ok(LoginOutcome::Success)
    }

    /// Who the backend thinks we are
    #[tracing::instrument]
    pub async fn me(&self) -> Result<Session, RequestError> {
        let body = self.request(&PATH_AUTH_ME, NO_QUERY, None).await?;
        Ok(Session::from_wire(&body)?)
    }

    /// Forgets the token straight away so nothing else goes out with it, even
    /// if the backend cannot be reached
    #[tracing::instrument]
    pub async fn logout(&self) -> Result<(), RequestError> {
        self.forget_token();
        let response = self.execute(&PATH_AUTH_LOGOUT, NO_QUERY, None).await?;
        match normalize_response(response) {
            Ok(_) | Err(RequestError::Unauthenticated) => Ok(()),
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument]
    pub fn logout_no_wait(&self) {
        self.forget_token();
        let client = self.clone();
        let _rx = self.spawn_for_ui(async move { client.logout().await }, || {});
    }

    fn forget_token(&self) {
        self.token_store().clear();
        self.advance_credentials(false);
    }

    /// Latest location of every patrol
    #[tracing::instrument]
    pub async fn locations(&self) -> Result<LocationSnapshot, RequestError> {
        let body = self.request(&PATH_LOCATIONS, NO_QUERY, None).await?;
        Ok(normalize_snapshot(&body)?)
    }
}
