//! Decides whether a page may be shown and caches who is signed in

use std::sync::{Arc, Mutex};

use futures::channel::oneshot;
use patrol_shared::uac::{PageAccess, Session};

use crate::{
    client::{SingleFlight, UiCallBack},
    errors::RequestError,
    events::{AppEvent, EventBus},
    Client,
};

#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allowed(Arc<Session>),
    /// Not signed in or the identity check failed
    RedirectToLogin,
    /// Signed in but the page needs a role the operator does not have
    RedirectAway(Arc<Session>),
}

/// Application wide identity context. Clones share the cache
#[derive(Debug, Clone)]
pub struct SessionGuard {
    client: Client,
    bus: EventBus,
    inner: Arc<Mutex<GuardInner>>,
    identity: SingleFlight<Result<Arc<Session>, RequestError>>,
}

#[derive(Debug, Default)]
struct GuardInner {
    session: Option<Arc<Session>>,
}

impl SessionGuard {
    pub fn new(client: Client, bus: EventBus) -> Self {
        Self {
            client,
            bus,
            inner: Default::default(),
            identity: Default::default(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Point in time snapshot of the cached session
    pub fn current(&self) -> Option<Arc<Session>> {
        self.inner.lock().expect("mutex poisoned").session.clone()
    }

    /// Uses the cached session unless `force_refresh`, otherwise asks the
    /// backend once (concurrent callers share the one request)
    #[tracing::instrument(skip(self))]
    pub async fn ensure_authenticated(
        &self,
        access: PageAccess,
        force_refresh: bool,
    ) -> GuardOutcome {
        let cached = if force_refresh { None } else { self.current() };
        let session = match cached {
            Some(session) => session,
            None => match self.resolve_identity().await {
                Ok(session) => session,
                Err(e) => {
                    tracing::info!(?e, "identity check failed");
                    self.forget_session();
                    return GuardOutcome::RedirectToLogin;
                }
            },
        };
        if access.allows(session.role) {
            GuardOutcome::Allowed(session)
        } else {
            GuardOutcome::RedirectAway(session)
        }
    }

    /// For pages, result arrives on the channel and `ui_notify` is called
    pub fn ensure_authenticated_ui<F: UiCallBack>(
        &self,
        access: PageAccess,
        force_refresh: bool,
        ui_notify: F,
    ) -> oneshot::Receiver<GuardOutcome> {
        let guard = self.clone();
        self.client.spawn_for_ui(
            async move { guard.ensure_authenticated(access, force_refresh).await },
            ui_notify,
        )
    }

    async fn resolve_identity(&self) -> Result<Arc<Session>, RequestError> {
        let guard = self.clone();
        self.identity
            .run(move || async move {
                let session = Arc::new(guard.client.me().await?);
                guard.store_session(Arc::clone(&session));
                Ok(session)
            })
            .await
    }

    fn store_session(&self, session: Arc<Session>) {
        let previous = self
            .inner
            .lock()
            .expect("mutex poisoned")
            .session
            .replace(Arc::clone(&session));
        if previous.map(|p| p.role) != Some(session.role) {
            tracing::info!(role = %session.role, "role changed");
            self.bus.publish(AppEvent::RoleChanged(session));
        }
    }

    fn forget_session(&self) {
        self.inner.lock().expect("mutex poisoned").session = None;
    }

    /// Clears the cached session and the token before telling the backend so
    /// nothing else goes out with the old credentials
    #[tracing::instrument(skip(self))]
    pub fn sign_out(&self) {
        self.forget_session();
        self.client.logout_no_wait();
        self.bus.publish(AppEvent::SignedOut);
    }
}
