//! Which page is showing and the identity checks gating the move to another one

use std::sync::Arc;

use futures::channel::oneshot;
use patrol_client_core::{GuardOutcome, SessionGuard, UiCallBack};
use patrol_shared::{
    log_err_as_warn,
    uac::{PageAccess, Session},
};
use tracing::info;

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::EnumIter,
    strum::Display,
)]
pub enum Route {
    #[default]
    Login,
    Dashboard,
    #[strum(serialize = "Usuarios")]
    Users,
    #[strum(serialize = "Patrullas")]
    Patrols,
}

impl Route {
    /// `None` for pages anyone can see
    pub fn access(&self) -> Option<PageAccess> {
        match self {
            Route::Login => None,
            Route::Dashboard => Some(PageAccess::Authenticated),
            Route::Users | Route::Patrols => Some(PageAccess::AdminRequired),
        }
    }
}

/// Where a refused navigation lands
pub const ROUTE_WHEN_NOT_ALLOWED: Route = Route::Dashboard;

#[derive(Debug)]
struct PendingCheck {
    to: Route,
    rx: oneshot::Receiver<GuardOutcome>,
}

#[derive(Debug, Default)]
pub struct Navigator {
    current: Route,
    pending: Option<PendingCheck>,
    session: Option<Arc<Session>>,
}

impl Navigator {
    pub fn current(&self) -> Route {
        self.current
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// An identity check is running for a page change
    pub fn is_checking(&self) -> bool {
        self.pending.is_some()
    }

    /// The login page is shown straight away, every other page waits for the
    /// guard. A newer navigation replaces one still being checked
    pub fn navigate<N: UiCallBack>(
        &mut self,
        guard: &SessionGuard,
        to: Route,
        force_refresh: bool,
        notify: N,
    ) {
        let Some(access) = to.access() else {
            self.go_to_login();
            return;
        };
        info!(%to, "navigation requested");
        self.pending = Some(PendingCheck {
            to,
            rx: guard.ensure_authenticated_ui(access, force_refresh, notify),
        });
    }

    pub fn go_to_login(&mut self) {
        self.pending = None;
        self.session = None;
        self.current = Route::Login;
    }

    /// Applies the outcome of a finished check. Returns true if the page changed
    pub fn tick(&mut self) -> bool {
        let Some(pending) = &mut self.pending else {
            return false;
        };
        let outcome = match log_err_as_warn!(pending.rx.try_recv(), "identity check dropped") {
            Some(None) => return false,
            Some(Some(outcome)) => outcome,
            None => GuardOutcome::RedirectToLogin,
        };
        let to = pending.to;
        self.pending = None;
        let before = self.current;
        match outcome {
            GuardOutcome::Allowed(session) => {
                self.session = Some(session);
                self.current = to;
            }
            GuardOutcome::RedirectToLogin => self.go_to_login(),
            GuardOutcome::RedirectAway(session) => {
                info!(%to, role = %session.role, "page needs admin role");
                self.session = Some(session);
                self.current = ROUTE_WHEN_NOT_ALLOWED;
            }
        }
        before != self.current
    }
}
