//! Stores functionality shared by every dashboard page: talking to the
//! backend, knowing who is signed in and passing events between pages
//! NB: The assumption is made that the async runtime has already been started
//! before any functions from this library are called

#![warn(unused_crate_dependencies)]

mod client;
pub mod errors;
pub mod events;
pub mod session_guard;

pub use client::{
    api::LoginOutcome, normalize_base_url, normalize_response, AuthRetryState, Client,
    CredentialEpoch, MemoryTokenStore, RawRequest, RawResponse, ReqwestTransport, SharedResult, SingleFlight,
    TokenStore, Transport, UiCallBack, NO_QUERY,
};
pub use errors::{RequestError, TransportError};
pub use events::{AppEvent, EventBus, SnapshotEvent, Subscription};
pub use session_guard::{GuardOutcome, SessionGuard};

#[cfg(target_arch = "wasm32")]
pub use client::LocalStorageTokenStore;
