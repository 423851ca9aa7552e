use patrol_client_core::Client;
use patrol_test_helper::{start_tracing, FakeBackend, TOKEN_FRESH};

pub use patrol_test_helper::{fixtures, no_cb, TOKEN_STALE};

/// Backend that only accepts [`TOKEN_FRESH`] and a client already holding it
pub fn signed_in() -> (FakeBackend, Client) {
    start_tracing();
    let backend = FakeBackend::new();
    backend.require_fresh_token(true);
    let client = backend.client_with_token(Some(TOKEN_FRESH));
    (backend, client)
}

/// Same backend but the client holds an expired token
pub fn signed_in_with_stale_token(refresh_succeeds: bool) -> (FakeBackend, Client) {
    start_tracing();
    let backend = FakeBackend::new();
    backend.require_fresh_token(refresh_succeeds);
    let client = backend.client_with_token(Some(TOKEN_STALE));
    (backend, client)
}
