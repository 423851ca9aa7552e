use patrol_client_core::Client;
use patrol_dashboard::screens::{CrudEntity, ListScreen};
use patrol_test_helper::{start_tracing, FakeBackend, TOKEN_FRESH};
use patrol_time::Instant;

pub use patrol_test_helper::{fixtures, no_cb};

/// Upper bound on frames before a scenario is considered stuck
pub const MAX_FRAMES: usize = 100;

/// Backend that only accepts [`TOKEN_FRESH`] and a client already holding it
pub fn signed_in() -> (FakeBackend, Client) {
    start_tracing();
    let backend = FakeBackend::new();
    backend.require_fresh_token(true);
    let client = backend.client_with_token(Some(TOKEN_FRESH));
    (backend, client)
}

/// Lets the spawned requests run, the same as a frame going by
pub async fn next_frame() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

/// Ticks the screen at `now` until nothing is waiting on the backend
pub async fn settle<E: CrudEntity>(screen: &mut ListScreen<E>, client: &Client, now: Instant) {
    for _ in 0..MAX_FRAMES {
        screen.tick(client, now, no_cb);
        if !screen.is_busy() {
            return;
        }
        next_frame().await;
    }
    panic!("list screen never settled");
}
