//! Typed publish/subscribe channel owned by the application root

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, Weak},
};

use futures::{
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    FutureExt as _, Stream, StreamExt as _,
};
use patrol_shared::{
    location::{Kpis, LocationSnapshot},
    uac::Session,
};
use patrol_time::Millis;

/// Result of one successful poll cycle
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEvent {
    pub kpis: Kpis,
    pub records: LocationSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    SnapshotPublished(Arc<SnapshotEvent>),
    RoleChanged(Arc<Session>),
    SignedOut,
    VisibilityChanged { hidden: bool },
    SetPollInterval(Millis),
    Teardown,
}

type Subscribers = Mutex<BusInner>;

#[derive(Debug, Default)]
struct BusInner {
    next_id: u64,
    subscribers: BTreeMap<u64, UnboundedSender<AppEvent>>,
}

#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<Subscribers>,
}

/// Receives every event published after it was created. Unsubscribes when
/// dropped
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    bus: Weak<Subscribers>,
    rx: UnboundedReceiver<AppEvent>,
}

impl EventBus {
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded();
        let mut inner = self.inner.lock().expect("mutex poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(id, tx);
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
            rx,
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn publish(&self, event: AppEvent) {
        let mut inner = self.inner.lock().expect("mutex poisoned");
        inner
            .subscribers
            .retain(|_, tx| tx.unbounded_send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().expect("mutex poisoned").subscribers.len()
    }
}

impl Subscription {
    /// Next event if one is already waiting
    pub fn try_next(&mut self) -> Option<AppEvent> {
        self.rx.next().now_or_never().flatten()
    }

    /// Everything waiting right now, oldest first
    pub fn drain(&mut self) -> Vec<AppEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

impl Stream for Subscription {
    type Item = AppEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.rx.poll_next_unpin(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.lock()
                .expect("mutex poisoned")
                .subscribers
                .remove(&self.id);
        }
    }
}
