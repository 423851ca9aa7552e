use std::{
    fmt::Debug,
    future::Future,
    sync::{Arc, Mutex},
};

use futures::{
    future::{BoxFuture, Shared},
    FutureExt as _,
};

pub type SharedResult<T> = Shared<BoxFuture<'static, T>>;

/// Coalesces concurrent callers onto one in-flight operation. While an
/// operation is pending every caller gets a handle to the same result. Once it
/// completes the slot is emptied and the next caller starts a fresh one
pub struct SingleFlight<T: Clone> {
    pending: Arc<Mutex<Option<SharedResult<T>>>>,
}

impl<T: Clone> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            pending: Default::default(),
        }
    }
}

impl<T: Clone> Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("is_in_flight", &self.is_in_flight())
            .finish()
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Joins the pending operation or starts one using `start`. `start` is only
    /// called when nothing is pending
    pub fn run<F, Fut>(&self, start: F) -> SharedResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.run_unless(|| None, start)
    }

    /// Same as [`Self::run`] but `settled` is asked first, while the slot is
    /// locked. If it already has an answer nothing is joined or started
    pub fn run_unless<S, F, Fut>(&self, settled: S, start: F) -> SharedResult<T>
    where
        S: FnOnce() -> Option<T>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut guard = self.pending.lock().expect("mutex poisoned");
        if let Some(value) = settled() {
            return futures::future::ready(value).boxed().shared();
        }
        if let Some(pending) = guard.as_ref() {
            return pending.clone();
        }
        let slot = Arc::clone(&self.pending);
        let operation = start();
        let shared = async move {
            let result = operation.await;
            *slot.lock().expect("mutex poisoned") = None;
            result
        }
        .boxed()
        .shared();
        *guard = Some(shared.clone());
        shared
    }
}

impl<T: Clone> SingleFlight<T> {
    pub fn is_in_flight(&self) -> bool {
        self.pending.lock().expect("mutex poisoned").is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::channel::oneshot;

    use super::*;

    #[tokio::test]
    async fn concurrent_callers_share_one_operation() {
        let flight = SingleFlight::<u32>::default();
        let starts = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel::<u32>();
        let mut rx = Some(rx);

        let mut handles = Vec::new();
        for _ in 0..5 {
            let starts = Arc::clone(&starts);
            let rx = &mut rx;
            handles.push(flight.run(|| {
                starts.fetch_add(1, Ordering::SeqCst);
                let rx = rx.take().unwrap();
                async move { rx.await.unwrap() }
            }));
        }
        assert!(flight.is_in_flight());
        tx.send(42).unwrap();

        let results = futures::future::join_all(handles).await;
        assert_eq!(results, vec![42; 5]);
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(!flight.is_in_flight());
    }

    #[tokio::test]
    async fn settled_answer_skips_the_operation() {
        let flight = SingleFlight::<u32>::default();
        let starts = AtomicUsize::new(0);

        let actual = flight
            .run_unless(
                || Some(7),
                || {
                    starts.fetch_add(1, Ordering::SeqCst);
                    async { 1 }
                },
            )
            .await;

        assert_eq!(actual, 7);
        assert_eq!(starts.load(Ordering::SeqCst), 0);
        assert!(!flight.is_in_flight());
    }

    #[tokio::test]
    async fn completed_operation_is_not_reused() {
        let flight = SingleFlight::<u32>::default();
        assert_eq!(flight.run(|| async { 1 }).await, 1);
        assert_eq!(flight.run(|| async { 2 }).await, 2);
    }
}
