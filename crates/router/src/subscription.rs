//! Change-feed consumer worker
//!
//! One worker thread drains the notification channel in FIFO order and
//! hands each event to the dispatcher. Single-stream FIFO is what gives
//! the per-(table, row) ordering guarantee, so there is deliberately no
//! worker pool here; invalidation work per event is cheap.
//!
//! Teardown lets the in-flight event finish: `shutdown` raises a flag the
//! worker checks between events, then joins the thread. Dropping the
//! subscription does the same.

use crate::dispatcher::Dispatcher;
use parking_lot::Mutex;
use recache_core::{CacheBackend, ChangeEvent, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

// How long the worker blocks on the channel before re-checking shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

struct SubscriptionInner {
    shutdown: AtomicBool,
    events_processed: AtomicU64,
}

/// Handle to the running change-feed worker
///
/// The channel's sender side belongs to the external notification
/// collaborator; the subscription owns the receiver and the worker thread.
/// The worker exits when `shutdown` is called or the sender disconnects.
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Subscription {
    /// Spawn the worker thread over a dispatcher and an event receiver
    ///
    /// # Errors
    /// Returns `Error::IoError` if the thread cannot be spawned.
    pub fn spawn<C>(dispatcher: Arc<Dispatcher<C>>, events: Receiver<ChangeEvent>) -> Result<Self>
    where
        C: CacheBackend + 'static,
    {
        let inner = Arc::new(SubscriptionInner {
            shutdown: AtomicBool::new(false),
            events_processed: AtomicU64::new(0),
        });

        let inner_clone = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name("recache-sub".to_string())
            .spawn(move || {
                loop {
                    if inner_clone.shutdown.load(Ordering::SeqCst) {
                        break;
                    }
                    match events.recv_timeout(POLL_INTERVAL) {
                        Ok(event) => {
                            dispatcher.on_change_event(&event);
                            inner_clone.events_processed.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => {
                            debug!("notification channel closed, subscription worker exiting");
                            break;
                        }
                    }
                }
            })?;

        Ok(Self {
            inner,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Events fully dispatched so far
    pub fn events_processed(&self) -> u64 {
        self.inner.events_processed.load(Ordering::SeqCst)
    }

    /// Stop consuming and wait for the worker to finish
    ///
    /// The event being dispatched when the flag is raised completes before
    /// the worker exits, so no key is left half-invalidated. Idempotent.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().take() {
            // A panicking worker already lost its events; nothing to do
            let _ = handle.join();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::MutationTracker;
    use parking_lot::Mutex as PlMutex;
    use recache_core::{CacheError, CacheKey, Clock, EventKind, ManualClock, Payload, SystemClock};
    use recache_rules::{derive, RuleSet};
    use std::sync::mpsc;
    use std::time::Instant;

    #[derive(Default)]
    struct CountingCache {
        keys: PlMutex<Vec<CacheKey>>,
    }

    impl CacheBackend for CountingCache {
        fn invalidate(&self, key: &CacheKey) -> std::result::Result<(), CacheError> {
            self.keys.lock().push(key.clone());
            Ok(())
        }
    }

    fn spawn_subscription(
        cache: Arc<CountingCache>,
    ) -> (Subscription, mpsc::Sender<ChangeEvent>) {
        let rules = Arc::new(
            RuleSet::builder()
                .rule(
                    "attendance",
                    EventKind::Insert,
                    derive::broad_keys(vec![CacheKey::broad("attendance")]),
                )
                .build(),
        );
        let tracker = Arc::new(MutationTracker::new(
            Duration::from_secs(3),
            Arc::new(SystemClock) as Arc<dyn Clock>,
        ));
        let dispatcher = Arc::new(Dispatcher::new(rules, tracker, cache, "id"));
        let (tx, rx) = mpsc::channel();
        let sub = Subscription::spawn(dispatcher, rx).unwrap();
        (sub, tx)
    }

    fn wait_for(sub: &Subscription, n: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while sub.events_processed() < n {
            assert!(Instant::now() < deadline, "worker did not catch up in time");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_worker_dispatches_in_fifo_order() {
        let cache = Arc::new(CountingCache::default());
        let rules = Arc::new(
            RuleSet::builder()
                .rule(
                    "attendance",
                    EventKind::Insert,
                    derive::with_id_scoped(vec![], "seq", "attendance-row"),
                )
                .build(),
        );
        let tracker = Arc::new(MutationTracker::new(
            Duration::from_secs(3),
            Arc::new(ManualClock::new()) as Arc<dyn Clock>,
        ));
        let dispatcher = Arc::new(Dispatcher::new(rules, tracker, Arc::clone(&cache), "id"));
        let (tx, rx) = mpsc::channel();
        let sub = Subscription::spawn(dispatcher, rx).unwrap();

        for i in 0..20 {
            let mut payload = Payload::new();
            payload.insert("seq".to_string(), serde_json::json!(i.to_string()));
            tx.send(ChangeEvent::new("attendance", EventKind::Insert, payload))
                .unwrap();
        }
        wait_for(&sub, 20);

        let expected: Vec<_> = (0..20)
            .map(|i| CacheKey::scoped("attendance-row", i.to_string()))
            .collect();
        assert_eq!(*cache.keys.lock(), expected);
    }

    #[test]
    fn test_shutdown_joins_worker() {
        let cache = Arc::new(CountingCache::default());
        let (sub, tx) = spawn_subscription(Arc::clone(&cache));

        tx.send(ChangeEvent::new("attendance", EventKind::Insert, Payload::new()))
            .unwrap();
        wait_for(&sub, 1);
        sub.shutdown();
        // Idempotent
        sub.shutdown();
        assert_eq!(cache.keys.lock().len(), 1);
    }

    #[test]
    fn test_worker_exits_when_sender_disconnects() {
        let cache = Arc::new(CountingCache::default());
        let (sub, tx) = spawn_subscription(cache);
        drop(tx);
        // shutdown() must still join cleanly after the worker self-exited
        sub.shutdown();
    }

    #[test]
    fn test_drop_tears_down() {
        let cache = Arc::new(CountingCache::default());
        let (sub, tx) = spawn_subscription(Arc::clone(&cache));
        tx.send(ChangeEvent::new("attendance", EventKind::Insert, Payload::new()))
            .unwrap();
        wait_for(&sub, 1);
        drop(sub);
        assert_eq!(cache.keys.lock().len(), 1);
    }
}
