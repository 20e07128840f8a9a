//! Assembled router: tracker + dispatcher + subscription wiring
//!
//! Most embedders want the whole pipeline, not the individual parts. The
//! `Router` builds them from a `RouterConfig`, exposes the local-write
//! integration contract (`record_local_write`), and can attach a
//! subscription worker to a notification channel.

use crate::config::RouterConfig;
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::subscription::Subscription;
use crate::tracker::MutationTracker;
use recache_core::{
    CacheBackend, ChangeEvent, Clock, Result, RowId, SystemClock, TableName,
};
use recache_rules::RuleSet;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// The full invalidation pipeline behind one handle
pub struct Router<C: CacheBackend> {
    tracker: Arc<MutationTracker>,
    dispatcher: Arc<Dispatcher<C>>,
}

impl<C: CacheBackend + 'static> Router<C> {
    /// Build a router from a rule set, cache collaborator, and config
    ///
    /// Uses the system monotonic clock.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` when the config fails validation.
    pub fn new(rules: RuleSet, cache: C, config: RouterConfig) -> Result<Self> {
        Self::with_clock(rules, cache, config, Arc::new(SystemClock))
    }

    /// Build a router with an injected clock
    ///
    /// Tests pass a `ManualClock` here to step the suppression window
    /// deterministically.
    pub fn with_clock(
        rules: RuleSet,
        cache: C,
        config: RouterConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let tracker = Arc::new(MutationTracker::with_sweep(
            config.suppression_window(),
            clock,
            config.sweep_every,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(rules),
            Arc::clone(&tracker),
            cache,
            config.row_id_field.clone(),
        ));
        Ok(Self {
            tracker,
            dispatcher,
        })
    }

    /// Integration contract for the write path
    ///
    /// Call immediately after a successful local write, before the
    /// backend's echoed notification can plausibly arrive.
    pub fn record_local_write(&self, table: impl Into<TableName>, row_id: impl Into<RowId>) {
        self.tracker.record(table, row_id);
    }

    /// Dispatch one event synchronously
    ///
    /// For embedders that already own an event loop and don't want the
    /// built-in subscription worker.
    pub fn on_change_event(&self, event: &ChangeEvent) -> DispatchOutcome {
        self.dispatcher.on_change_event(event)
    }

    /// Attach a worker thread draining `events` into the dispatcher
    ///
    /// # Errors
    /// Returns `Error::IoError` if the worker thread cannot be spawned.
    pub fn subscribe(&self, events: Receiver<ChangeEvent>) -> Result<Subscription> {
        Subscription::spawn(Arc::clone(&self.dispatcher), events)
    }

    /// The shared mutation tracker
    pub fn tracker(&self) -> &Arc<MutationTracker> {
        &self.tracker
    }

    /// The dispatcher
    pub fn dispatcher(&self) -> &Arc<Dispatcher<C>> {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recache_core::{CacheKey, EventKind, NoopCache, Payload};
    use recache_rules::derive;

    fn empty_rules() -> RuleSet {
        RuleSet::builder().build()
    }

    #[test]
    fn test_invalid_config_rejected_at_build() {
        let config = RouterConfig {
            suppression_window_ms: 0,
            ..Default::default()
        };
        assert!(Router::new(empty_rules(), NoopCache, config).is_err());
    }

    #[test]
    fn test_record_and_dispatch_roundtrip() {
        let rules = RuleSet::builder()
            .rule(
                "students",
                EventKind::Update,
                derive::broad_keys(vec![CacheKey::broad("students")]),
            )
            .build();
        let router = Router::new(rules, NoopCache, RouterConfig::default()).unwrap();

        router.record_local_write("students", "S1");
        let mut payload = Payload::new();
        payload.insert("id".to_string(), serde_json::json!("S1"));
        let event = ChangeEvent::new("students", EventKind::Update, payload);

        assert!(router.on_change_event(&event).suppressed);
        assert!(!router.on_change_event(&event).suppressed);
    }

    #[test]
    fn test_subscribe_and_shutdown() {
        let router = Router::new(empty_rules(), NoopCache, RouterConfig::default()).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let sub = router.subscribe(rx).unwrap();
        tx.send(ChangeEvent::new("anything", EventKind::Insert, Payload::new()))
            .unwrap();
        sub.shutdown();
    }
}
