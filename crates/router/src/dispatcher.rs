//! Event → cache-invalidation orchestration
//!
//! The dispatcher is the only component with side effects against the
//! cache. One call per change event:
//!
//! ```text
//! 1. consume() on the mutation tracker - drop self-echoes entirely
//! 2. rules_for(table, kind) - resolve exact + wildcard rules
//! 3. derive_keys() per rule, union by structural equality
//! 4. cache.invalidate(key) per unique key; log and continue on failure
//! ```
//!
//! Zero matching rules is a normal, silent no-op. A failing key never
//! blocks the rest of the batch and is never retried; the next refresh or
//! the next event for the same table recovers it passively.

use crate::tracker::MutationTracker;
use recache_core::{CacheBackend, CacheKey, ChangeEvent, EventKind};
use recache_rules::RuleSet;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-event dispatch summary
///
/// Cheap observability for embedders; the dispatcher itself never acts on
/// these counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// The event was a self-echo and was dropped before rule resolution
    pub suppressed: bool,
    /// Unique keys successfully invalidated
    pub keys_invalidated: usize,
    /// Unique keys whose invalidation failed and was skipped
    pub keys_failed: usize,
}

impl DispatchOutcome {
    fn suppressed() -> Self {
        Self {
            suppressed: true,
            ..Self::default()
        }
    }
}

/// Routes change events to cache invalidations
///
/// Holds the immutable rule set, the shared mutation tracker, and the cache
/// collaborator. `on_change_event` takes `&self` and is safe to call
/// concurrently for independent events; the tracker is the only shared
/// mutable state and serializes its own access.
pub struct Dispatcher<C: CacheBackend> {
    rules: Arc<RuleSet>,
    tracker: Arc<MutationTracker>,
    cache: C,
    row_id_field: String,
}

impl<C: CacheBackend> Dispatcher<C> {
    /// Create a dispatcher over the given collaborators
    pub fn new(
        rules: Arc<RuleSet>,
        tracker: Arc<MutationTracker>,
        cache: C,
        row_id_field: impl Into<String>,
    ) -> Self {
        Self {
            rules,
            tracker,
            cache,
            row_id_field: row_id_field.into(),
        }
    }

    /// Process one change event end to end
    pub fn on_change_event(&self, event: &ChangeEvent) -> DispatchOutcome {
        // A wildcard *event* kind is malformed; rules may be wildcards,
        // notifications may not.
        if event.kind == EventKind::Wildcard {
            debug!(table = %event.table, "dropping malformed event with wildcard kind");
            return DispatchOutcome::default();
        }

        // Self-echo suppression. Only possible when the payload still
        // carries the row identifier; an RLS-masked echo falls through and
        // causes one redundant (but harmless) refetch.
        if let Some(row_id) = event.row_id(&self.row_id_field) {
            if self.tracker.consume(&event.table, &row_id) {
                debug!(table = %event.table, %row_id, "suppressed self-echo");
                return DispatchOutcome::suppressed();
            }
        }

        let keys = self.unique_keys(event);
        if keys.is_empty() {
            debug!(table = %event.table, kind = %event.kind, "no rules matched event");
            return DispatchOutcome::default();
        }

        let mut outcome = DispatchOutcome::default();
        for key in &keys {
            match self.cache.invalidate(key) {
                Ok(()) => outcome.keys_invalidated += 1,
                Err(err) => {
                    // Skip, never retry; the remaining keys still go out.
                    warn!(%key, error = %err, "cache invalidation failed, skipping key");
                    outcome.keys_failed += 1;
                }
            }
        }
        outcome
    }

    /// Union of all matching rules' derived keys, first-derivation order
    fn unique_keys(&self, event: &ChangeEvent) -> Vec<CacheKey> {
        let mut seen: FxHashSet<CacheKey> = FxHashSet::default();
        let mut keys = Vec::new();
        for rule in self.rules.rules_for(&event.table, event.kind) {
            for key in rule.derive_keys(&event.payload) {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// The shared mutation tracker
    pub fn tracker(&self) -> &Arc<MutationTracker> {
        &self.tracker
    }

    /// The rule set this dispatcher resolves against
    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }
}
