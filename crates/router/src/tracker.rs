//! Self-echo suppression registry
//!
//! When this client writes a row, the backend echoes the write back as a
//! change notification. Refetching on that echo is pure waste: the local
//! cache was already updated by the write path. The tracker remembers which
//! (table, row) pairs this client just wrote so the dispatcher can drop
//! their echoes.
//!
//! ## Expiry
//!
//! Records expire after a configurable window. Expiry is purely time-based
//! and lazily enforced: a lookup treats an expired record as absent even if
//! it has not been physically purged yet. An opportunistic sweep on the
//! record path bounds memory; correctness never depends on it.

use dashmap::DashMap;
use recache_core::{Clock, RowId, TableName};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Registry of rows this client just mutated
///
/// The only mutable state shared between the write path and the dispatch
/// path. All access goes through `DashMap`'s sharded locks, so `record` and
/// `should_suppress` for the same key are mutually exclusive.
pub struct MutationTracker {
    records: DashMap<(TableName, RowId), Instant>,
    window: Duration,
    clock: Arc<dyn Clock>,
    sweep_every: u32,
    records_since_sweep: AtomicU32,
}

impl MutationTracker {
    /// Create a tracker with the given suppression window and clock
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self::with_sweep(window, clock, 64)
    }

    /// Create a tracker that sweeps expired records every `sweep_every`
    /// `record` calls
    pub fn with_sweep(window: Duration, clock: Arc<dyn Clock>, sweep_every: u32) -> Self {
        Self {
            records: DashMap::new(),
            window,
            clock,
            sweep_every: sweep_every.max(1),
            records_since_sweep: AtomicU32::new(0),
        }
    }

    /// Note a successful local write to (table, row_id)
    ///
    /// Idempotent: re-recording the same pair resets its expiry. Callers
    /// must invoke this immediately after the write succeeds, before the
    /// backend's echo can plausibly arrive.
    pub fn record(&self, table: impl Into<TableName>, row_id: impl Into<RowId>) {
        let key = (table.into(), row_id.into());
        self.records.insert(key, self.clock.now());

        let count = self.records_since_sweep.fetch_add(1, Ordering::Relaxed) + 1;
        if count >= self.sweep_every {
            self.records_since_sweep.store(0, Ordering::Relaxed);
            self.sweep();
        }
    }

    /// Whether a live record exists for (table, row_id)
    ///
    /// Pure query apart from lazily purging the record when it turns out to
    /// be expired.
    pub fn should_suppress(&self, table: &TableName, row_id: &RowId) -> bool {
        let key = (table.clone(), row_id.clone());
        let now = self.clock.now();
        // Copy the timestamp out before touching the map again; holding the
        // read guard across remove_if would deadlock on the shard lock.
        let recorded_at = self.records.get(&key).map(|entry| *entry);
        match recorded_at {
            Some(at) if self.is_live(at, now) => true,
            Some(_) => {
                self.records.remove_if(&key, |_, at| !self.is_live(*at, now));
                false
            }
            None => false,
        }
    }

    /// Consume the record for (table, row_id) if it is live
    ///
    /// Returns true and deletes the record on a hit, so one local write
    /// suppresses exactly one echoed notification. The check and the delete
    /// are a single guarded operation, safe against a concurrent `record`.
    pub fn consume(&self, table: &TableName, row_id: &RowId) -> bool {
        let key = (table.clone(), row_id.clone());
        let now = self.clock.now();
        let removed_live = self
            .records
            .remove_if(&key, |_, at| self.is_live(*at, now))
            .is_some();
        if !removed_live {
            // Lazy eviction of an expired leftover
            self.records.remove_if(&key, |_, at| !self.is_live(*at, now));
        }
        removed_live
    }

    /// Drop every expired record
    pub fn sweep(&self) {
        let now = self.clock.now();
        let before = self.records.len();
        self.records.retain(|_, at| self.is_live(*at, now));
        let purged = before.saturating_sub(self.records.len());
        if purged > 0 {
            debug!(purged, "swept expired mutation records");
        }
    }

    /// Number of physically present records, live or not
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are physically present
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn is_live(&self, recorded_at: Instant, now: Instant) -> bool {
        now.duration_since(recorded_at) < self.window
    }
}

impl std::fmt::Debug for MutationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationTracker")
            .field("records", &self.records.len())
            .field("window", &self.window)
            .finish()
    }
}
