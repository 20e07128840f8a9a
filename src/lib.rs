//! recache: realtime cache-invalidation router
//!
//! Subscribes to backend row-change notifications and translates each one
//! into the precise set of client-cache keys to invalidate, so views built
//! on cached server data refresh promptly without over-fetching.
//!
//! ## Components
//!
//! - **Mutation tracker**: remembers rows this client just wrote and drops
//!   the backend's echoes of those writes (no redundant refetch).
//! - **Rule set**: static, insertion-ordered table mapping (table, event
//!   kind) to pure key derivations, with wildcard kinds per table.
//! - **Dispatcher**: resolves rules per event, unions derived keys, and
//!   invalidates each against the cache collaborator, skipping (never
//!   retrying) keys that fail.
//!
//! ## Quick start
//!
//! ```no_run
//! use recache::{derive, CacheKey, EventKind, Router, RouterConfig, RuleSet, NoopCache};
//!
//! let rules = RuleSet::builder()
//!     .rule(
//!         "attendance",
//!         EventKind::Insert,
//!         derive::with_id_scoped(
//!             vec![CacheKey::broad("attendance")],
//!             "student_id",
//!             "student-dashboard",
//!         ),
//!     )
//!     .build();
//!
//! let router = Router::new(rules, NoopCache, RouterConfig::default()).unwrap();
//!
//! // Write path: suppress the echo of our own insert
//! router.record_local_write("attendance", "A7");
//!
//! // Notification path: feed a channel into the subscription worker
//! let (tx, rx) = std::sync::mpsc::channel();
//! let subscription = router.subscribe(rx).unwrap();
//! # drop(tx);
//! # drop(subscription);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use recache_core::{
    field_str, CacheBackend, CacheError, CacheKey, ChangeEvent, Clock, Error, EventKind,
    ManualClock, NoopCache, Payload, Result, RowId, SystemClock, TableName,
};
pub use recache_router::{
    DispatchOutcome, Dispatcher, MutationTracker, Router, RouterConfig, Subscription,
};
pub use recache_rules::{derive, InvalidationRule, RuleSet, RuleSetBuilder};
