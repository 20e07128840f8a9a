//! Event-to-query mapping for recache
//!
//! This crate implements the declarative side of the router: a static,
//! insertion-ordered table of invalidation rules, each a pure function from
//! a change payload to the cache keys it should invalidate.
//!
//! Rules are data, not code branches: the dispatcher never switches on
//! table names, it asks the `RuleSet` for the rules matching a
//! (table, kind) pair and runs their derivations. A rule registered with
//! `EventKind::Wildcard` matches every event kind for its table.
//!
//! ## Broad-fallback contract
//!
//! Row-level security can mask the identifier field out of a payload. A
//! derivation must then fall back to the broad, id-less keys covering the
//! table's aggregate views, and must never emit a key with an empty
//! identifier segment. The helpers in [`derive`] encode this contract;
//! `InvalidationRule::derive_keys` also enforces it by dropping any key
//! containing a blank segment.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod registry;
pub mod rule;

pub use registry::{RuleSet, RuleSetBuilder};
pub use rule::{derive, InvalidationRule};
