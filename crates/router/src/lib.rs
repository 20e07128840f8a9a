//! Runtime side of recache
//!
//! This crate implements the stateful components of the invalidation
//! router:
//! - MutationTracker: self-echo suppression with time-window expiry
//! - Dispatcher: event → rule resolution → cache invalidation
//! - Subscription: FIFO change-feed worker with clean teardown
//! - Router: the assembled pipeline behind one handle
//!
//! ## Ordering and concurrency
//!
//! Events flowing through a `Subscription` are processed strictly FIFO on
//! one worker thread, which gives per-(table, row) ordering for free.
//! `Dispatcher::on_change_event` itself is `&self` and thread-safe, so
//! embedders with their own executors may fan out independent events; the
//! mutation tracker is the only shared mutable state and serializes its own
//! access.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatcher;
pub mod router;
pub mod subscription;
pub mod tracker;

pub use config::RouterConfig;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use router::Router;
pub use subscription::Subscription;
pub use tracker::MutationTracker;
