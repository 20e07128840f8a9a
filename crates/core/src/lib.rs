//! Core types and traits for recache
//!
//! This crate defines the foundational types used throughout the system:
//! - TableName / RowId: identifiers for backend rows
//! - EventKind: discriminates insert/update/delete change notifications
//! - ChangeEvent: one backend row-change notification
//! - CacheKey: the unit of client-cache invalidation
//! - Error / CacheError: error type hierarchy
//! - Clock: injectable monotonic time source
//! - CacheBackend: the external cache collaborator seam

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types and traits
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, Error, Result};
pub use traits::{CacheBackend, NoopCache};
pub use types::{field_str, CacheKey, ChangeEvent, EventKind, Payload, RowId, TableName};
