//! Core types for the invalidation router
//!
//! This module defines the foundational types:
//! - TableName: name of a watched backend table
//! - RowId: primary-key identifier of a backend row
//! - EventKind: change-notification discriminator
//! - Payload: opaque notification payload (field name → value)
//! - ChangeEvent: one backend row-change notification
//! - CacheKey: ordered string segments identifying one cache entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a backend table watched for change notifications
///
/// TableNames are compared case-sensitively; the set of watched tables is
/// fixed by the subscription the embedding application opens, so no
/// normalization is applied here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableName(String);

impl TableName {
    /// Create a table name from anything string-like
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TableName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TableName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Primary-key identifier of a backend row
///
/// Row ids are treated as opaque strings: the backend may use UUIDs,
/// integers, or composite text keys, and the router never interprets them
/// beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId(String);

impl RowId {
    /// Create a row id from anything string-like
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of change a notification describes
///
/// `Wildcard` is only meaningful on the rule side, where it matches any
/// event kind for its table. A notification arriving with kind `Wildcard`
/// is malformed and is dropped as a debug-logged no-op by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    /// A row was inserted
    Insert,
    /// A row was updated
    Update,
    /// A row was deleted
    Delete,
    /// Rule-side catch-all; matches any event kind for the same table
    Wildcard,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Insert => "INSERT",
            EventKind::Update => "UPDATE",
            EventKind::Delete => "DELETE",
            EventKind::Wildcard => "*",
        };
        write!(f, "{s}")
    }
}

/// Opaque change-notification payload: field name → JSON value
///
/// The shape is owned by the backend, not by this crate. Row-level security
/// may mask any field, including the row identifier, so consumers must
/// tolerate absent fields.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One backend row-change notification
///
/// Ephemeral: created on receipt, discarded after dispatch. The payload may
/// be empty when row-level security hides the row from this client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Source table of the change
    pub table: TableName,
    /// What happened to the row
    pub kind: EventKind,
    /// Opaque field map; may be empty or partially masked
    pub payload: Payload,
    /// Wall-clock receipt time, for logging only
    pub received_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create an event stamped with the current receipt time
    pub fn new(table: impl Into<TableName>, kind: EventKind, payload: Payload) -> Self {
        Self {
            table: table.into(),
            kind,
            payload,
            received_at: Utc::now(),
        }
    }

    /// Read a payload field as a string, if present and non-blank
    ///
    /// Numeric values are rendered in decimal so integer primary keys work
    /// the same as text ones. Null, blank, and non-scalar values yield None.
    pub fn field_str(&self, field: &str) -> Option<String> {
        field_str(&self.payload, field)
    }

    /// Extract the row identifier from the named payload field
    ///
    /// Returns None when the field is absent or masked; the caller decides
    /// whether that means "cannot suppress" or "use broad keys".
    pub fn row_id(&self, id_field: &str) -> Option<RowId> {
        self.field_str(id_field).map(RowId::new)
    }
}

/// Read a field of a payload as a non-blank string
pub fn field_str(payload: &Payload, field: &str) -> Option<String> {
    match payload.get(field)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Ordered string segments identifying one client-cache entry
///
/// Equality and hashing are structural (segment by segment); this is the
/// unit at which the client cache invalidates and refetches. Displayed as
/// `seg1/seg2/...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    /// Build a key from an ordered sequence of segments
    pub fn of<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Build a single-segment key, the usual broad "whole table" form
    pub fn broad(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Build a `[prefix, id]` key scoped to one entity
    pub fn scoped(prefix: impl Into<String>, id: impl Into<String>) -> Self {
        Self(vec![prefix.into(), id.into()])
    }

    /// Borrow the segments in order
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the key has no segments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl<S: Into<String>> FromIterator<S> for CacheKey {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::of(iter)
    }
}
