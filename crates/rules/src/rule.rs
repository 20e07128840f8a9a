//! Invalidation rules and key-derivation helpers

use recache_core::types::field_str;
use recache_core::{CacheKey, EventKind, Payload, TableName};
use std::fmt;

/// Boxed pure derivation: change payload → cache keys to invalidate
pub type DeriveFn = Box<dyn Fn(&Payload) -> Vec<CacheKey> + Send + Sync>;

/// One entry of the event-to-query map
///
/// Immutable once built; the derivation must be a pure function of the
/// payload (same payload, same keys; no I/O, no external state).
pub struct InvalidationRule {
    table: TableName,
    kind: EventKind,
    derive: DeriveFn,
}

impl InvalidationRule {
    /// Create a rule for (table, kind) with the given derivation
    pub fn new<F>(table: impl Into<TableName>, kind: EventKind, derive: F) -> Self
    where
        F: Fn(&Payload) -> Vec<CacheKey> + Send + Sync + 'static,
    {
        Self {
            table: table.into(),
            kind,
            derive: Box::new(derive),
        }
    }

    /// Table this rule watches
    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Event kind this rule fires on (`Wildcard` fires on all kinds)
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Whether this rule fires for an event of `kind`
    pub fn matches(&self, kind: EventKind) -> bool {
        self.kind == EventKind::Wildcard || self.kind == kind
    }

    /// Run the derivation against a payload
    ///
    /// Keys containing a blank segment are dropped here, so a derivation
    /// that interpolates a masked identifier can never leak an
    /// empty-segment key to the cache.
    pub fn derive_keys(&self, payload: &Payload) -> Vec<CacheKey> {
        (self.derive)(payload)
            .into_iter()
            .filter(|key| {
                let well_formed =
                    !key.is_empty() && key.segments().iter().all(|s| !s.trim().is_empty());
                if !well_formed {
                    tracing::debug!(table = %self.table, %key, "dropping key with blank segment");
                }
                well_formed
            })
            .collect()
    }
}

impl fmt::Debug for InvalidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationRule")
            .field("table", &self.table)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Ready-made derivations covering the common rule shapes
///
/// All helpers honor the broad-fallback contract: when the identifier
/// field is absent or blank, only the broad keys are produced.
pub mod derive {
    use super::*;

    /// Always invalidate the same fixed set of keys
    pub fn broad_keys(keys: Vec<CacheKey>) -> impl Fn(&Payload) -> Vec<CacheKey> {
        move |_payload| keys.clone()
    }

    /// Broad keys always, plus `[scoped_prefix, id]` when `id_field` is
    /// present in the payload
    pub fn with_id_scoped(
        broad: Vec<CacheKey>,
        id_field: &str,
        scoped_prefix: &str,
    ) -> impl Fn(&Payload) -> Vec<CacheKey> {
        let id_field = id_field.to_string();
        let scoped_prefix = scoped_prefix.to_string();
        move |payload| {
            let mut keys = broad.clone();
            if let Some(id) = field_str(payload, &id_field) {
                keys.push(CacheKey::scoped(&scoped_prefix, id));
            }
            keys
        }
    }

    /// `[scoped_prefix, id]` when the identifier is present, otherwise the
    /// broad fallback keys
    ///
    /// Unlike [`with_id_scoped`], the broad keys here are a substitute for
    /// the scoped key, not a constant companion to it.
    pub fn id_scoped_or_broad(
        id_field: &str,
        scoped_prefix: &str,
        fallback: Vec<CacheKey>,
    ) -> impl Fn(&Payload) -> Vec<CacheKey> {
        let id_field = id_field.to_string();
        let scoped_prefix = scoped_prefix.to_string();
        move |payload| match field_str(payload, &id_field) {
            Some(id) => vec![CacheKey::scoped(&scoped_prefix, id)],
            None => fallback.clone(),
        }
    }

    /// Union of several derivations, in order
    pub fn all(
        parts: Vec<DeriveFn>,
    ) -> impl Fn(&Payload) -> Vec<CacheKey> {
        move |payload| parts.iter().flat_map(|f| f(payload)).collect()
    }
}
