//! The process-wide rule registry
//!
//! Built once at startup, read-only afterwards. Lookup returns matching
//! rules in the order they were registered, so a table's derivations fire
//! deterministically.

use crate::rule::InvalidationRule;
use recache_core::{EventKind, Payload, TableName};
use rustc_hash::FxHashMap;

/// Immutable, insertion-ordered set of invalidation rules
///
/// Lookup is indexed by table; kind filtering (exact or wildcard) happens
/// per rule. An unmatched (table, kind) pair is legal and yields an empty
/// iterator — fail-open, not an error.
pub struct RuleSet {
    rules: Vec<InvalidationRule>,
    by_table: FxHashMap<TableName, Vec<usize>>,
}

impl RuleSet {
    /// Start building a rule set
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder { rules: Vec::new() }
    }

    /// All rules matching (table, kind), in registration order
    ///
    /// A rule matches when its table equals `table` and its kind is either
    /// exactly `kind` or `Wildcard`.
    pub fn rules_for<'a>(
        &'a self,
        table: &TableName,
        kind: EventKind,
    ) -> impl Iterator<Item = &'a InvalidationRule> {
        self.by_table
            .get(table)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.rules[idx])
            .filter(move |rule| rule.matches(kind))
    }

    /// Run every matching rule's derivation against `payload`, in order
    ///
    /// Duplicates are not removed here; the dispatcher unions across rules.
    pub fn derive_all(
        &self,
        table: &TableName,
        kind: EventKind,
        payload: &Payload,
    ) -> Vec<recache_core::CacheKey> {
        self.rules_for(table, kind)
            .flat_map(|rule| rule.derive_keys(payload))
            .collect()
    }

    /// Total number of registered rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no rules are registered
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Tables that have at least one rule
    pub fn tables(&self) -> impl Iterator<Item = &TableName> {
        self.by_table.keys()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules.len())
            .field("tables", &self.by_table.len())
            .finish()
    }
}

/// Builder for [`RuleSet`]
///
/// Registration order is preserved and becomes the lookup order.
pub struct RuleSetBuilder {
    rules: Vec<InvalidationRule>,
}

impl RuleSetBuilder {
    /// Register a rule built inline from its parts
    pub fn rule<F>(self, table: impl Into<TableName>, kind: EventKind, derive: F) -> Self
    where
        F: Fn(&Payload) -> Vec<recache_core::CacheKey> + Send + Sync + 'static,
    {
        self.add(InvalidationRule::new(table, kind, derive))
    }

    /// Register an already-constructed rule
    pub fn add(mut self, rule: InvalidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Freeze the set
    pub fn build(self) -> RuleSet {
        let mut by_table: FxHashMap<TableName, Vec<usize>> = FxHashMap::default();
        for (idx, rule) in self.rules.iter().enumerate() {
            by_table.entry(rule.table().clone()).or_default().push(idx);
        }
        RuleSet {
            rules: self.rules,
            by_table,
        }
    }
}
