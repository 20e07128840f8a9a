//! Collaborator trait seams
//!
//! The client-side data cache is an external collaborator: the router only
//! needs an idempotent `invalidate(key)` call and treats everything behind
//! it (refetch scheduling, subscriber notification) as the cache's own
//! policy.

use crate::error::CacheError;
use crate::types::CacheKey;

/// The external client-side cache the dispatcher invalidates against
///
/// Implementations must be safe to call concurrently, and `invalidate` must
/// be an idempotent no-op when the key holds no entry. Errors are advisory:
/// the dispatcher logs them and continues with the remaining keys in the
/// batch, relying on the next refresh or the next event for recovery.
pub trait CacheBackend: Send + Sync {
    /// Invalidate one cache entry, triggering dependent refetches per the
    /// cache's own policy
    fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError>;
}

/// A cache backend that drops every invalidation
///
/// Useful for wiring the router up before a real cache exists, and for
/// tests that only care about suppression or rule resolution.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl CacheBackend for NoopCache {
    fn invalidate(&self, _key: &CacheKey) -> Result<(), CacheError> {
        Ok(())
    }
}

impl<T: CacheBackend + ?Sized> CacheBackend for std::sync::Arc<T> {
    fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError> {
        (**self).invalidate(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_cache_accepts_any_key() {
        let cache = NoopCache;
        assert!(cache.invalidate(&CacheKey::broad("students")).is_ok());
        assert!(cache.invalidate(&CacheKey::of(Vec::<String>::new())).is_ok());
    }

    #[test]
    fn test_arc_forwarding() {
        let cache = std::sync::Arc::new(NoopCache);
        assert!(cache.invalidate(&CacheKey::scoped("students", "S1")).is_ok());
    }
}
