//! Ancestor chain cache
//!
//! Ancestor chains are pure functions of the stored parent links, so two
//! threads computing the same chain concurrently produce the same value.
//! The cache therefore computes outside its lock and keeps whichever result
//! is inserted first.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use ward_core::{ObjectIdentity, Result};

/// Ancestor chain of one identity, nearest first
pub type AncestorChain = Arc<[ObjectIdentity]>;

/// Per-identity cache of ancestor chains
#[derive(Debug, Default)]
pub struct AncestorCache {
    chains: RwLock<HashMap<ObjectIdentity, AncestorChain>>,
}

impl AncestorCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached chain for `object_identity`, if present
    pub fn get(&self, object_identity: &ObjectIdentity) -> Option<AncestorChain> {
        self.chains.read().get(object_identity).cloned()
    }

    /// Cached chain, computing it with `compute` on a miss
    pub fn get_or_compute<F>(&self, object_identity: &ObjectIdentity, compute: F) -> Result<AncestorChain>
    where
        F: FnOnce() -> Result<Vec<ObjectIdentity>>,
    {
        if let Some(chain) = self.get(object_identity) {
            return Ok(chain);
        }

        let computed: AncestorChain = compute()?.into();
        let chain = self
            .chains
            .write()
            .entry(object_identity.clone())
            .or_insert(computed)
            .clone();
        tracing::trace!(
            object_identity = %object_identity,
            depth = chain.len(),
            "Ancestor chain cached"
        );
        Ok(chain)
    }

    /// Drop the chain of `object_identity` and of every identity below it
    pub fn invalidate(&self, object_identity: &ObjectIdentity) {
        self.chains
            .write()
            .retain(|oid, chain| oid != object_identity && !chain.contains(object_identity));
    }

    /// Drop every cached chain
    pub fn clear(&self) {
        self.chains.write().clear();
    }

    /// Number of cached chains
    pub fn len(&self) -> usize {
        self.chains.read().len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.chains.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn post(id: &str) -> ObjectIdentity {
        ObjectIdentity::new(id, "Post").unwrap()
    }

    #[test]
    fn test_computes_once_per_identity() {
        let cache = AncestorCache::new();
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![post("parent"), post("root")])
        };

        let first = cache.get_or_compute(&post("child"), compute).unwrap();
        let second = cache.get_or_compute(&post("child"), compute).unwrap();
        assert_eq!(&*first, &[post("parent"), post("root")]);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidate_drops_descendants() {
        let cache = AncestorCache::new();
        cache
            .get_or_compute(&post("child"), || Ok(vec![post("parent")]))
            .unwrap();
        cache
            .get_or_compute(&post("other"), || Ok(vec![post("root")]))
            .unwrap();

        cache.invalidate(&post("parent"));
        assert!(cache.get(&post("child")).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = AncestorCache::new();
        let result = cache.get_or_compute(&post("1"), || {
            Err(ward_core::WardError::acl_not_found("Post:1"))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
