//! Serialized ACL cache
//!
//! Sits between the provider's identity map and the backend. Entries are
//! stored as JSON under `prefix + object identity` and are evicted by the
//! provider whenever the ACL or one of its ancestors changes.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use ward_core::{ObjectIdentity, Result};
use ward_store::AclRecord;

/// Cache of persisted ACL records
pub trait AclCache: Send + Sync {
    /// Cached record, or `None` on a miss
    fn get(&self, object_identity: &ObjectIdentity) -> Option<AclRecord>;

    /// Store `record`, replacing any previous value
    fn put(&self, record: &AclRecord) -> Result<()>;

    /// Drop the record of `object_identity`
    fn evict(&self, object_identity: &ObjectIdentity);

    /// Drop every record
    fn clear(&self);
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached records
    pub size: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that fell through
    pub misses: u64,
}

/// Process-wide in-memory cache
#[derive(Debug)]
pub struct MemoryAclCache {
    prefix: String,
    entries: RwLock<HashMap<String, String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryAclCache {
    /// Create an empty cache using `prefix` for every key
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Key under which the record of `object_identity` is stored
    pub fn key(&self, object_identity: &ObjectIdentity) -> String {
        format!("{}{object_identity}", self.prefix)
    }

    /// Current statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.read().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Whether a record for `object_identity` is cached
    pub fn contains(&self, object_identity: &ObjectIdentity) -> bool {
        self.entries.read().contains_key(&self.key(object_identity))
    }
}

impl AclCache for MemoryAclCache {
    fn get(&self, object_identity: &ObjectIdentity) -> Option<AclRecord> {
        let key = self.key(object_identity);
        let Some(json) = self.entries.read().get(&key).cloned() else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        match AclRecord::from_json(&json) {
            Ok(record) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(record)
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "Dropping unreadable cache entry");
                self.entries.write().remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, record: &AclRecord) -> Result<()> {
        let json = record.to_json()?;
        self.entries
            .write()
            .insert(self.key(&record.object_identity), json);
        Ok(())
    }

    fn evict(&self, object_identity: &ObjectIdentity) {
        if self.entries.write().remove(&self.key(object_identity)).is_some() {
            tracing::trace!(object_identity = %object_identity, "Cache entry evicted");
        }
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> AclRecord {
        AclRecord::new(ObjectIdentity::new(id, "Post").unwrap(), None)
    }

    #[test]
    fn test_key_uses_prefix() {
        let cache = MemoryAclCache::new("ward_acl_");
        let oid = ObjectIdentity::new("7", "Post").unwrap();
        assert_eq!(cache.key(&oid), "ward_acl_Post:7");
    }

    #[test]
    fn test_put_get_evict() {
        let cache = MemoryAclCache::new("p_");
        let rec = record("1");
        assert!(cache.get(&rec.object_identity).is_none());

        cache.put(&rec).unwrap();
        assert_eq!(cache.get(&rec.object_identity), Some(rec.clone()));

        cache.evict(&rec.object_identity);
        assert!(!cache.contains(&rec.object_identity));
        assert_eq!(
            cache.stats(),
            CacheStats {
                size: 0,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn test_corrupt_entry_is_dropped() {
        let cache = MemoryAclCache::new("p_");
        let rec = record("1");
        cache
            .entries
            .write()
            .insert(cache.key(&rec.object_identity), "{not json".to_string());

        assert!(cache.get(&rec.object_identity).is_none());
        assert_eq!(cache.stats().size, 0);
    }
}
