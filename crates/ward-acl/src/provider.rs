//! ACL providers
//!
//! A provider hands out shared [`Acl`] aggregates. Lookups go through an
//! identity map of already materialized ACLs, then the serialized cache,
//! then the backend. Mutations persist through the backend and evict the
//! cached records of the ACL and everything below it.

use crate::acl::{Acl, ClassEntries};
use crate::ancestry::{AncestorCache, AncestorChain};
use crate::cache::{AclCache, MemoryAclCache};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use ward_core::{ObjectIdentity, Result, SecurityIdentity, WardConfig, WardError};
use ward_store::{AclBackend, AclRecord};

/// Read access to ACLs
pub trait AclProvider: Send + Sync {
    /// ACL of `object_identity`, with its parent chain materialized
    ///
    /// `identities` names the requesters the ACL is loaded for; every entry
    /// is loaded regardless. Fails with `AclNotFound` when no ACL exists.
    fn find_acl(
        &self,
        object_identity: &ObjectIdentity,
        identities: &[SecurityIdentity],
    ) -> Result<Arc<Acl>>;

    /// ACLs of several identities, in the order requested
    ///
    /// Fails with `AclNotFound` naming the first identity without an ACL.
    fn find_acls(
        &self,
        object_identities: &[ObjectIdentity],
        identities: &[SecurityIdentity],
    ) -> Result<Vec<Arc<Acl>>> {
        object_identities
            .iter()
            .map(|oid| self.find_acl(oid, identities))
            .collect()
    }

    /// Identities whose ACL inherits from `object_identity`
    fn find_children(
        &self,
        object_identity: &ObjectIdentity,
        direct_only: bool,
    ) -> Result<Vec<ObjectIdentity>>;
}

/// Lifecycle and persistence of ACLs
pub trait MutableAclProvider: AclProvider {
    /// Create an empty ACL whose parent is the type root ACL
    ///
    /// The type root ACL is created on first use. Type roots themselves get
    /// no parent. Fails with `AclAlreadyExists` when the ACL exists.
    fn create_acl(&self, object_identity: &ObjectIdentity) -> Result<Arc<Acl>>;

    /// Create an empty ACL with an explicit parent (or none)
    fn create_acl_with_parent(
        &self,
        object_identity: &ObjectIdentity,
        parent: Option<&ObjectIdentity>,
    ) -> Result<Arc<Acl>>;

    /// Delete an ACL, refusing while other ACLs inherit from it
    fn delete_acl(&self, object_identity: &ObjectIdentity) -> Result<()>;

    /// Persist the entries, inheritance flag and parent of `acl`
    fn update_acl(&self, acl: &Acl) -> Result<()>;

    /// Re-parent an ACL, refusing to close a cycle
    fn set_parent(
        &self,
        object_identity: &ObjectIdentity,
        parent: Option<&ObjectIdentity>,
    ) -> Result<()>;
}

/// Provider over any [`AclBackend`]
pub struct WardAclProvider<B> {
    backend: B,
    cache: Option<Arc<dyn AclCache>>,
    loaded: RwLock<HashMap<ObjectIdentity, Arc<Acl>>>,
    class_entries: RwLock<HashMap<String, ClassEntries>>,
    ancestors: AncestorCache,
    lifecycle: Mutex<()>,
}

impl<B: AclBackend> std::fmt::Debug for WardAclProvider<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WardAclProvider")
            .field("cached", &self.cache.is_some())
            .field("loaded", &self.loaded.read().len())
            .field("ancestors", &self.ancestors.len())
            .finish_non_exhaustive()
    }
}

impl<B: AclBackend> WardAclProvider<B> {
    /// Provider configured from `config.cache`
    pub fn new(backend: B, config: &WardConfig) -> Self {
        let cache: Option<Arc<dyn AclCache>> = if config.cache.enabled {
            Some(Arc::new(MemoryAclCache::new(config.cache.prefix.as_str())))
        } else {
            None
        };
        Self::with_cache(backend, cache)
    }

    /// Provider using an explicit serialized cache (or none)
    pub fn with_cache(backend: B, cache: Option<Arc<dyn AclCache>>) -> Self {
        Self {
            backend,
            cache,
            loaded: RwLock::new(HashMap::new()),
            class_entries: RwLock::new(HashMap::new()),
            ancestors: AncestorCache::new(),
            lifecycle: Mutex::new(()),
        }
    }

    /// Underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create the backend tables
    pub fn init_schema(&self) -> Result<Vec<String>> {
        self.backend.init_schema()
    }

    /// Ancestor identities of `object_identity`, nearest first
    pub fn ancestors(&self, object_identity: &ObjectIdentity) -> Result<AncestorChain> {
        self.ancestors.get_or_compute(object_identity, || {
            self.find_acl(object_identity, &[])?.ancestor_identities()
        })
    }

    /// Drop every materialized ACL, forcing the next lookup to reload
    pub fn clear_loaded(&self) {
        self.loaded.write().clear();
        self.class_entries.write().clear();
        self.ancestors.clear();
    }

    fn loaded(&self, object_identity: &ObjectIdentity) -> Option<Arc<Acl>> {
        self.loaded.read().get(object_identity).cloned()
    }

    /// Keep the first ACL registered for an identity
    fn register(&self, acl: Arc<Acl>) -> Arc<Acl> {
        self.loaded
            .write()
            .entry(acl.object_identity().clone())
            .or_insert(acl)
            .clone()
    }

    fn class_entries_for(&self, object_type: &str) -> Result<ClassEntries> {
        if let Some(entries) = self.class_entries.read().get(object_type) {
            return Ok(entries.clone());
        }
        let stored = ClassEntries::new(self.backend.load_class_entries(object_type)?);
        Ok(self
            .class_entries
            .write()
            .entry(object_type.to_string())
            .or_insert(stored)
            .clone())
    }

    fn load_record(&self, object_identity: &ObjectIdentity) -> Result<Option<AclRecord>> {
        if let Some(record) = self.cache.as_ref().and_then(|c| c.get(object_identity)) {
            return Ok(Some(record));
        }
        let record = self.backend.load_acl(object_identity)?;
        if let (Some(cache), Some(record)) = (&self.cache, &record) {
            if let Err(err) = cache.put(record) {
                tracing::warn!(
                    object_identity = %object_identity,
                    error = %err,
                    "Failed to cache ACL record"
                );
            }
        }
        Ok(record)
    }

    fn exists(&self, object_identity: &ObjectIdentity) -> Result<bool> {
        if self.loaded(object_identity).is_some() {
            return Ok(true);
        }
        Ok(self.load_record(object_identity)?.is_some())
    }

    /// Evict cached state of `object_identity` and every descendant
    fn invalidate(&self, object_identity: &ObjectIdentity) -> Result<()> {
        let descendants = self.backend.find_children(object_identity, false)?;
        if let Some(cache) = &self.cache {
            cache.evict(object_identity);
            for child in &descendants {
                cache.evict(child);
            }
        }
        self.ancestors.invalidate(object_identity);
        tracing::debug!(
            object_identity = %object_identity,
            descendants = descendants.len(),
            "ACL cache invalidated"
        );
        Ok(())
    }

    /// Drop materialized ACLs that no longer match `acl`
    fn forget_stale(&self, acl: &Acl) -> Result<()> {
        let oid = acl.object_identity();
        let stale = self
            .loaded(oid)
            .is_some_and(|registered| !std::ptr::eq(Arc::as_ptr(&registered), acl));
        if stale {
            let descendants = self.backend.find_children(oid, false)?;
            let mut loaded = self.loaded.write();
            loaded.remove(oid);
            for child in &descendants {
                loaded.remove(child);
            }
        }
        Ok(())
    }

    fn create_locked(
        &self,
        object_identity: &ObjectIdentity,
        parent: Option<Arc<Acl>>,
    ) -> Result<Arc<Acl>> {
        if self.exists(object_identity)? {
            return Err(WardError::acl_already_exists(object_identity));
        }
        let class_entries = self.class_entries_for(object_identity.object_type())?;
        let acl = Arc::new(Acl::with_class_entries(
            object_identity.clone(),
            class_entries,
        ));
        acl.set_parent(parent)?;
        self.backend.save_acl(&acl.to_record())?;
        self.ancestors.invalidate(object_identity);

        tracing::debug!(
            object_identity = %object_identity,
            parent = ?acl.parent().map(|p| p.object_identity().to_string()),
            "ACL created"
        );
        Ok(self.register(acl))
    }

    fn find_or_create_root(&self, root: &ObjectIdentity) -> Result<Arc<Acl>> {
        match self.find_acl(root, &[]) {
            Err(err) if err.is_not_found() => self.create_locked(root, None),
            other => other,
        }
    }
}

impl<B: AclBackend> AclProvider for WardAclProvider<B> {
    fn find_acl(
        &self,
        object_identity: &ObjectIdentity,
        identities: &[SecurityIdentity],
    ) -> Result<Arc<Acl>> {
        if let Some(acl) = self.loaded(object_identity) {
            return Ok(acl);
        }

        // Collect records up to the first materialized ancestor or the root
        let mut pending = Vec::new();
        let mut seen = HashSet::new();
        let mut anchor = None;
        let mut cursor = Some(object_identity.clone());
        while let Some(current) = cursor {
            if let Some(acl) = self.loaded(&current) {
                anchor = Some(acl);
                break;
            }
            if !seen.insert(current.clone()) {
                return Err(WardError::ancestor_cycle(&current));
            }
            let record = self
                .load_record(&current)?
                .ok_or_else(|| WardError::acl_not_found(&current))?;
            cursor = record.parent.clone();
            pending.push(record);
        }

        tracing::debug!(
            object_identity = %object_identity,
            loaded = pending.len(),
            identities = identities.len(),
            "Materializing ACL chain"
        );

        // Build from the top so every ACL receives its parent
        while let Some(record) = pending.pop() {
            let class_entries = self.class_entries_for(record.object_identity.object_type())?;
            let acl = Arc::new(Acl::from_record(&record, class_entries, anchor.take()));
            anchor = Some(self.register(acl));
        }
        anchor.ok_or_else(|| WardError::acl_not_found(object_identity))
    }

    fn find_children(
        &self,
        object_identity: &ObjectIdentity,
        direct_only: bool,
    ) -> Result<Vec<ObjectIdentity>> {
        self.backend.find_children(object_identity, direct_only)
    }
}

impl<B: AclBackend> MutableAclProvider for WardAclProvider<B> {
    fn create_acl(&self, object_identity: &ObjectIdentity) -> Result<Arc<Acl>> {
        let _guard = self.lifecycle.lock();
        let parent = object_identity
            .declared_parent()
            .map(|root| self.find_or_create_root(&root))
            .transpose()?;
        self.create_locked(object_identity, parent)
    }

    fn create_acl_with_parent(
        &self,
        object_identity: &ObjectIdentity,
        parent: Option<&ObjectIdentity>,
    ) -> Result<Arc<Acl>> {
        let _guard = self.lifecycle.lock();
        let parent = parent.map(|p| self.find_acl(p, &[])).transpose()?;
        self.create_locked(object_identity, parent)
    }

    fn delete_acl(&self, object_identity: &ObjectIdentity) -> Result<()> {
        let _guard = self.lifecycle.lock();
        if !self.exists(object_identity)? {
            return Err(WardError::acl_not_found(object_identity));
        }
        let children = self.backend.find_children(object_identity, true)?;
        if !children.is_empty() {
            return Err(WardError::acl_in_use(object_identity, children.len()));
        }

        self.backend.delete_acl(object_identity)?;
        self.invalidate(object_identity)?;
        self.loaded.write().remove(object_identity);
        tracing::debug!(object_identity = %object_identity, "ACL deleted");
        Ok(())
    }

    fn update_acl(&self, acl: &Acl) -> Result<()> {
        // Copies are taken and saved in one critical section, so the last
        // save always carries the newest state
        let _guard = self.lifecycle.lock();
        let oid = acl.object_identity();
        if !self.exists(oid)? {
            return Err(WardError::acl_not_found(oid));
        }

        let class_entries = acl.class_entries().snapshot();
        self.backend.save_acl(&acl.to_record())?;
        self.backend
            .save_class_entries(oid.object_type(), &class_entries)?;
        let shared = self.class_entries_for(oid.object_type())?;
        if !shared.shares_with(acl.class_entries()) {
            shared.replace(class_entries);
        }
        self.invalidate(oid)?;
        self.forget_stale(acl)?;
        self.ancestors.clear();

        tracing::debug!(
            object_identity = %oid,
            object_entries = acl.len(ward_core::Scope::Object),
            class_entries = acl.len(ward_core::Scope::Class),
            "ACL updated"
        );
        Ok(())
    }

    fn set_parent(
        &self,
        object_identity: &ObjectIdentity,
        parent: Option<&ObjectIdentity>,
    ) -> Result<()> {
        let _guard = self.lifecycle.lock();
        let acl = self.find_acl(object_identity, &[])?;
        let parent = parent.map(|p| self.find_acl(p, &[])).transpose()?;

        let previous = acl.parent();
        acl.set_parent(parent)?;
        if let Err(err) = self.backend.save_acl(&acl.to_record()) {
            acl.set_parent(previous)?;
            return Err(err);
        }

        self.invalidate(object_identity)?;
        self.ancestors.clear();
        tracing::debug!(
            object_identity = %object_identity,
            parent = ?acl.parent().map(|p| p.object_identity().to_string()),
            "ACL re-parented"
        );
        Ok(())
    }
}
