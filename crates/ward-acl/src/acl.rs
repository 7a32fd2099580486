//! ACL aggregate and its entry store
//!
//! An [`Acl`] protects one object identity. It owns an ordered sequence of
//! object-scope entries and shares the class-scope sequence of its object
//! type with every other ACL of that type. Each sequence is guarded by its
//! own lock, so a reader always sees a fully renumbered sequence.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use ward_core::{
    Entry, ObjectIdentity, PermissionMask, Result, Scope, SecurityIdentity, WardError,
};
use ward_store::AclRecord;

/// Class-scope entries shared by every ACL of one object type
#[derive(Debug, Clone, Default)]
pub struct ClassEntries {
    entries: Arc<RwLock<Vec<Entry>>>,
}

impl ClassEntries {
    /// Shared sequence seeded with `entries`
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Copy of the current sequence
    pub fn snapshot(&self) -> Vec<Entry> {
        self.entries.read().clone()
    }

    /// Replace the whole sequence
    pub fn replace(&self, entries: Vec<Entry>) {
        *self.entries.write() = entries;
    }

    /// Whether both handles refer to the same sequence
    pub fn shares_with(&self, other: &ClassEntries) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

#[derive(Debug)]
struct AclState {
    object_entries: Vec<Entry>,
    parent: Option<Arc<Acl>>,
    entries_inheriting: bool,
}

/// Access control list of one object identity
pub struct Acl {
    object_identity: ObjectIdentity,
    state: RwLock<AclState>,
    class_entries: ClassEntries,
}

impl fmt::Debug for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Acl")
            .field("object_identity", &self.object_identity)
            .field("object_entries", &state.object_entries)
            .field("class_entries", &self.class_entries.snapshot())
            .field(
                "parent",
                &state.parent.as_ref().map(|p| p.object_identity.clone()),
            )
            .field("entries_inheriting", &state.entries_inheriting)
            .finish()
    }
}

impl Acl {
    /// Empty, inheriting ACL with its own class-scope sequence
    pub fn new(object_identity: ObjectIdentity) -> Self {
        Self::with_class_entries(object_identity, ClassEntries::default())
    }

    /// Empty, inheriting ACL sharing `class_entries` with its type
    pub fn with_class_entries(object_identity: ObjectIdentity, class_entries: ClassEntries) -> Self {
        Self {
            object_identity,
            state: RwLock::new(AclState {
                object_entries: Vec::new(),
                parent: None,
                entries_inheriting: true,
            }),
            class_entries,
        }
    }

    /// Rebuild an ACL from its persisted record
    ///
    /// `parent` must be the ACL of `record.parent`; the chain is trusted as
    /// stored.
    pub fn from_record(
        record: &AclRecord,
        class_entries: ClassEntries,
        parent: Option<Arc<Acl>>,
    ) -> Self {
        Self {
            object_identity: record.object_identity.clone(),
            state: RwLock::new(AclState {
                object_entries: record.object_entries.clone(),
                parent,
                entries_inheriting: record.entries_inheriting,
            }),
            class_entries,
        }
    }

    /// Persistable form, without the shared class-scope entries
    pub fn to_record(&self) -> AclRecord {
        let state = self.state.read();
        AclRecord {
            object_identity: self.object_identity.clone(),
            parent: state.parent.as_ref().map(|p| p.object_identity.clone()),
            entries_inheriting: state.entries_inheriting,
            object_entries: state.object_entries.clone(),
        }
    }

    /// Identity this ACL protects
    pub fn object_identity(&self) -> &ObjectIdentity {
        &self.object_identity
    }

    /// Shared class-scope sequence of this ACL's type
    pub fn class_entries(&self) -> &ClassEntries {
        &self.class_entries
    }

    /// Parent ACL, if any
    pub fn parent(&self) -> Option<Arc<Acl>> {
        self.state.read().parent.clone()
    }

    /// Parent consulted during resolution: `None` when not inheriting
    pub fn inherited_parent(&self) -> Option<Arc<Acl>> {
        let state = self.state.read();
        if state.entries_inheriting {
            state.parent.clone()
        } else {
            None
        }
    }

    /// Replace the parent, refusing to close a cycle
    pub fn set_parent(&self, parent: Option<Arc<Acl>>) -> Result<()> {
        if let Some(candidate) = &parent {
            let mut seen = HashSet::new();
            let mut cursor = Some(Arc::clone(candidate));
            while let Some(acl) = cursor {
                if acl.object_identity == self.object_identity
                    || !seen.insert(acl.object_identity.clone())
                {
                    return Err(WardError::ancestor_cycle(&self.object_identity));
                }
                cursor = acl.parent();
            }
        }
        self.state.write().parent = parent;
        Ok(())
    }

    /// Identities of every ancestor, nearest first
    pub fn ancestor_identities(&self) -> Result<Vec<ObjectIdentity>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([self.object_identity.clone()]);
        let mut cursor = self.parent();
        while let Some(acl) = cursor {
            if !seen.insert(acl.object_identity.clone()) {
                return Err(WardError::ancestor_cycle(&acl.object_identity));
            }
            chain.push(acl.object_identity.clone());
            cursor = acl.parent();
        }
        Ok(chain)
    }

    /// Whether resolution falls through to the parent
    pub fn is_entries_inheriting(&self) -> bool {
        self.state.read().entries_inheriting
    }

    /// Enable or disable inheritance from the parent
    pub fn set_entries_inheriting(&self, entries_inheriting: bool) {
        self.state.write().entries_inheriting = entries_inheriting;
    }

    /// Copy of the entries of `scope`, in index order
    pub fn entries(&self, scope: Scope) -> Vec<Entry> {
        self.read_entries(scope, <[Entry]>::to_vec)
    }

    /// Number of entries in `scope`
    pub fn len(&self, scope: Scope) -> usize {
        self.read_entries(scope, <[Entry]>::len)
    }

    /// Whether neither scope holds an entry
    pub fn is_empty(&self) -> bool {
        self.len(Scope::Object) == 0 && self.len(Scope::Class) == 0
    }

    /// First entry deciding for any of `identities` and any of `masks`
    ///
    /// Object scope is searched before class scope; within a scope every
    /// identity is tried in order against the whole sequence. Both sequences
    /// are read under one pair of guards, so the answer reflects a single
    /// state of this ACL.
    pub fn first_applicable(
        &self,
        identities: &[SecurityIdentity],
        masks: &[PermissionMask],
    ) -> Option<(Scope, Entry)> {
        let state = self.state.read();
        let class_entries = self.class_entries.entries.read();
        let found = [
            (Scope::Object, state.object_entries.as_slice()),
            (Scope::Class, class_entries.as_slice()),
        ]
        .into_iter()
        .find_map(|(scope, entries)| {
            identities.iter().find_map(|identity| {
                entries
                    .iter()
                    .find(|entry| masks.iter().any(|mask| entry.applies_to(identity, *mask)))
                    .map(|entry| (scope, entry.clone()))
            })
        });
        found
    }

    /// Insert `entry` at `index`, shifting later entries up
    pub fn insert_entry(&self, scope: Scope, index: usize, entry: Entry) -> Result<()> {
        entry.validate()?;
        self.write_entries(scope, |entries| {
            if index > entries.len() {
                return Err(WardError::index_out_of_range(index, entries.len()));
            }
            entries.insert(index, entry);
            Ok(())
        })?;
        tracing::trace!(
            object_identity = %self.object_identity,
            %scope,
            index,
            "Entry inserted"
        );
        Ok(())
    }

    /// Remove and return the entry at `index`, shifting later entries down
    pub fn delete_entry(&self, scope: Scope, index: usize) -> Result<Entry> {
        let removed = self.write_entries(scope, |entries| {
            if index >= entries.len() {
                return Err(WardError::entry_not_found(index, entries.len()));
            }
            Ok(entries.remove(index))
        })?;
        tracing::trace!(
            object_identity = %self.object_identity,
            %scope,
            index,
            "Entry deleted"
        );
        Ok(removed)
    }

    /// Change the mask and grant/deny flag of the entry at `index`
    pub fn update_entry(
        &self,
        scope: Scope,
        index: usize,
        mask: PermissionMask,
        granting: bool,
    ) -> Result<()> {
        self.with_entry_mut(scope, index, |entry| {
            entry.mask = mask;
            entry.granting = granting;
        })
    }

    /// Change the audit flags of the entry at `index`
    pub fn update_entry_auditing(
        &self,
        scope: Scope,
        index: usize,
        audit_success: bool,
        audit_failure: bool,
    ) -> Result<()> {
        self.with_entry_mut(scope, index, |entry| {
            entry.audit_success = audit_success;
            entry.audit_failure = audit_failure;
        })
    }

    /// Strip `mask` from every granting entry of `identity` in `scope`
    ///
    /// Entries left without any bit are removed. Returns how many entries
    /// were touched.
    pub fn revoke(&self, scope: Scope, identity: &SecurityIdentity, mask: PermissionMask) -> usize {
        let touched = self
            .write_entries(scope, |entries| {
                let mut touched = 0;
                entries.retain_mut(|entry| {
                    if !entry.granting
                        || entry.security_identity != *identity
                        || !entry.mask.intersects(mask)
                    {
                        return true;
                    }
                    touched += 1;
                    entry.mask &= !mask;
                    !entry.mask.is_empty()
                });
                Ok(touched)
            })
            .unwrap_or_default();
        tracing::trace!(
            object_identity = %self.object_identity,
            %scope,
            security_identity = %identity,
            touched,
            "Permission revoked"
        );
        touched
    }

    fn with_entry_mut<F>(&self, scope: Scope, index: usize, f: F) -> Result<()>
    where
        F: FnOnce(&mut Entry),
    {
        self.write_entries(scope, |entries| {
            let len = entries.len();
            let entry = entries
                .get_mut(index)
                .ok_or_else(|| WardError::entry_not_found(index, len))?;
            f(entry);
            Ok(())
        })
    }

    fn read_entries<R, F>(&self, scope: Scope, f: F) -> R
    where
        F: FnOnce(&[Entry]) -> R,
    {
        match scope {
            Scope::Object => f(self.state.read().object_entries.as_slice()),
            Scope::Class => f(self.class_entries.entries.read().as_slice()),
        }
    }

    fn write_entries<R, F>(&self, scope: Scope, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Entry>) -> Result<R>,
    {
        match scope {
            Scope::Object => f(&mut self.state.write().object_entries),
            Scope::Class => f(&mut *self.class_entries.entries.write()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acl(id: &str) -> Acl {
        Acl::new(ObjectIdentity::new(id, "Post").unwrap())
    }

    fn entry(bits: u32) -> Entry {
        Entry::grant(SecurityIdentity::role("ROLE_ADMIN").unwrap(), bits.into())
    }

    fn masks(acl: &Acl, scope: Scope) -> Vec<u32> {
        acl.entries(scope).iter().map(|e| e.mask.bits()).collect()
    }

    #[test]
    fn test_insert_positions() {
        let acl = acl("1");
        acl.insert_entry(Scope::Object, 0, entry(1)).unwrap();
        acl.insert_entry(Scope::Object, 1, entry(2)).unwrap();
        acl.insert_entry(Scope::Object, 1, entry(3)).unwrap();
        acl.insert_entry(Scope::Object, 0, entry(4)).unwrap();
        assert_eq!(masks(&acl, Scope::Object), vec![4, 1, 3, 2]);

        let err = acl.insert_entry(Scope::Object, 5, entry(5)).unwrap_err();
        assert_eq!(err, WardError::index_out_of_range(5, 4));
        assert!(acl.entries(Scope::Class).is_empty());
    }

    #[test]
    fn test_delete_and_update() {
        let acl = acl("1");
        for (i, bits) in [1, 2, 4].into_iter().enumerate() {
            acl.insert_entry(Scope::Class, i, entry(bits)).unwrap();
        }
        assert_eq!(acl.delete_entry(Scope::Class, 1).unwrap().mask.bits(), 2);
        assert_eq!(masks(&acl, Scope::Class), vec![1, 4]);

        acl.update_entry(Scope::Class, 1, PermissionMask::OWNER, false)
            .unwrap();
        let updated = &acl.entries(Scope::Class)[1];
        assert_eq!(updated.mask, PermissionMask::OWNER);
        assert!(!updated.granting);

        assert_eq!(
            acl.delete_entry(Scope::Class, 2).unwrap_err(),
            WardError::entry_not_found(2, 2)
        );
        assert_eq!(
            acl.update_entry(Scope::Object, 0, PermissionMask::VIEW, true)
                .unwrap_err(),
            WardError::entry_not_found(0, 0)
        );
    }

    #[test]
    fn test_class_entries_are_shared() {
        let shared = ClassEntries::default();
        let a = Acl::with_class_entries(ObjectIdentity::new("1", "Post").unwrap(), shared.clone());
        let b = Acl::with_class_entries(ObjectIdentity::new("2", "Post").unwrap(), shared);

        a.insert_entry(Scope::Class, 0, entry(1)).unwrap();
        assert_eq!(b.len(Scope::Class), 1);
        assert!(a.class_entries().shares_with(b.class_entries()));
    }

    #[test]
    fn test_set_parent_rejects_cycles() {
        let root = Arc::new(acl("root"));
        let child = Arc::new(acl("child"));
        child.set_parent(Some(Arc::clone(&root))).unwrap();

        let err = root.set_parent(Some(Arc::clone(&child))).unwrap_err();
        assert!(matches!(err, WardError::AncestorCycle { .. }));
        assert!(root.parent().is_none());

        assert_eq!(
            child.ancestor_identities().unwrap(),
            vec![root.object_identity().clone()]
        );
    }

    #[test]
    fn test_revoke_strips_bits() {
        let acl = acl("1");
        let admin = SecurityIdentity::role("ROLE_ADMIN").unwrap();
        acl.insert_entry(Scope::Object, 0, entry(1 | 4)).unwrap();
        acl.insert_entry(Scope::Object, 1, entry(1)).unwrap();
        acl.insert_entry(Scope::Object, 2, Entry::deny(admin.clone(), PermissionMask::VIEW))
            .unwrap();

        assert_eq!(acl.revoke(Scope::Object, &admin, PermissionMask::VIEW), 2);
        let left = acl.entries(Scope::Object);
        assert_eq!(left.len(), 2);
        assert_eq!(left[0].mask, PermissionMask::EDIT);
        assert!(!left[1].granting);
    }

    #[test]
    fn test_first_applicable_orders_scopes_then_identities() {
        let acl = acl("1");
        let admin = SecurityIdentity::role("ROLE_ADMIN").unwrap();
        let user = SecurityIdentity::user("kevin", "User").unwrap();
        acl.insert_entry(Scope::Class, 0, Entry::grant(admin.clone(), PermissionMask::VIEW))
            .unwrap();
        acl.insert_entry(Scope::Object, 0, Entry::deny(user.clone(), PermissionMask::EDIT))
            .unwrap();
        acl.insert_entry(Scope::Object, 1, Entry::grant(admin.clone(), PermissionMask::VIEW))
            .unwrap();

        let (scope, entry) = acl
            .first_applicable(&[admin.clone(), user.clone()], &[PermissionMask::VIEW])
            .unwrap();
        assert_eq!(scope, Scope::Object);
        assert_eq!(entry.security_identity, admin);

        // earlier identities win over earlier entries
        let (_, entry) = acl
            .first_applicable(
                &[user.clone(), admin],
                &[PermissionMask::VIEW, PermissionMask::EDIT],
            )
            .unwrap();
        assert_eq!(entry.security_identity, user);
        assert!(acl
            .first_applicable(&[SecurityIdentity::Anonymous], &[PermissionMask::VIEW])
            .is_none());
    }

    #[test]
    fn test_record_round_trip() {
        let acl = acl("1");
        acl.insert_entry(Scope::Object, 0, entry(1)).unwrap();
        acl.set_entries_inheriting(false);

        let record = acl.to_record();
        let restored = Acl::from_record(&record, ClassEntries::default(), None);
        assert_eq!(restored.to_record(), record);
        assert!(!restored.is_entries_inheriting());
    }
}
