//! Persistence backend contract

use crate::record::AclRecord;
use std::sync::Arc;
use ward_core::{Entry, ObjectIdentity, Result};

/// Storage engine holding ACL records and per-type class entries
///
/// Implementations must be safe to share between threads; the provider
/// serializes writes to one ACL but calls for different ACLs may overlap.
pub trait AclBackend: Send + Sync {
    /// Create the backend tables, returning their names in creation order
    ///
    /// Fails with `SchemaExists` when the tables are already present.
    fn init_schema(&self) -> Result<Vec<String>>;

    /// Load the record for `object_identity`, if one was saved
    fn load_acl(&self, object_identity: &ObjectIdentity) -> Result<Option<AclRecord>>;

    /// Insert or replace a record
    fn save_acl(&self, record: &AclRecord) -> Result<()>;

    /// Remove a record and its object entries
    fn delete_acl(&self, object_identity: &ObjectIdentity) -> Result<()>;

    /// Identities whose parent chain contains `object_identity`
    ///
    /// With `direct_only`, only identities whose parent is exactly
    /// `object_identity` are returned.
    fn find_children(
        &self,
        object_identity: &ObjectIdentity,
        direct_only: bool,
    ) -> Result<Vec<ObjectIdentity>>;

    /// Class-scope entries shared by every ACL of `object_type`
    fn load_class_entries(&self, object_type: &str) -> Result<Vec<Entry>>;

    /// Replace the class-scope entries of `object_type`
    fn save_class_entries(&self, object_type: &str, entries: &[Entry]) -> Result<()>;
}

impl<B: AclBackend + ?Sized> AclBackend for Arc<B> {
    fn init_schema(&self) -> Result<Vec<String>> {
        (**self).init_schema()
    }

    fn load_acl(&self, object_identity: &ObjectIdentity) -> Result<Option<AclRecord>> {
        (**self).load_acl(object_identity)
    }

    fn save_acl(&self, record: &AclRecord) -> Result<()> {
        (**self).save_acl(record)
    }

    fn delete_acl(&self, object_identity: &ObjectIdentity) -> Result<()> {
        (**self).delete_acl(object_identity)
    }

    fn find_children(
        &self,
        object_identity: &ObjectIdentity,
        direct_only: bool,
    ) -> Result<Vec<ObjectIdentity>> {
        (**self).find_children(object_identity, direct_only)
    }

    fn load_class_entries(&self, object_type: &str) -> Result<Vec<Entry>> {
        (**self).load_class_entries(object_type)
    }

    fn save_class_entries(&self, object_type: &str, entries: &[Entry]) -> Result<()> {
        (**self).save_class_entries(object_type, entries)
    }
}
