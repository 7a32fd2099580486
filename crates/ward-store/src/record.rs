//! Persisted ACL records

use serde::{Deserialize, Serialize};
use ward_core::{Entry, ObjectIdentity, Result, WardError};

/// Storage form of one ACL aggregate
///
/// Class-scope entries are stored once per object type and are therefore
/// not part of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRecord {
    /// Identity the ACL protects
    pub object_identity: ObjectIdentity,
    /// Parent ACL in the inheritance chain
    pub parent: Option<ObjectIdentity>,
    /// Whether the parent is consulted when no local entry applies
    pub entries_inheriting: bool,
    /// Object-scope entries in index order
    pub object_entries: Vec<Entry>,
}

impl AclRecord {
    /// Empty record inheriting from `parent`
    pub fn new(object_identity: ObjectIdentity, parent: Option<ObjectIdentity>) -> Self {
        Self {
            object_identity,
            parent,
            entries_inheriting: true,
            object_entries: Vec::new(),
        }
    }

    /// Serialize for a cache
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(WardError::from)
    }

    /// Deserialize from a cache, validating every entry
    pub fn from_json(json: &str) -> Result<Self> {
        let record: AclRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    /// Reject malformed entries and self-parenting
    pub fn validate(&self) -> Result<()> {
        if self.parent.as_ref() == Some(&self.object_identity) {
            return Err(WardError::ancestor_cycle(&self.object_identity));
        }
        self.object_entries.iter().try_for_each(Entry::validate)
    }
}
