//! In-memory tabular backend
//!
//! Keeps the same five tables a relational ACL schema uses (classes,
//! security identities, object identities, flattened ancestors and entries)
//! so the table names from [`TablesConfig`] are meaningful, and so that
//! `init_schema` behaves like creating them in a database: every other
//! operation fails until the schema exists.

use crate::backend::AclBackend;
use crate::record::AclRecord;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use ward_core::config::TablesConfig;
use ward_core::{
    Entry, MatchStrategy, ObjectIdentity, PermissionMask, Result, SecurityIdentity, WardConfig,
    WardError,
};

#[derive(Debug, Clone)]
struct ObjectIdentityRow {
    class_id: usize,
    parent: Option<ObjectIdentity>,
    entries_inheriting: bool,
}

#[derive(Debug, Clone)]
struct EntryRow {
    class_id: usize,
    /// `None` for class-scope entries
    object_identity: Option<ObjectIdentity>,
    order: usize,
    security_identity_id: usize,
    mask: PermissionMask,
    granting: bool,
    strategy: MatchStrategy,
    audit_success: bool,
    audit_failure: bool,
}

#[derive(Debug, Default)]
struct Tables {
    classes: Vec<String>,
    security_identities: Vec<SecurityIdentity>,
    object_identities: HashMap<ObjectIdentity, ObjectIdentityRow>,
    /// Nearest ancestor first, excluding the identity itself
    ancestors: HashMap<ObjectIdentity, Vec<ObjectIdentity>>,
    entries: Vec<EntryRow>,
}

impl Tables {
    fn class_id(&self, object_type: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == object_type)
    }

    fn class_id_or_insert(&mut self, object_type: &str) -> usize {
        self.class_id(object_type).unwrap_or_else(|| {
            self.classes.push(object_type.to_string());
            self.classes.len() - 1
        })
    }

    fn security_identity_id_or_insert(&mut self, sid: &SecurityIdentity) -> usize {
        match self.security_identities.iter().position(|s| s == sid) {
            Some(id) => id,
            None => {
                self.security_identities.push(sid.clone());
                self.security_identities.len() - 1
            }
        }
    }

    fn insert_entries(
        &mut self,
        class_id: usize,
        object_identity: Option<&ObjectIdentity>,
        entries: &[Entry],
    ) {
        for (order, entry) in entries.iter().enumerate() {
            let security_identity_id = self.security_identity_id_or_insert(&entry.security_identity);
            self.entries.push(EntryRow {
                class_id,
                object_identity: object_identity.cloned(),
                order,
                security_identity_id,
                mask: entry.mask,
                granting: entry.granting,
                strategy: entry.strategy,
                audit_success: entry.audit_success,
                audit_failure: entry.audit_failure,
            });
        }
    }

    fn select_entries<F>(&self, predicate: F) -> Result<Vec<Entry>>
    where
        F: Fn(&EntryRow) -> bool,
    {
        let mut rows: Vec<&EntryRow> = self.entries.iter().filter(|row| predicate(*row)).collect();
        rows.sort_by_key(|row| row.order);
        rows.into_iter()
            .map(|row| {
                let security_identity = self
                    .security_identities
                    .get(row.security_identity_id)
                    .cloned()
                    .ok_or_else(|| {
                        WardError::storage(format!(
                            "dangling security identity id {}",
                            row.security_identity_id
                        ))
                    })?;
                Ok(Entry {
                    security_identity,
                    mask: row.mask,
                    granting: row.granting,
                    strategy: row.strategy,
                    audit_success: row.audit_success,
                    audit_failure: row.audit_failure,
                })
            })
            .collect()
    }

    /// Walk parent links from `start`, nearest first
    fn parent_chain(&self, start: Option<&ObjectIdentity>) -> Result<Vec<ObjectIdentity>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = start.cloned();
        while let Some(oid) = current {
            if !seen.insert(oid.clone()) {
                return Err(WardError::ancestor_cycle(&oid));
            }
            current = self
                .object_identities
                .get(&oid)
                .and_then(|row| row.parent.clone());
            chain.push(oid);
        }
        Ok(chain)
    }

    fn descendants_of(&self, object_identity: &ObjectIdentity) -> Vec<ObjectIdentity> {
        let mut found: Vec<ObjectIdentity> = self
            .ancestors
            .iter()
            .filter(|(_, chain)| chain.contains(object_identity))
            .map(|(oid, _)| oid.clone())
            .collect();
        found.sort();
        found
    }

    fn refresh_ancestors(&mut self, object_identity: &ObjectIdentity) -> Result<()> {
        let mut affected = self.descendants_of(object_identity);
        affected.push(object_identity.clone());
        for oid in affected {
            let parent = self
                .object_identities
                .get(&oid)
                .and_then(|row| row.parent.clone());
            let chain = self.parent_chain(parent.as_ref())?;
            self.ancestors.insert(oid, chain);
        }
        Ok(())
    }
}

/// Backend keeping every table in process memory
#[derive(Debug)]
pub struct MemoryBackend {
    names: TablesConfig,
    tables: RwLock<Option<Tables>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(TablesConfig::default())
    }
}

impl MemoryBackend {
    /// Backend with the given table names; call `init_schema` before use
    pub fn new(names: TablesConfig) -> Self {
        Self {
            names,
            tables: RwLock::new(None),
        }
    }

    /// Backend named after `config.tables`; call `init_schema` before use
    pub fn from_config(config: &WardConfig) -> Self {
        Self::new(config.tables.clone())
    }

    /// Backend with default table names and the schema already created
    pub fn initialized() -> Result<Self> {
        let backend = Self::default();
        backend.init_schema()?;
        Ok(backend)
    }

    /// Configured table names
    pub fn table_names(&self) -> &TablesConfig {
        &self.names
    }

    /// Row count per configured table name
    pub fn table_sizes(&self) -> Result<BTreeMap<String, usize>> {
        self.read(&self.names.class, |t| {
            Ok(BTreeMap::from([
                (self.names.class.clone(), t.classes.len()),
                (
                    self.names.security_identity.clone(),
                    t.security_identities.len(),
                ),
                (self.names.object_identity.clone(), t.object_identities.len()),
                (
                    self.names.object_identity_ancestors.clone(),
                    t.ancestors.values().map(Vec::len).sum(),
                ),
                (self.names.entry.clone(), t.entries.len()),
            ]))
        })
    }

    fn missing(table: &str) -> WardError {
        WardError::storage(format!("table {table} does not exist"))
    }

    fn read<R, F>(&self, table: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Tables) -> Result<R>,
    {
        let guard = self.tables.read();
        let tables = guard.as_ref().ok_or_else(|| Self::missing(table))?;
        f(tables)
    }

    fn write<R, F>(&self, table: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Tables) -> Result<R>,
    {
        let mut guard = self.tables.write();
        let tables = guard.as_mut().ok_or_else(|| Self::missing(table))?;
        f(tables)
    }
}

impl AclBackend for MemoryBackend {
    fn init_schema(&self) -> Result<Vec<String>> {
        let mut guard = self.tables.write();
        if guard.is_some() {
            return Err(WardError::schema_exists(format!(
                "table {} already exists",
                self.names.class
            )));
        }
        *guard = Some(Tables::default());
        let created: Vec<String> = self.names.all().iter().map(|t| t.to_string()).collect();
        tracing::info!(tables = ?created, "ACL tables created");
        Ok(created)
    }

    fn load_acl(&self, object_identity: &ObjectIdentity) -> Result<Option<AclRecord>> {
        self.read(&self.names.object_identity, |t| {
            let Some(row) = t.object_identities.get(object_identity) else {
                return Ok(None);
            };
            let object_entries = t.select_entries(|entry| {
                entry.class_id == row.class_id
                    && entry.object_identity.as_ref() == Some(object_identity)
            })?;
            Ok(Some(AclRecord {
                object_identity: object_identity.clone(),
                parent: row.parent.clone(),
                entries_inheriting: row.entries_inheriting,
                object_entries,
            }))
        })
    }

    fn save_acl(&self, record: &AclRecord) -> Result<()> {
        record.validate()?;
        self.write(&self.names.object_identity, |t| {
            // Reject a parent whose stored chain leads back to this record
            if t
                .parent_chain(record.parent.as_ref())?
                .contains(&record.object_identity)
            {
                return Err(WardError::ancestor_cycle(&record.object_identity));
            }

            let oid = &record.object_identity;
            let class_id = t.class_id_or_insert(oid.object_type());
            t.object_identities.insert(
                oid.clone(),
                ObjectIdentityRow {
                    class_id,
                    parent: record.parent.clone(),
                    entries_inheriting: record.entries_inheriting,
                },
            );
            t.entries
                .retain(|row| row.object_identity.as_ref() != Some(oid));
            t.insert_entries(class_id, Some(oid), &record.object_entries);
            t.refresh_ancestors(oid)?;

            tracing::trace!(
                object_identity = %oid,
                entries = record.object_entries.len(),
                "ACL record saved"
            );
            Ok(())
        })
    }

    fn delete_acl(&self, object_identity: &ObjectIdentity) -> Result<()> {
        self.write(&self.names.object_identity, |t| {
            t.object_identities.remove(object_identity);
            t.ancestors.remove(object_identity);
            t.entries
                .retain(|row| row.object_identity.as_ref() != Some(object_identity));
            tracing::trace!(object_identity = %object_identity, "ACL record deleted");
            Ok(())
        })
    }

    fn find_children(
        &self,
        object_identity: &ObjectIdentity,
        direct_only: bool,
    ) -> Result<Vec<ObjectIdentity>> {
        self.read(&self.names.object_identity_ancestors, |t| {
            if !direct_only {
                return Ok(t.descendants_of(object_identity));
            }
            let mut children: Vec<ObjectIdentity> = t
                .object_identities
                .iter()
                .filter(|(_, row)| row.parent.as_ref() == Some(object_identity))
                .map(|(oid, _)| oid.clone())
                .collect();
            children.sort();
            Ok(children)
        })
    }

    fn load_class_entries(&self, object_type: &str) -> Result<Vec<Entry>> {
        self.read(&self.names.entry, |t| match t.class_id(object_type) {
            Some(class_id) => t.select_entries(|row| {
                row.class_id == class_id && row.object_identity.is_none()
            }),
            None => Ok(Vec::new()),
        })
    }

    fn save_class_entries(&self, object_type: &str, entries: &[Entry]) -> Result<()> {
        entries.iter().try_for_each(Entry::validate)?;
        self.write(&self.names.entry, |t| {
            let class_id = t.class_id_or_insert(object_type);
            t.entries
                .retain(|row| !(row.class_id == class_id && row.object_identity.is_none()));
            t.insert_entries(class_id, None, entries);
            tracing::trace!(object_type, entries = entries.len(), "Class entries saved");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(id: &str) -> ObjectIdentity {
        ObjectIdentity::new(id, "Car").unwrap()
    }

    fn admin() -> SecurityIdentity {
        SecurityIdentity::role("ROLE_ADMIN").unwrap()
    }

    #[test]
    fn test_operations_fail_before_init() {
        let backend = MemoryBackend::default();
        let err = backend.load_acl(&oid("1")).unwrap_err();
        assert_eq!(
            err,
            WardError::storage("table acl_object_identities does not exist")
        );
    }

    #[test]
    fn test_table_names_from_config() {
        let mut config = WardConfig::default();
        config.tables.entry = "app_entries".to_string();
        let backend = MemoryBackend::from_config(&config);

        let created = backend.init_schema().unwrap();
        assert_eq!(created.last().map(String::as_str), Some("app_entries"));
        assert_eq!(backend.table_names(), &config.tables);
        assert!(backend.table_sizes().unwrap().contains_key("app_entries"));
    }

    #[test]
    fn test_init_twice_fails() {
        let backend = MemoryBackend::default();
        let created = backend.init_schema().unwrap();
        assert_eq!(created.len(), 5);
        assert_eq!(created[0], "acl_classes");
        assert!(matches!(
            backend.init_schema(),
            Err(WardError::SchemaExists { .. })
        ));
    }

    #[test]
    fn test_entries_keep_order() {
        let backend = MemoryBackend::initialized().unwrap();
        let mut record = AclRecord::new(oid("1"), None);
        record.object_entries = vec![
            Entry::grant(admin(), PermissionMask::VIEW),
            Entry::deny(admin(), PermissionMask::VIEW),
            Entry::grant(SecurityIdentity::Anonymous, PermissionMask::EDIT),
        ];
        backend.save_acl(&record).unwrap();

        let loaded = backend.load_acl(&oid("1")).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(backend.table_sizes().unwrap()["acl_security_identities"], 2);
    }

    #[test]
    fn test_class_entries_are_per_type() {
        let backend = MemoryBackend::initialized().unwrap();
        let entries = vec![Entry::grant(admin(), PermissionMask::OWNER)];
        backend.save_class_entries("Car", &entries).unwrap();

        assert_eq!(backend.load_class_entries("Car").unwrap(), entries);
        assert!(backend.load_class_entries("Boat").unwrap().is_empty());

        // saving an object record leaves class entries alone
        backend.save_acl(&AclRecord::new(oid("1"), None)).unwrap();
        assert_eq!(backend.load_class_entries("Car").unwrap(), entries);
    }

    #[test]
    fn test_children_and_ancestors() {
        let backend = MemoryBackend::initialized().unwrap();
        let root = ObjectIdentity::class_root("Car").unwrap();
        backend.save_acl(&AclRecord::new(root.clone(), None)).unwrap();
        backend
            .save_acl(&AclRecord::new(oid("1"), Some(root.clone())))
            .unwrap();
        backend
            .save_acl(&AclRecord::new(oid("2"), Some(oid("1"))))
            .unwrap();

        assert_eq!(backend.find_children(&root, true).unwrap(), vec![oid("1")]);
        assert_eq!(
            backend.find_children(&root, false).unwrap(),
            vec![oid("1"), oid("2")]
        );

        // re-parenting the root under a descendant closes a cycle
        let err = backend
            .save_acl(&AclRecord::new(root.clone(), Some(oid("2"))))
            .unwrap_err();
        assert!(matches!(err, WardError::AncestorCycle { .. }));

        backend.delete_acl(&oid("2")).unwrap();
        assert_eq!(backend.find_children(&root, false).unwrap(), vec![oid("1")]);
    }
}
