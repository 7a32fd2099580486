//! Backend behaviour through the public contract

use assert_matches::assert_matches;
use std::sync::Arc;
use ward_core::config::TablesConfig;
use ward_core::{Entry, ObjectIdentity, PermissionMask, SecurityIdentity, WardError};
use ward_store::{AclBackend, AclRecord, MemoryBackend};

fn post(id: &str) -> ObjectIdentity {
    ObjectIdentity::new(id, "Post").unwrap()
}

#[test]
fn custom_table_names_are_created_in_order() {
    let tables = TablesConfig {
        class: "svc_classes".to_string(),
        ..TablesConfig::default()
    };
    let backend = MemoryBackend::new(tables);

    let err = backend.load_class_entries("Post").unwrap_err();
    assert_eq!(err, WardError::storage("table acl_entries does not exist"));

    let created = backend.init_schema().unwrap();
    assert_eq!(
        created,
        vec![
            "svc_classes",
            "acl_security_identities",
            "acl_object_identities",
            "acl_object_identity_ancestors",
            "acl_entries",
        ]
    );

    let err = backend.init_schema().unwrap_err();
    assert_eq!(
        err,
        WardError::schema_exists("table svc_classes already exists")
    );
}

#[test]
fn saving_replaces_previous_entries() {
    let backend = MemoryBackend::initialized().unwrap();
    let editor = SecurityIdentity::user("alice", "User").unwrap();

    let mut record = AclRecord::new(post("1"), None);
    record
        .object_entries
        .push(Entry::grant(editor.clone(), PermissionMask::EDIT));
    backend.save_acl(&record).unwrap();

    record.object_entries = vec![Entry::deny(editor, PermissionMask::VIEW)];
    record.entries_inheriting = false;
    backend.save_acl(&record).unwrap();

    let loaded = backend.load_acl(&post("1")).unwrap().unwrap();
    assert_eq!(loaded, record);
    assert_eq!(backend.table_sizes().unwrap()["acl_entries"], 1);
}

#[test]
fn missing_record_loads_as_none() {
    let backend = MemoryBackend::initialized().unwrap();
    assert_eq!(backend.load_acl(&post("404")).unwrap(), None);
}

#[test]
fn reparenting_updates_transitive_children() {
    let backend = MemoryBackend::initialized().unwrap();
    for (id, parent) in [("a", None), ("b", Some("a")), ("c", Some("b")), ("x", None)] {
        backend
            .save_acl(&AclRecord::new(post(id), parent.map(post)))
            .unwrap();
    }
    assert_eq!(
        backend.find_children(&post("a"), false).unwrap(),
        vec![post("b"), post("c")]
    );

    // move b (and with it c) under x
    backend
        .save_acl(&AclRecord::new(post("b"), Some(post("x"))))
        .unwrap();
    assert!(backend.find_children(&post("a"), false).unwrap().is_empty());
    assert_eq!(
        backend.find_children(&post("x"), false).unwrap(),
        vec![post("b"), post("c")]
    );
    assert_eq!(backend.find_children(&post("x"), true).unwrap(), vec![post("b")]);

    assert_matches!(
        backend.save_acl(&AclRecord::new(post("x"), Some(post("c")))),
        Err(WardError::AncestorCycle { .. })
    );
}

#[test]
fn backend_is_shareable_between_threads() {
    let backend = Arc::new(MemoryBackend::initialized().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let backend = Arc::clone(&backend);
            std::thread::spawn(move || {
                let record = AclRecord::new(post(&i.to_string()), None);
                backend.save_acl(&record).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(backend.table_sizes().unwrap()["acl_object_identities"], 4);
    assert_eq!(backend.table_sizes().unwrap()["acl_classes"], 1);
}
