//! Provider lifecycle, ancestry and cache invalidation

use assert_matches::assert_matches;
use std::sync::Arc;
use ward_acl::{
    AclCache, AclEvaluator, AclProvider, MemoryAclCache, MutableAclProvider, WardAclProvider,
};
use ward_core::{Entry, ObjectIdentity, PermissionMask, Scope, WardError};
use ward_store::MemoryBackend;
use ward_testkit::{memory_backend, memory_provider, post, provider_over, role, user};

fn chain(provider: &WardAclProvider<MemoryBackend>) {
    provider.create_acl_with_parent(&post("a"), None).unwrap();
    provider
        .create_acl_with_parent(&post("b"), Some(&post("a")))
        .unwrap();
    provider
        .create_acl_with_parent(&post("c"), Some(&post("b")))
        .unwrap();
}

#[test]
fn ancestors_are_nearest_first() {
    let provider = memory_provider();
    chain(&provider);

    assert_eq!(&*provider.ancestors(&post("c")).unwrap(), &[post("b"), post("a")]);
    assert!(provider.ancestors(&post("a")).unwrap().is_empty());

    provider.set_parent(&post("c"), Some(&post("a"))).unwrap();
    assert_eq!(&*provider.ancestors(&post("c")).unwrap(), &[post("a")]);
}

#[test]
fn set_parent_refuses_cycles() {
    let provider = memory_provider();
    chain(&provider);

    assert_matches!(
        provider.set_parent(&post("a"), Some(&post("c"))),
        Err(WardError::AncestorCycle { .. })
    );
    assert_matches!(
        provider.set_parent(&post("b"), Some(&post("b"))),
        Err(WardError::AncestorCycle { .. })
    );
    // the failed attempts left the chain untouched
    assert_eq!(&*provider.ancestors(&post("c")).unwrap(), &[post("b"), post("a")]);
}

#[test]
fn children_and_deletion() {
    let provider = memory_provider();
    chain(&provider);

    assert_eq!(provider.find_children(&post("a"), true).unwrap(), vec![post("b")]);
    assert_eq!(
        provider.find_children(&post("a"), false).unwrap(),
        vec![post("b"), post("c")]
    );

    assert_matches!(
        provider.delete_acl(&post("b")),
        Err(WardError::AclInUse { children: 1, .. })
    );
    provider.delete_acl(&post("c")).unwrap();
    provider.delete_acl(&post("b")).unwrap();

    assert_matches!(
        provider.find_acl(&post("b"), &[]),
        Err(WardError::AclNotFound { .. })
    );
    assert_matches!(
        provider.delete_acl(&post("b")),
        Err(WardError::AclNotFound { .. })
    );
}

#[test]
fn find_acls_keeps_request_order() {
    let provider = memory_provider();
    chain(&provider);

    let found = provider
        .find_acls(&[post("c"), post("a")], &[role("ROLE_ADMIN")])
        .unwrap();
    assert_eq!(found[0].object_identity(), &post("c"));
    assert_eq!(found[1].object_identity(), &post("a"));

    assert_matches!(
        provider.find_acls(&[post("a"), post("zzz")], &[]),
        Err(WardError::AclNotFound { object_identity }) if object_identity == "Post:zzz"
    );
}

#[test]
fn state_survives_a_new_provider() {
    let backend = Arc::new(memory_backend());
    let first = provider_over(Arc::clone(&backend));
    let acl = first.create_acl(&post("1")).unwrap();
    acl.insert_entry(Scope::Object, 0, Entry::grant(user("kevin"), PermissionMask::EDIT))
        .unwrap();
    acl.insert_entry(Scope::Class, 0, Entry::grant(role("ROLE_ADMIN"), PermissionMask::OWNER))
        .unwrap();
    first.update_acl(&acl).unwrap();

    let second = provider_over(backend);
    let reloaded = second.find_acl(&post("1"), &[]).unwrap();
    assert_eq!(reloaded.entries(Scope::Object), acl.entries(Scope::Object));
    assert_eq!(reloaded.entries(Scope::Class), acl.entries(Scope::Class));

    // class entries apply to ACLs created later through the new provider
    let other = second.create_acl(&post("2")).unwrap();
    let granted = AclEvaluator::default()
        .is_granted(&other, &[PermissionMask::OWNER], &[role("ROLE_ADMIN")])
        .unwrap();
    assert!(granted);
}

#[test]
fn mutations_evict_serialized_records() {
    let cache = Arc::new(MemoryAclCache::new("test_"));
    let provider = WardAclProvider::with_cache(memory_backend(), Some(cache.clone()));
    chain(&provider);

    // force a reload through the cache
    provider.clear_loaded();
    provider.find_acl(&post("c"), &[]).unwrap();
    for id in ["a", "b", "c"] {
        assert!(cache.contains(&post(id)), "{id} should be cached");
    }

    let b = provider.find_acl(&post("b"), &[]).unwrap();
    b.set_entries_inheriting(false);
    provider.update_acl(&b).unwrap();
    assert!(cache.contains(&post("a")));
    assert!(!cache.contains(&post("b")));
    assert!(!cache.contains(&post("c")));

    // the next lookup sees the persisted change
    provider.clear_loaded();
    assert!(!provider.find_acl(&post("b"), &[]).unwrap().is_entries_inheriting());
}

#[test]
fn updating_a_detached_copy_replaces_loaded_instances() {
    let provider = memory_provider();
    chain(&provider);
    let loaded_c = provider.find_acl(&post("c"), &[]).unwrap();

    let record = provider.find_acl(&post("b"), &[]).unwrap().to_record();
    let copy = ward_acl::Acl::from_record(
        &record,
        ward_acl::ClassEntries::default(),
        provider.find_acl(&post("a"), &[]).ok(),
    );
    copy.insert_entry(Scope::Object, 0, Entry::grant(user("kevin"), PermissionMask::VIEW))
        .unwrap();
    provider.update_acl(&copy).unwrap();

    let fresh_c = provider.find_acl(&post("c"), &[]).unwrap();
    assert!(!Arc::ptr_eq(&loaded_c, &fresh_c));
    let granted = AclEvaluator::default()
        .is_granted(&fresh_c, &[PermissionMask::VIEW], &[user("kevin")])
        .unwrap();
    assert!(granted);
}

#[test]
fn type_roots_have_no_parent() {
    let provider = memory_provider();
    let root = ObjectIdentity::class_root("Post").unwrap();
    let acl = provider.create_acl(&root).unwrap();
    assert!(acl.parent().is_none());

    // objects created afterwards hang below the existing root
    let child = provider.create_acl(&post("1")).unwrap();
    assert!(Arc::ptr_eq(&child.parent().unwrap(), &acl));
    assert_matches!(
        provider.delete_acl(&root),
        Err(WardError::AclInUse { .. })
    );
}

#[test]
fn cache_can_be_disabled() {
    let mut config = ward_core::WardConfig::default();
    config.cache.enabled = false;
    let provider = WardAclProvider::new(memory_backend(), &config);
    provider.create_acl(&post("1")).unwrap();
    provider.clear_loaded();
    assert!(provider.find_acl(&post("1"), &[]).is_ok());
    assert!(format!("{provider:?}").contains("cached: false"));
}

#[test]
fn cache_is_usable_directly() {
    let cache = MemoryAclCache::new("p_");
    let record = ward_store::AclRecord::new(post("1"), None);
    cache.put(&record).unwrap();
    cache.clear();
    assert!(cache.get(&post("1")).is_none());
}
