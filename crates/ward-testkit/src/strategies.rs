//! Property test strategies for Ward types
//!
//! Identities are drawn from small pools so generated entries collide with
//! generated queries often enough to exercise matching.

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use ward_core::{BasicPermission, Entry, MatchStrategy, ObjectIdentity, PermissionMask, SecurityIdentity};

static ROLES: [&str; 3] = ["ROLE_ADMIN", "ROLE_EDITOR", "ROLE_USER"];
static USERS: [&str; 3] = ["kevin", "alice", "bob"];

/// Strategy for security identities from a small pool
pub fn arb_security_identity() -> impl Strategy<Value = SecurityIdentity> {
    prop_oneof![
        prop::sample::select(&ROLES[..]).prop_map(|r| SecurityIdentity::role(r).unwrap()),
        prop::sample::select(&USERS[..])
            .prop_map(|u| SecurityIdentity::user(u, "User").unwrap()),
        Just(SecurityIdentity::Anonymous),
    ]
}

/// Strategy for a non-empty list of distinct security identities
pub fn arb_identities() -> impl Strategy<Value = Vec<SecurityIdentity>> {
    prop::collection::vec(arb_security_identity(), 1..5).prop_map(|mut identities| {
        let mut seen = Vec::new();
        identities.retain(|identity| {
            let first = !seen.contains(identity);
            seen.push(identity.clone());
            first
        });
        identities
    })
}

/// Strategy for single basic permission bits
pub fn arb_basic_mask() -> impl Strategy<Value = PermissionMask> {
    prop::sample::select(BasicPermission::ALL.to_vec()).prop_map(BasicPermission::mask)
}

/// Strategy for non-empty combinations of basic permission bits
pub fn arb_mask() -> impl Strategy<Value = PermissionMask> {
    (1u32..=0xff).prop_map(PermissionMask::from_bits)
}

/// Strategy for match strategies
pub fn arb_match_strategy() -> impl Strategy<Value = MatchStrategy> {
    prop_oneof![
        Just(MatchStrategy::Any),
        Just(MatchStrategy::All),
        Just(MatchStrategy::Equal),
    ]
}

/// Strategy for entries with arbitrary identity, mask, polarity and strategy
pub fn arb_entry() -> impl Strategy<Value = Entry> {
    (
        arb_security_identity(),
        arb_mask(),
        any::<bool>(),
        arb_match_strategy(),
    )
        .prop_map(|(identity, mask, granting, strategy)| {
            Entry::new(identity, mask, granting).with_strategy(strategy)
        })
}

/// Strategy for entry sequences of up to `max` entries
pub fn arb_entries(max: usize) -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec(arb_entry(), 0..=max)
}

/// Strategy for object identities of a few types
pub fn arb_object_identity() -> impl Strategy<Value = ObjectIdentity> {
    (1u32..1000, prop::sample::select(vec!["Post", "Comment", "Car"]))
        .prop_map(|(id, object_type)| ObjectIdentity::new(id.to_string(), object_type).unwrap())
}
