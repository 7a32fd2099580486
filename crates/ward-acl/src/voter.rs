//! Access decision voter
//!
//! Adapts the resolution engine to a three-way vote for callers that combine
//! several voters. Undetermined outcomes become `Denied`; missing subjects
//! follow the `allow_if_object_identity_unavailable` policy.

use crate::evaluation::AclEvaluator;
use crate::provider::AclProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ward_core::config::VoterConfig;
use ward_core::{ObjectIdentity, PermissionMap, Result, SecurityIdentity, WardError};

/// Outcome of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    /// Access granted
    Granted,
    /// Access denied
    Denied,
    /// The voter has no opinion
    Abstain,
}

/// Voter backed by an ACL provider
pub struct AclVoter<P> {
    provider: Arc<P>,
    permission_map: Arc<dyn PermissionMap>,
    evaluator: AclEvaluator,
    allow_if_object_identity_unavailable: bool,
}

impl<P: AclProvider> AclVoter<P> {
    /// Create a voter
    pub fn new(
        provider: Arc<P>,
        permission_map: Arc<dyn PermissionMap>,
        evaluator: AclEvaluator,
        config: &VoterConfig,
    ) -> Self {
        Self {
            provider,
            permission_map,
            evaluator,
            allow_if_object_identity_unavailable: config.allow_if_object_identity_unavailable,
        }
    }

    /// Whether the voter understands `attribute`
    pub fn supports_attribute(&self, attribute: &str) -> bool {
        self.permission_map.contains(attribute)
    }

    /// Vote on `attributes` for `object` on behalf of `identities`
    ///
    /// The first supported attribute decides. Provider and engine errors
    /// other than `AclNotFound` and `NoMatchingEntry` are returned.
    pub fn vote(
        &self,
        object: Option<&ObjectIdentity>,
        attributes: &[&str],
        identities: &[SecurityIdentity],
    ) -> Result<Vote> {
        let Some(attribute) = attributes
            .iter()
            .copied()
            .find(|attribute| self.supports_attribute(attribute))
        else {
            return Ok(Vote::Abstain);
        };

        let Some(object) = object else {
            let vote = if self.allow_if_object_identity_unavailable {
                Vote::Granted
            } else {
                Vote::Abstain
            };
            tracing::debug!(attribute, ?vote, "Object identity unavailable");
            return Ok(vote);
        };

        let masks = self.permission_map.masks(attribute)?;
        let decision = self
            .provider
            .find_acl(object, identities)
            .and_then(|acl| self.evaluator.is_granted(&acl, &masks, identities));

        let vote = match decision {
            Ok(true) => Vote::Granted,
            Ok(false) => Vote::Denied,
            Err(WardError::AclNotFound { .. }) | Err(WardError::NoMatchingEntry { .. }) => {
                Vote::Denied
            }
            Err(err) => return Err(err),
        };
        tracing::debug!(object_identity = %object, attribute, ?vote, "ACL vote");
        Ok(vote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MutableAclProvider, WardAclProvider};
    use ward_core::{BasicPermissionMap, Entry, PermissionMask, Scope, WardConfig};
    use ward_store::MemoryBackend;

    fn voter(allow: bool) -> AclVoter<WardAclProvider<MemoryBackend>> {
        let provider = Arc::new(WardAclProvider::new(
            MemoryBackend::initialized().unwrap(),
            &WardConfig::default(),
        ));
        AclVoter::new(
            provider,
            Arc::new(BasicPermissionMap::new()),
            AclEvaluator::default(),
            &VoterConfig {
                allow_if_object_identity_unavailable: allow,
            },
        )
    }

    fn anonymous() -> Vec<SecurityIdentity> {
        vec![SecurityIdentity::Anonymous]
    }

    #[test]
    fn test_unsupported_attributes_abstain() {
        let voter = voter(true);
        let oid = ObjectIdentity::new("1", "Post").unwrap();
        let vote = voter
            .vote(Some(&oid), &["IS_AUTHENTICATED_FULLY"], &anonymous())
            .unwrap();
        assert_eq!(vote, Vote::Abstain);
    }

    #[test]
    fn test_missing_object_follows_policy() {
        assert_eq!(
            voter(true).vote(None, &["VIEW"], &anonymous()).unwrap(),
            Vote::Granted
        );
        assert_eq!(
            voter(false).vote(None, &["VIEW"], &anonymous()).unwrap(),
            Vote::Abstain
        );
    }

    #[test]
    fn test_missing_acl_and_no_entry_deny() {
        let voter = voter(true);
        let oid = ObjectIdentity::new("1", "Post").unwrap();
        assert_eq!(
            voter.vote(Some(&oid), &["VIEW"], &anonymous()).unwrap(),
            Vote::Denied
        );

        voter.provider.create_acl(&oid).unwrap();
        assert_eq!(
            voter.vote(Some(&oid), &["VIEW"], &anonymous()).unwrap(),
            Vote::Denied
        );
    }

    #[test]
    fn test_granting_entry_grants() {
        let voter = voter(false);
        let oid = ObjectIdentity::new("1", "Post").unwrap();
        let acl = voter.provider.create_acl(&oid).unwrap();
        acl.insert_entry(
            Scope::Object,
            0,
            Entry::grant(SecurityIdentity::Anonymous, PermissionMask::EDIT),
        )
        .unwrap();

        // EDIT implies VIEW through the permission map
        assert_eq!(
            voter
                .vote(Some(&oid), &["ROLE_USER", "view"], &anonymous())
                .unwrap(),
            Vote::Granted
        );
    }
}
