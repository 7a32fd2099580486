//! Access control entries
//!
//! An entry binds a security identity to a permission mask and says whether
//! a match grants or denies. Its index is its position inside the ordered
//! sequence of its scope; earlier entries shadow later ones.

use crate::errors::Result;
use crate::identity::SecurityIdentity;
use crate::permission::PermissionMask;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which entry sequence of an ACL an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Applies to one object only
    Object,
    /// Shared by every object of the same type
    Class,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => write!(f, "object"),
            Self::Class => write!(f, "class"),
        }
    }
}

/// How an entry mask is compared with a required mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// At least one required bit is present
    #[default]
    Any,
    /// Every required bit is present
    All,
    /// Masks are identical
    Equal,
}

impl MatchStrategy {
    /// Whether `entry_mask` satisfies `required` under this strategy
    pub fn applies(self, entry_mask: PermissionMask, required: PermissionMask) -> bool {
        match self {
            Self::Any => entry_mask.intersects(required),
            Self::All => entry_mask.contains(required),
            Self::Equal => entry_mask == required,
        }
    }
}

/// A single grant or deny rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Identity the rule applies to
    pub security_identity: SecurityIdentity,
    /// Permission bits covered by the rule
    pub mask: PermissionMask,
    /// Grant on match, or deny
    pub granting: bool,
    /// Mask comparison strategy
    #[serde(default)]
    pub strategy: MatchStrategy,
    /// Emit an audit event when this entry grants
    #[serde(default)]
    pub audit_success: bool,
    /// Emit an audit event when this entry denies
    #[serde(default)]
    pub audit_failure: bool,
}

impl Entry {
    /// Granting entry with the default strategy
    pub fn grant(security_identity: SecurityIdentity, mask: PermissionMask) -> Self {
        Self::new(security_identity, mask, true)
    }

    /// Denying entry with the default strategy
    pub fn deny(security_identity: SecurityIdentity, mask: PermissionMask) -> Self {
        Self::new(security_identity, mask, false)
    }

    /// Entry with the default strategy and auditing off
    pub fn new(security_identity: SecurityIdentity, mask: PermissionMask, granting: bool) -> Self {
        Self {
            security_identity,
            mask,
            granting,
            strategy: MatchStrategy::default(),
            audit_success: false,
            audit_failure: false,
        }
    }

    /// Replace the mask comparison strategy
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the audit flags
    pub fn with_auditing(mut self, audit_success: bool, audit_failure: bool) -> Self {
        self.audit_success = audit_success;
        self.audit_failure = audit_failure;
        self
    }

    /// Whether this entry decides a check for `identity` and `required`
    pub fn applies_to(&self, identity: &SecurityIdentity, required: PermissionMask) -> bool {
        self.security_identity == *identity && self.strategy.applies(self.mask, required)
    }

    /// Whether the decision of this entry should be audited
    pub fn should_audit(&self, granted: bool) -> bool {
        if granted {
            self.audit_success
        } else {
            self.audit_failure
        }
    }

    /// Reject malformed identities
    pub fn validate(&self) -> Result<()> {
        self.security_identity.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> SecurityIdentity {
        SecurityIdentity::role("ROLE_ADMIN").unwrap()
    }

    #[test]
    fn test_strategies() {
        let composite = PermissionMask::VIEW | PermissionMask::EDIT;
        let required = PermissionMask::VIEW | PermissionMask::DELETE;

        assert!(MatchStrategy::Any.applies(composite, required));
        assert!(!MatchStrategy::All.applies(composite, required));
        assert!(MatchStrategy::All.applies(composite, PermissionMask::EDIT));
        assert!(!MatchStrategy::Equal.applies(composite, PermissionMask::EDIT));
        assert!(MatchStrategy::Equal.applies(composite, composite));
    }

    #[test]
    fn test_entry_applies_only_to_its_identity() {
        let entry = Entry::grant(admin(), PermissionMask::VIEW);
        assert!(entry.applies_to(&admin(), PermissionMask::VIEW));
        assert!(!entry.applies_to(&admin(), PermissionMask::EDIT));
        assert!(!entry.applies_to(&SecurityIdentity::Anonymous, PermissionMask::VIEW));
    }

    #[test]
    fn test_audit_flags() {
        let entry = Entry::deny(admin(), PermissionMask::VIEW).with_auditing(false, true);
        assert!(entry.should_audit(false));
        assert!(!entry.should_audit(true));
    }
}
