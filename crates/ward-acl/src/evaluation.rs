//! Permission resolution
//!
//! Walks an ACL and its inherited parents, object scope before class scope,
//! trying each security identity in the caller's order. The first applicable
//! entry decides; when nothing applies anywhere the result is
//! [`WardError::NoMatchingEntry`], never a silent `false`.

use crate::acl::Acl;
use std::collections::HashSet;
use std::sync::Arc;
use ward_core::{Entry, ObjectIdentity, PermissionMask, Result, SecurityIdentity, WardError};

/// Target of audit events
pub const AUDIT_TARGET: &str = "ward::audit";

/// Receives decisions made by entries that request auditing
pub trait AuditLogger: Send + Sync {
    /// Record that `entry` of the ACL of `object_identity` decided `granted`
    fn log(&self, granted: bool, object_identity: &ObjectIdentity, entry: &Entry);

    /// Record the decision if the deciding entry asks for it
    fn log_if_needed(&self, granted: bool, object_identity: &ObjectIdentity, entry: &Entry) {
        if entry.should_audit(granted) {
            self.log(granted, object_identity, entry);
        }
    }
}

/// Audit logger emitting `tracing` events on the `ward::audit` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

impl AuditLogger for TracingAuditLogger {
    fn log(&self, granted: bool, object_identity: &ObjectIdentity, entry: &Entry) {
        if granted {
            tracing::info!(
                target: AUDIT_TARGET,
                object_identity = %object_identity,
                security_identity = %entry.security_identity,
                mask = %entry.mask,
                "Access granted"
            );
        } else {
            tracing::warn!(
                target: AUDIT_TARGET,
                object_identity = %object_identity,
                security_identity = %entry.security_identity,
                mask = %entry.mask,
                "Access denied"
            );
        }
    }
}

/// Resolution engine
#[derive(Clone)]
pub struct AclEvaluator {
    audit_logger: Arc<dyn AuditLogger>,
}

impl Default for AclEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(TracingAuditLogger))
    }
}

impl std::fmt::Debug for AclEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AclEvaluator").finish_non_exhaustive()
    }
}

impl AclEvaluator {
    /// Engine reporting audited decisions to `audit_logger`
    pub fn new(audit_logger: Arc<dyn AuditLogger>) -> Self {
        Self { audit_logger }
    }

    /// Decide whether any of `identities` holds any of `masks` on `acl`
    ///
    /// `masks` is the expansion of one permission and is treated as a
    /// disjunction. Fails with `NoMatchingEntry` when no entry applies in the
    /// whole inherited chain.
    pub fn is_granted(
        &self,
        acl: &Acl,
        masks: &[PermissionMask],
        identities: &[SecurityIdentity],
    ) -> Result<bool> {
        self.evaluate(acl, masks, identities, true)
    }

    /// Same decision as [`is_granted`](Self::is_granted) without auditing
    pub fn is_granted_administrative(
        &self,
        acl: &Acl,
        masks: &[PermissionMask],
        identities: &[SecurityIdentity],
    ) -> Result<bool> {
        self.evaluate(acl, masks, identities, false)
    }

    fn evaluate(
        &self,
        acl: &Acl,
        masks: &[PermissionMask],
        identities: &[SecurityIdentity],
        audit: bool,
    ) -> Result<bool> {
        if masks.is_empty() {
            return Err(WardError::invalid("at least one permission mask is required"));
        }
        if identities.is_empty() {
            return Err(WardError::invalid("at least one security identity is required"));
        }

        if let Some(granted) = self.decide(acl, masks, identities, audit) {
            return Ok(granted);
        }

        let mut visited = HashSet::from([acl.object_identity().clone()]);
        let mut cursor = acl.inherited_parent();
        while let Some(current) = cursor {
            if !visited.insert(current.object_identity().clone()) {
                return Err(WardError::ancestor_cycle(current.object_identity()));
            }
            if let Some(granted) = self.decide(&current, masks, identities, audit) {
                return Ok(granted);
            }
            cursor = current.inherited_parent();
        }

        tracing::debug!(
            object_identity = %acl.object_identity(),
            visited = visited.len(),
            "No entry applies"
        );
        Err(WardError::no_matching_entry(format!(
            "no entry of {} or its ancestors applies",
            acl.object_identity()
        )))
    }

    /// Decision of a single ACL, without looking at its parent
    fn decide(
        &self,
        acl: &Acl,
        masks: &[PermissionMask],
        identities: &[SecurityIdentity],
        audit: bool,
    ) -> Option<bool> {
        let (scope, entry) = acl.first_applicable(identities, masks)?;

        tracing::trace!(
            object_identity = %acl.object_identity(),
            %scope,
            security_identity = %entry.security_identity,
            granting = entry.granting,
            "Entry decided"
        );
        if audit {
            self.audit_logger
                .log_if_needed(entry.granting, acl.object_identity(), &entry);
        }
        Some(entry.granting)
    }
}
