//! Permission name expansion

use super::mask::{BasicPermission, PermissionMask};
use crate::errors::{Result, WardError};

/// Expands a requested permission name into the masks that satisfy it
///
/// The returned masks form a disjunction: a check succeeds when any of them
/// matches a granting entry.
pub trait PermissionMap: Send + Sync {
    /// Masks accepted for `permission`, in evaluation order
    fn masks(&self, permission: &str) -> Result<Vec<PermissionMask>>;

    /// Whether `permission` is registered
    fn contains(&self, permission: &str) -> bool;
}

/// Map of the basic permissions where stronger permissions imply weaker ones
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicPermissionMap;

impl BasicPermissionMap {
    /// Create the basic permission map
    pub fn new() -> Self {
        Self
    }

    fn expand(permission: BasicPermission) -> Vec<PermissionMask> {
        use BasicPermission::*;

        let implied: &[BasicPermission] = match permission {
            View => &[View, Edit, Operator, Master, Owner],
            Edit => &[Edit, Operator, Master, Owner],
            Create => &[Create, Operator, Master, Owner],
            Delete => &[Delete, Operator, Master, Owner],
            Undelete => &[Undelete, Operator, Master, Owner],
            Operator => &[Operator, Master, Owner],
            Master => &[Master, Owner],
            Owner => &[Owner],
        };
        implied.iter().map(|p| p.mask()).collect()
    }
}

impl PermissionMap for BasicPermissionMap {
    fn masks(&self, permission: &str) -> Result<Vec<PermissionMask>> {
        BasicPermission::from_name(permission)
            .map(Self::expand)
            .ok_or_else(|| WardError::unknown_permission(permission))
    }

    fn contains(&self, permission: &str) -> bool {
        BasicPermission::from_name(permission).is_some()
    }
}
