//! Permission masks and the names that map onto them
//!
//! Every bit of a [`PermissionMask`] is an independent basic permission;
//! composite permissions are bitwise ORs. The [`PermissionMap`] expands a
//! requested permission name into the masks that satisfy it.

pub mod builder;
pub mod map;
pub mod mask;

pub use builder::MaskBuilder;
pub use map::{BasicPermissionMap, PermissionMap};
pub use mask::{BasicPermission, PermissionMask};
