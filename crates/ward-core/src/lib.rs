//! # Ward Core - Foundation
//!
//! Value types shared by every Ward crate: who asks (security identities),
//! what is asked about (object identities), what is asked for (permission
//! masks and the map that expands permission names), the rules that answer
//! (entries), plus the unified error type and configuration.
//!
//! ## What's NOT in this crate
//!
//! - ACL aggregates and resolution (belong in `ward-acl`)
//! - Persistence (belongs in `ward-store`)

#![forbid(unsafe_code)]

/// Configuration loading, overrides and validation
pub mod config;

/// Access control entries and scopes
pub mod entry;

/// Unified error handling
pub mod errors;

/// Security identities (roles, users, anonymous)
pub mod identity;

/// Object identities
pub mod object;

/// Permission masks, permission map and mask builder
pub mod permission;

pub use config::{ConfigValidation, WardConfig, WardConfigSource};
pub use entry::{Entry, MatchStrategy, Scope};
pub use errors::{Result, WardError};
pub use identity::{Principal, SecurityIdentity};
pub use object::ObjectIdentity;
pub use permission::{BasicPermission, BasicPermissionMap, MaskBuilder, PermissionMap, PermissionMask};
