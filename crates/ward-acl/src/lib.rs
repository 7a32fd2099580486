//! # Ward ACL - Decision Engine
//!
//! **Purpose**: Answer "may these identities do this to that object?" from
//! ordered access control entries.
//!
//! ## Core Concepts
//!
//! - **Acl**: per-object entry store with a class scope shared by the
//!   object type and an optional parent to inherit from
//! - **Evaluation**: first applicable entry wins, object scope before class
//!   scope before parent; no applicable entry is an error, not a denial
//! - **Provider**: identity map, serialized cache and backend behind
//!   `AclProvider` / `MutableAclProvider`
//! - **Voter and service**: permission-name based entry points
//!
//! ## What's NOT in this crate
//!
//! - Value types and errors (belong in `ward-core`)
//! - Table storage (belongs in `ward-store`)

#![forbid(unsafe_code)]

/// ACL aggregate and entry store
pub mod acl;

/// Ancestor chain cache
pub mod ancestry;

/// Serialized ACL cache
pub mod cache;

/// Permission resolution and audit logging
pub mod evaluation;

/// ACL providers
pub mod provider;

/// Permission-name based service
pub mod service;

/// Access decision voter
pub mod voter;

pub use acl::{Acl, ClassEntries};
pub use ancestry::{AncestorCache, AncestorChain};
pub use cache::{AclCache, CacheStats, MemoryAclCache};
pub use evaluation::{AclEvaluator, AuditLogger, TracingAuditLogger, AUDIT_TARGET};
pub use provider::{AclProvider, MutableAclProvider, WardAclProvider};
pub use service::{AclService, SetAclRequest};
pub use voter::{AclVoter, Vote};
