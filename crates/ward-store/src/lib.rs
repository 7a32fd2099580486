//! # Ward Store - Persistence
//!
//! **Purpose**: Define the boundary between ACL aggregates and wherever they
//! are kept.
//!
//! ## Core Concepts
//!
//! - **Records**: serializable snapshots of one ACL (`AclRecord`)
//! - **Backends**: the `AclBackend` contract for loading, saving, deleting
//!   and walking parent links, plus per-type class entries
//! - **Memory backend**: a table-shaped in-process implementation using the
//!   configured table names
//!
//! ## What's NOT in this crate
//!
//! - Permission resolution (belongs in `ward-acl`)
//! - Caching of loaded ACLs (belongs in `ward-acl`)

#![forbid(unsafe_code)]

/// Backend contract
pub mod backend;

/// In-memory table backend
pub mod memory;

/// Persisted ACL records
pub mod record;

pub use backend::AclBackend;
pub use memory::MemoryBackend;
pub use record::AclRecord;
