//! Unified error system for Ward
//!
//! A single error type shared by every Ward crate. Lifecycle and mutation
//! misuse, unknown permissions and undetermined decisions each get their own
//! variant so callers can match on them instead of parsing messages.

use serde::{Deserialize, Serialize};

/// Unified error type for all Ward operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum WardError {
    /// The permission name is not registered in the permission map
    #[error("Unknown permission: {permission}")]
    UnknownPermission {
        /// The permission name that was requested
        permission: String,
    },

    /// No entry applies to any identity anywhere in the inheritance chain
    #[error("No matching entry: {message}")]
    NoMatchingEntry {
        /// Description of the evaluated ACL chain
        message: String,
    },

    /// No ACL exists for the object identity
    #[error("ACL not found for {object_identity}")]
    AclNotFound {
        /// Object identity that was looked up
        object_identity: String,
    },

    /// An ACL already exists for the object identity
    #[error("ACL already exists for {object_identity}")]
    AclAlreadyExists {
        /// Object identity that was created twice
        object_identity: String,
    },

    /// Other ACLs still reference this ACL as their parent
    #[error("ACL for {object_identity} is parent of {children} other ACL(s)")]
    AclInUse {
        /// Object identity of the referenced ACL
        object_identity: String,
        /// Number of direct children
        children: usize,
    },

    /// Insert position outside `[0, len]`
    #[error("Index {index} out of range for {len} entries")]
    IndexOutOfRange {
        /// Requested position
        index: usize,
        /// Current number of entries
        len: usize,
    },

    /// No entry at the requested position
    #[error("No entry at index {index} ({len} entries)")]
    EntryNotFound {
        /// Requested position
        index: usize,
        /// Current number of entries
        len: usize,
    },

    /// The ancestor chain loops back onto itself
    #[error("Ancestor cycle detected at {object_identity}")]
    AncestorCycle {
        /// Identity where the walk revisited a node
        object_identity: String,
    },

    /// Invalid input
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Backend tables already exist
    #[error("Schema already initialized: {message}")]
    SchemaExists {
        /// Which table collided
        message: String,
    },

    /// Storage operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },
}

impl WardError {
    /// Create an unknown permission error
    pub fn unknown_permission(permission: impl Into<String>) -> Self {
        Self::UnknownPermission {
            permission: permission.into(),
        }
    }

    /// Create a no matching entry error
    pub fn no_matching_entry(message: impl Into<String>) -> Self {
        Self::NoMatchingEntry {
            message: message.into(),
        }
    }

    /// Create an ACL not found error
    pub fn acl_not_found(object_identity: impl ToString) -> Self {
        Self::AclNotFound {
            object_identity: object_identity.to_string(),
        }
    }

    /// Create an ACL already exists error
    pub fn acl_already_exists(object_identity: impl ToString) -> Self {
        Self::AclAlreadyExists {
            object_identity: object_identity.to_string(),
        }
    }

    /// Create an ACL in use error
    pub fn acl_in_use(object_identity: impl ToString, children: usize) -> Self {
        Self::AclInUse {
            object_identity: object_identity.to_string(),
            children,
        }
    }

    /// Create an index out of range error
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create an entry not found error
    pub fn entry_not_found(index: usize, len: usize) -> Self {
        Self::EntryNotFound { index, len }
    }

    /// Create an ancestor cycle error
    pub fn ancestor_cycle(object_identity: impl ToString) -> Self {
        Self::AncestorCycle {
            object_identity: object_identity.to_string(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a schema exists error
    pub fn schema_exists(message: impl Into<String>) -> Self {
        Self::SchemaExists {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True when the error is the undetermined outcome of a permission check
    pub fn is_no_matching_entry(&self) -> bool {
        matches!(self, Self::NoMatchingEntry { .. })
    }

    /// True for lifecycle errors raised by a provider lookup
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AclNotFound { .. })
    }
}

/// Standard Result type for Ward operations
pub type Result<T> = std::result::Result<T, WardError>;

impl From<serde_json::Error> for WardError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<toml::de::Error> for WardError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<std::io::Error> for WardError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}
