//! Object identities

use crate::errors::{Result, WardError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier used by the type root identity of every object type
pub const CLASS_IDENTIFIER: &str = "class";

/// Identity of a securable object or class
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectIdentity {
    identifier: String,
    object_type: String,
}

impl ObjectIdentity {
    /// Create an object identity, rejecting empty parts
    pub fn new(identifier: impl Into<String>, object_type: impl Into<String>) -> Result<Self> {
        let identifier = identifier.into();
        let object_type = object_type.into();
        if identifier.is_empty() {
            return Err(WardError::invalid("object identifier must not be empty"));
        }
        if object_type.is_empty() {
            return Err(WardError::invalid("object type must not be empty"));
        }
        Ok(Self {
            identifier,
            object_type,
        })
    }

    /// Type root identity for `object_type`
    pub fn class_root(object_type: impl Into<String>) -> Result<Self> {
        Self::new(CLASS_IDENTIFIER, object_type)
    }

    /// Stable identifier of the object
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Type discriminator of the object
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Whether this is the type root identity
    pub fn is_class_root(&self) -> bool {
        self.identifier == CLASS_IDENTIFIER
    }

    /// Declared ancestor: the type root, or `None` for a root itself
    pub fn declared_parent(&self) -> Option<ObjectIdentity> {
        if self.is_class_root() {
            None
        } else {
            Some(Self {
                identifier: CLASS_IDENTIFIER.to_string(),
                object_type: self.object_type.clone(),
            })
        }
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.identifier)
    }
}

impl FromStr for ObjectIdentity {
    type Err = WardError;

    /// Parse `type:identifier`, splitting at the last colon
    fn from_str(s: &str) -> Result<Self> {
        let (object_type, identifier) = s
            .rsplit_once(':')
            .ok_or_else(|| WardError::invalid(format!("expected type:identifier, got {s:?}")))?;
        Self::new(identifier, object_type)
    }
}
