//! Security identities
//!
//! A security identity is whoever an entry grants or denies permissions to.
//! The set of kinds is closed: roles, users and the anonymous marker.

use crate::errors::{Result, WardError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Principal that can be granted or denied permissions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecurityIdentity {
    /// A named role such as `ROLE_ADMIN`
    Role {
        /// Role name
        role: String,
    },
    /// A concrete user of a given user class
    User {
        /// Username or other stable identifier
        username: String,
        /// Class (kind) of the user account
        class: String,
    },
    /// Marker shared by every requester, authenticated or not
    Anonymous,
}

impl SecurityIdentity {
    /// Create a role identity, rejecting empty names
    pub fn role(role: impl Into<String>) -> Result<Self> {
        let role = role.into();
        if role.trim().is_empty() {
            return Err(WardError::invalid("role name must not be empty"));
        }
        Ok(Self::Role { role })
    }

    /// Create a user identity, rejecting empty usernames and classes
    pub fn user(username: impl Into<String>, class: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let class = class.into();
        if username.trim().is_empty() {
            return Err(WardError::invalid("username must not be empty"));
        }
        if class.trim().is_empty() {
            return Err(WardError::invalid(format!(
                "user class must not be empty for {username}"
            )));
        }
        Ok(Self::User { username, class })
    }

    /// The anonymous marker
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Check the identity is well formed
    ///
    /// Identities built through the constructors are always valid, but
    /// deserialized ones bypass them.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Role { role } => Self::role(role.as_str()).map(|_| ()),
            Self::User { username, class } => {
                Self::user(username.as_str(), class.as_str()).map(|_| ())
            }
            Self::Anonymous => Ok(()),
        }
    }

    /// Whether this is a role identity
    pub fn is_role(&self) -> bool {
        matches!(self, Self::Role { .. })
    }

    /// Whether this is a user identity
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    /// Whether this is the anonymous marker
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Ordered identities for a principal, most specific first
    ///
    /// The user comes first, then each distinct role in the order given, then
    /// the anonymous marker.
    pub fn for_principal(principal: &Principal) -> Result<Vec<SecurityIdentity>> {
        let mut identities = Vec::with_capacity(principal.roles.len() + 2);
        identities.push(Self::user(
            principal.username.as_str(),
            principal.class.as_str(),
        )?);
        for role in &principal.roles {
            let identity = Self::role(role.as_str())?;
            if !identities.contains(&identity) {
                identities.push(identity);
            }
        }
        identities.push(Self::Anonymous);
        Ok(identities)
    }
}

impl fmt::Display for SecurityIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role { role } => write!(f, "role:{role}"),
            Self::User { username, class } => write!(f, "user:{class}:{username}"),
            Self::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// Authenticated requester as seen by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Username of the requester
    pub username: String,
    /// User class of the requester
    pub class: String,
    /// Roles held by the requester
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Principal {
    /// Create a principal without roles
    pub fn new(username: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            class: class.into(),
            roles: Vec::new(),
        }
    }

    /// Add a role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_validation() {
        assert!(SecurityIdentity::role("").is_err());
        assert!(SecurityIdentity::role("  ").is_err());
        assert!(SecurityIdentity::user("", "app.User").is_err());
        assert!(SecurityIdentity::user("kevin", "").is_err());
        assert!(SecurityIdentity::user("kevin", "app.User").is_ok());
    }

    #[test]
    fn test_equality_covers_kind_and_class() {
        let a = SecurityIdentity::user("kevin", "app.User").unwrap();
        let b = SecurityIdentity::user("kevin", "app.Admin").unwrap();
        let c = SecurityIdentity::role("kevin").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, SecurityIdentity::user("kevin", "app.User").unwrap());
    }

    #[test]
    fn test_principal_ordering() {
        let principal = Principal::new("kevin", "app.User")
            .with_role("ROLE_USER")
            .with_role("ROLE_ADMIN")
            .with_role("ROLE_USER");

        let identities = SecurityIdentity::for_principal(&principal).unwrap();
        assert_eq!(identities.len(), 4);
        assert!(identities[0].is_user());
        assert_eq!(identities[1], SecurityIdentity::role("ROLE_USER").unwrap());
        assert_eq!(identities[2], SecurityIdentity::role("ROLE_ADMIN").unwrap());
        assert!(identities[3].is_anonymous());
    }

    #[test]
    fn test_deserialized_identity_is_validated() {
        let sid: SecurityIdentity = serde_json::from_str(r#"{"kind":"role","role":""}"#).unwrap();
        assert!(sid.validate().is_err());
    }
}
