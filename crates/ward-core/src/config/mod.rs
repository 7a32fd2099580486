//! Ward configuration
//!
//! Configuration is plain serde data with defaults for every field, so an
//! empty document is a valid configuration. Values can be overridden from
//! `WARD_` prefixed environment variables and are validated before use.

pub mod traits;
pub mod validation;

pub use traits::{ConfigValidation, WardConfigSource, ENV_PREFIX};
pub use validation::{ConfigValidator, ValidationError, ValidationResult};

use crate::errors::{Result, WardError};
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardConfig {
    /// Serialized ACL cache settings
    pub cache: CacheConfig,
    /// Backend table names
    pub tables: TablesConfig,
    /// Voter policy
    pub voter: VoterConfig,
}

/// Serialized ACL cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether the provider consults a serialized ACL cache
    pub enabled: bool,
    /// Prefix prepended to every cache key
    pub prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "ward_acl_".to_string(),
        }
    }
}

/// Names of the tables a backend creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    /// Object types
    pub class: String,
    /// Access control entries
    pub entry: String,
    /// Object identities and their parent links
    pub object_identity: String,
    /// Flattened ancestor relation
    pub object_identity_ancestors: String,
    /// Security identities
    pub security_identity: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            class: "acl_classes".to_string(),
            entry: "acl_entries".to_string(),
            object_identity: "acl_object_identities".to_string(),
            object_identity_ancestors: "acl_object_identity_ancestors".to_string(),
            security_identity: "acl_security_identities".to_string(),
        }
    }
}

impl TablesConfig {
    /// Table names in creation order
    pub fn all(&self) -> [&str; 5] {
        [
            self.class.as_str(),
            self.security_identity.as_str(),
            self.object_identity.as_str(),
            self.object_identity_ancestors.as_str(),
            self.entry.as_str(),
        ]
    }
}

/// Voter policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoterConfig {
    /// Grant when no object identity can be determined for the subject
    pub allow_if_object_identity_unavailable: bool,
}

impl Default for VoterConfig {
    fn default() -> Self {
        Self {
            allow_if_object_identity_unavailable: true,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(WardError::config(format!(
            "Invalid boolean for {key}: {other:?}"
        ))),
    }
}

/// Letters, digits and underscores, not starting with a digit
fn is_table_name(name: &str) -> bool {
    !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl WardConfigSource for WardConfig {
    const SECTIONS: &'static [&'static str] = &["cache", "tables", "voter"];

    fn from_toml_str(content: &str) -> Result<Self> {
        let config: WardConfig = toml::from_str(content)?;
        Ok(config)
    }

    fn set_from_string(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "cache.enabled" => self.cache.enabled = parse_bool(key, value)?,
            "cache.prefix" => self.cache.prefix = value.to_string(),
            "tables.class" => self.tables.class = value.to_string(),
            "tables.entry" => self.tables.entry = value.to_string(),
            "tables.object_identity" => self.tables.object_identity = value.to_string(),
            "tables.object_identity_ancestors" => {
                self.tables.object_identity_ancestors = value.to_string();
            }
            "tables.security_identity" => self.tables.security_identity = value.to_string(),
            "voter.allow_if_object_identity_unavailable" => {
                self.voter.allow_if_object_identity_unavailable = parse_bool(key, value)?;
            }
            _ => {
                return Err(WardError::config(format!("Unknown configuration key: {key}")));
            }
        }
        tracing::debug!(key, value, "Configuration value overridden");
        Ok(())
    }
}

impl ConfigValidation for WardConfig {
    fn validate(&self) -> Result<()> {
        let mut validator = ConfigValidator::new();

        let mut cache = validator.for_field("cache");
        cache.non_empty("prefix", &self.cache.prefix).custom(
            "prefix",
            &self.cache.prefix,
            |prefix| !prefix.chars().any(char::is_whitespace),
            "must not contain whitespace",
        );
        validator.merge(cache);

        let mut tables = validator.for_field("tables");
        for (field, value) in [
            ("class", &self.tables.class),
            ("entry", &self.tables.entry),
            ("object_identity", &self.tables.object_identity),
            ("object_identity_ancestors", &self.tables.object_identity_ancestors),
            ("security_identity", &self.tables.security_identity),
        ] {
            tables
                .non_empty(field, value)
                .distinct(field, value)
                .custom(
                    field,
                    value,
                    |name| is_table_name(name),
                    "must be a plain table name",
                );
        }
        validator.merge(tables);

        validator.result().map_err(WardError::from)
    }
}
