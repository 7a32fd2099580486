//! Core configuration traits for the Ward configuration system

use crate::errors::{Result, WardError};
use std::path::Path;

/// Prefix of environment variables that override configuration values
pub const ENV_PREFIX: &str = "WARD_";

/// Configuration types that can be loaded, overridden and validated
pub trait WardConfigSource: Clone + Default + Send + Sync + 'static {
    /// Section names that environment variables may override
    const SECTIONS: &'static [&'static str];

    /// Parse configuration from a TOML document
    fn from_toml_str(content: &str) -> Result<Self>;

    /// Load configuration from a TOML file
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WardError::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Set a value from its dotted key (e.g. `cache.prefix`)
    fn set_from_string(&mut self, key: &str, value: &str) -> Result<()>;

    /// Apply `WARD_` prefixed variables from an iterator of pairs
    ///
    /// `WARD_CACHE_PREFIX` maps to `cache.prefix`; the first underscore after
    /// the prefix separates the section from the field. Variables naming a
    /// section outside [`SECTIONS`](Self::SECTIONS) are left alone, an
    /// unknown field inside a known section is an error.
    fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(rest) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let rest = rest.to_lowercase();
            let Some((section, field)) = rest.split_once('_') else {
                continue;
            };
            if !Self::SECTIONS.contains(&section) {
                tracing::trace!(key = %key, "Ignoring variable outside configuration sections");
                continue;
            }
            self.set_from_string(&format!("{section}.{field}"), &value)?;
        }
        Ok(())
    }

    /// Apply `WARD_` prefixed variables from the process environment
    fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }
}

/// Trait for configuration validation
pub trait ConfigValidation {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;
}
