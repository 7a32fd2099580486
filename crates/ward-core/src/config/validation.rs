//! Configuration validation utilities

use crate::errors::WardError;
use std::collections::HashMap;
use std::fmt;

/// Configuration validation result
pub type ValidationResult = std::result::Result<(), ValidationError>;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value is required but empty
    Required {
        /// Dotted field name
        field: String,
    },
    /// Two fields that must differ hold the same value
    Duplicate {
        /// Dotted field name
        field: String,
        /// Field already holding the value
        other: String,
        /// The shared value
        value: String,
    },
    /// Custom validation failed
    Custom {
        /// Dotted field name
        field: String,
        /// Explanation
        message: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required { field } => {
                write!(f, "Field '{field}' is required but empty")
            }
            ValidationError::Duplicate { field, other, value } => {
                write!(f, "Field '{field}' reuses '{value}' already used by '{other}'")
            }
            ValidationError::Custom { field, message } => {
                write!(f, "Field '{field}': {message}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for WardError {
    fn from(err: ValidationError) -> Self {
        WardError::config(err.to_string())
    }
}

/// Configuration validator that accumulates validation errors
#[derive(Debug, Default)]
pub struct ConfigValidator {
    errors: Vec<ValidationError>,
    field_prefix: String,
    seen: HashMap<String, String>,
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator for a nested section
    pub fn for_field(&self, field_name: &str) -> Self {
        Self {
            errors: Vec::new(),
            field_prefix: self.full_field_name(field_name),
            seen: HashMap::new(),
        }
    }

    /// Validate that a string is not blank
    pub fn non_empty(&mut self, field_name: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors.push(ValidationError::Required {
                field: self.full_field_name(field_name),
            });
        }
        self
    }

    /// Validate that a value is not shared with another field passed to `distinct`
    pub fn distinct(&mut self, field_name: &str, value: &str) -> &mut Self {
        let field = self.full_field_name(field_name);
        match self.seen.get(value) {
            Some(other) => self.errors.push(ValidationError::Duplicate {
                field,
                other: other.clone(),
                value: value.to_string(),
            }),
            None => {
                self.seen.insert(value.to_string(), field);
            }
        }
        self
    }

    /// Validate using a custom predicate
    pub fn custom<T, F>(&mut self, field_name: &str, value: &T, predicate: F, message: &str) -> &mut Self
    where
        F: FnOnce(&T) -> bool,
    {
        if !predicate(value) {
            self.errors.push(ValidationError::Custom {
                field: self.full_field_name(field_name),
                message: message.to_string(),
            });
        }
        self
    }

    /// Merge errors from another validator
    pub fn merge(&mut self, other: ConfigValidator) {
        self.errors.extend(other.errors);
    }

    /// First error, if any
    pub fn result(self) -> ValidationResult {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// All accumulated errors
    pub fn all_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    fn full_field_name(&self, field_name: &str) -> String {
        if self.field_prefix.is_empty() {
            field_name.to_string()
        } else {
            format!("{}.{field_name}", self.field_prefix)
        }
    }
}
