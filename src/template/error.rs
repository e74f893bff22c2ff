//! Error types for template parsing.

use thiserror::Error;

use super::field::FieldType;

/// Errors that abort the construction of one field descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// No `{ ... }` block in the definition
    #[error("Template has no '{{' ... '}}' block")]
    MissingDelimiters,

    /// The block never declares `type`
    #[error("Template does not declare a type")]
    MissingType,

    /// `type` names no known field type
    #[error("Unknown field type '{0}'")]
    UnknownType(String),

    /// A quoted value is not closed on its line
    #[error("Unterminated quoted value on line {line}")]
    Unterminated {
        /// Line within the block (1-based)
        line: usize,
    },

    /// A key is not followed by a quoted value
    #[error("Key '{key}' on line {line} has no quoted value")]
    MissingValue {
        /// The key that lacks a value
        key: String,
        /// Line within the block (1-based)
        line: usize,
    },

    /// A numeric value does not parse
    #[error("Invalid number for '{key}': '{value}'")]
    InvalidNumber { key: String, value: String },

    /// A boolean value is neither `true` nor `false`
    #[error("Invalid boolean for '{key}': '{value}'")]
    InvalidBool { key: String, value: String },

    /// The default does not fit the field type
    #[error("Default '{value}' is not valid for a {field_type} field")]
    InvalidDefault { field_type: FieldType, value: String },

    /// Span smaller than one cell
    #[error("Span must be at least 1x1, got {width}x{height}")]
    InvalidSpan { width: i64, height: i64 },

    /// A second field with an already used name
    #[error("Duplicate field name '{0}'")]
    DuplicateName(String),
}

impl TemplateError {
    /// Create an invalid number error.
    pub fn invalid_number(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create an invalid boolean error.
    pub fn invalid_bool(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidBool {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create an invalid default error.
    pub fn invalid_default(field_type: FieldType, value: impl Into<String>) -> Self {
        Self::InvalidDefault {
            field_type,
            value: value.into(),
        }
    }
}
