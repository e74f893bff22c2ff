//! Error types for control value assignment.

use thiserror::Error;

/// Errors raised when a value is pushed into a control.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The value kind does not match the control kind
    #[error("Control '{label}' expects a {expected} value, got {found}")]
    KindMismatch {
        /// Label of the control
        label: String,
        /// Value kind the control accepts
        expected: &'static str,
        /// Value kind that was supplied
        found: &'static str,
    },

    /// Numeric value outside the stepper's bounds
    #[error("Value {value} is out of range for '{label}' (minimum {min})")]
    OutOfRange {
        label: String,
        value: i64,
        min: i64,
        max: Option<i64>,
    },

    /// Selector value that is not one of its options
    #[error("'{value}' is not an option of '{label}'")]
    UnknownOption { label: String, value: String },

    /// User edit on a disabled control
    #[error("Control '{label}' is disabled")]
    Disabled { label: String },
}

impl ControlError {
    /// Create a kind mismatch error.
    pub fn kind_mismatch(label: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self::KindMismatch {
            label: label.into(),
            expected,
            found,
        }
    }
}
