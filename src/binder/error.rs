//! Error types for the attribute binder.

use ome_form::ControlError;
use thiserror::Error;

use crate::document::DocumentError;
use crate::form::FormError;

/// Errors raised while syncing a form with a document.
#[derive(Error, Debug)]
pub enum BindError {
    /// The tree rejected a mutation
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// A control rejected a value
    #[error(transparent)]
    Control(#[from] ControlError),

    /// A form operation failed
    #[error(transparent)]
    Form(#[from] FormError),

    /// A write needs a node that no other binding has produced yet
    #[error("Field '{field}' needs a bound <{tag}> node")]
    RequireBound { field: String, tag: String },

    /// A `valueMap` directive that cannot be turned into a binding
    #[error("Invalid value map '{0}' (expected 'Tag:Attribute' or 'Container/Tag:Attribute')")]
    InvalidValueMap(String),
}

impl BindError {
    /// Create a require-bound error.
    pub fn require_bound(field: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::RequireBound {
            field: field.into(),
            tag: tag.into(),
        }
    }
}
