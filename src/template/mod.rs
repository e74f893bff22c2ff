//! Template field model.
//!
//! Templates describe the fields of a metadata form. Each `{ ... }` block is
//! parsed into a [`FieldDescriptor`] that owns the control used to edit it.

mod error;
mod field;
mod parser;
mod set;

pub use error::TemplateError;
pub use field::{FieldDescriptor, FieldType, GridPosition, Span, UNASSIGNED_ROW};
pub use set::{RejectedBlock, TemplateSet};
