//! ome_form - renderable form controls for metadata editing
//!
//! This crate provides the toolkit-independent state of the form controls
//! that metadata templates are rendered into. A host lays the controls out
//! and relays edits; every control can display a value of its kind and
//! notify a listener when that value changes.

#[macro_use]
mod macros;

mod callback;
mod control;
mod error;
mod value;

pub use callback::Listener;
pub use control::{
    Control, ControlId, ControlKind, SelectorState, StepperState, TextAreaState, ThumbnailState,
    ToggleState, ValueChanged,
};
pub use error::ControlError;
pub use value::FieldValue;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::control::{Control, ControlId, ControlKind, ValueChanged};
    pub use crate::error::ControlError;
    pub use crate::value::FieldValue;
}
