//! Change listener abstraction for controls
//!
//! Hosts register a listener on a control to be told about value changes.
//! Instead of storing `Option<Box<dyn Fn(&T)>>` on every control, controls
//! hold a `Listener<T>`.
//!
//! ```ignore
//! use ome_form::{Control, Listener};
//!
//! let control = Control::toggle("Ti-Sapphire", false)
//!     .listener(Listener::new(|change| log::info!("{:?}", change)));
//! ```

use std::fmt;

/// An optional observer of values of type `T`.
pub struct Listener<T> {
    f: Option<Box<dyn Fn(&T)>>,
}

impl<T> Listener<T> {
    /// Create a listener from a function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        Self {
            f: Some(Box::new(f)),
        }
    }

    /// Create an empty listener.
    pub fn none() -> Self {
        Self { f: None }
    }

    /// Notify the listener, if one is registered.
    pub fn notify(&self, value: &T) {
        if let Some(ref f) = self.f {
            f(value);
        }
    }

    /// Check if a listener is registered.
    pub fn is_some(&self) -> bool {
        self.f.is_some()
    }

    /// Check if no listener is registered.
    pub fn is_none(&self) -> bool {
        self.f.is_none()
    }
}

impl<T> Default for Listener<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("set", &self.is_some())
            .finish()
    }
}
