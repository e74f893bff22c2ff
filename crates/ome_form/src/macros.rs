//! Macros for reducing boilerplate in control implementations.

/// Generates a builder-style setter method for a field.
///
/// ```ignore
/// builder_field!(enabled, bool);
/// // Generates: pub fn enabled(mut self, value: bool) -> Self { self.enabled = value; self }
/// ```
macro_rules! builder_field {
    ($name:ident, $type:ty) => {
        pub fn $name(mut self, value: $type) -> Self {
            self.$name = value;
            self
        }
    };
}
