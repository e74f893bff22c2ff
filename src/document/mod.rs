//! Attributed document model.
//!
//! A small XML element tree (tags, ordered attributes, children, character
//! data) with the capabilities the binder relies on exposed through the
//! [`AttributedTree`] trait. Parsing and serialization use `quick-xml`.

mod error;
mod tree;
mod xml;

pub use error::DocumentError;
pub use tree::{AttributedTree, Document, NodeId};
