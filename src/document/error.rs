//! Error types for attributed-tree operations.

use thiserror::Error;

use super::NodeId;

/// Errors that can occur while parsing or mutating a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing or serialization error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The text contains no element at all
    #[error("Document has no root element")]
    NoRoot,

    /// A second top-level element follows the root
    #[error("Document has more than one root element ('{first}' and '{second}')")]
    MultipleRoots {
        /// Tag of the root element
        first: String,
        /// Tag of the extra element
        second: String,
    },

    /// Input ended inside an element
    #[error("Element '{tag}' is never closed")]
    Unclosed {
        /// Tag of the innermost open element
        tag: String,
    },

    /// Closing tag without a matching opening tag
    #[error("Unexpected closing tag '{tag}'")]
    UnexpectedEnd {
        /// Tag of the closing element
        tag: String,
    },

    /// Node id that does not belong to this document
    #[error("Node {0:?} does not exist")]
    UnknownNode(NodeId),

    /// Operation on a node that was removed from the tree
    #[error("Node {0:?} is detached from the document")]
    Detached(NodeId),

    /// Removal of a node from a parent it does not belong to
    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Parent the removal was requested on
        parent: NodeId,
        /// Node that was to be removed
        child: NodeId,
    },

    /// Tag or attribute name that cannot be serialized
    #[error("Invalid name '{0}'")]
    InvalidName(String),

    /// Serialized output was not valid UTF-8
    #[error("Invalid UTF-8 in XML")]
    InvalidUtf8,
}
