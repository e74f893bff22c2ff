//! OME Notes - metadata notebook for OME-XML documents
//!
//! Parses field templates into form controls, binds them to attributes of an
//! OME-XML document and shows the document as an element outline.

pub mod binder;
pub mod config;
pub mod document;
pub mod form;
pub mod intake;
pub mod notebook;
pub mod template;
pub mod viewer;

pub use binder::{BindError, FieldBinding, Session, WriteOutcome};
pub use config::{LogLevel, NotesConfig};
pub use document::{AttributedTree, Document, DocumentError, NodeId};
pub use form::{Form, FormError};
pub use notebook::Notebook;
pub use template::{FieldDescriptor, FieldType, TemplateError, TemplateSet};
pub use viewer::MetadataView;
