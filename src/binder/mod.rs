//! Attribute binder.
//!
//! Keeps form fields and attributes of document nodes consistent. A
//! [`Session`] owns the open document, the field bindings and the nodes they
//! resolved to. Nodes are resolved first-match-wins and created lazily on the
//! first write; boolean toggles create and remove whole nodes.

mod binding;
mod error;
mod guard;
mod resolve;
mod session;

#[cfg(test)]
mod tests;

pub use binding::{BindingState, CreatePolicy, FieldBinding, Target, TargetKey};
pub use error::BindError;
pub use guard::{GuardToken, ReentrancyGuard};
pub use resolve::{Resolution, container_node, resolve, resolve_or_create};
pub use session::{LoadReport, Session, WriteOutcome};
