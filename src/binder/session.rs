//! Editing session over one open document.

use ome_form::{ControlError, ControlKind, FieldValue, ValueChanged};

use crate::document::{AttributedTree, Document, NodeId};
use crate::form::Form;
use crate::template::FieldDescriptor;

use super::binding::{BindingState, CreatePolicy, FieldBinding, Target};
use super::error::BindError;
use super::guard::ReentrancyGuard;
use super::resolve::{container_node, resolve, resolve_or_create};

/// Result of [`Session::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The attribute was set on `node`
    Applied { node: NodeId },
    /// The change arrived while the session was loading and was ignored
    Suppressed,
    /// A toggle created its node
    Created { node: NodeId },
    /// A toggle removed its node
    Removed { node: NodeId },
    /// The document already matched the value
    Unchanged,
    /// No binding for the field
    Unbound,
}

/// Summary of [`Session::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Bound fields whose value was pushed into the form
    pub values_pushed: usize,
    /// Change notifications caused by the push (all suppressed)
    pub suppressed: usize,
    /// Writes that reached the document during the load
    pub writes_applied: usize,
    /// Bindings whose field is not in the form
    pub skipped: usize,
}

/// One open document, the bindings of a form onto it, and the nodes those
/// bindings resolved to.
///
/// Syncing is two-phase: [`Session::load`] pushes document values into the
/// form with the reentrancy guard raised, [`Session::write`] applies one user
/// change to the document. A write never reloads other fields.
#[derive(Debug)]
pub struct Session<T: AttributedTree = Document> {
    tree: T,
    state: BindingState,
    bindings: Vec<FieldBinding>,
    guard: ReentrancyGuard,
}

impl<T: AttributedTree> Session<T> {
    pub fn open(tree: T) -> Self {
        Self {
            tree,
            state: BindingState::new(),
            bindings: Vec::new(),
            guard: ReentrancyGuard::new(),
        }
    }

    pub fn with_bindings(mut self, bindings: impl IntoIterator<Item = FieldBinding>) -> Self {
        self.bindings.extend(bindings);
        self
    }

    /// Add a binding. A later binding for the same field replaces the earlier one.
    pub fn bind(&mut self, binding: FieldBinding) {
        self.bindings.retain(|b| b.field() != binding.field());
        self.bindings.push(binding);
    }

    /// Swap in a new document, forgetting every bound node. Returns the old one.
    pub fn replace_document(&mut self, tree: T) -> T {
        log::debug!("Replacing document, clearing {} bindings", self.state.len());
        self.state.clear();
        std::mem::replace(&mut self.tree, tree)
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn into_tree(self) -> T {
        self.tree
    }

    pub fn state(&self) -> &BindingState {
        &self.state
    }

    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    pub fn binding(&self, field: &str) -> Option<&FieldBinding> {
        self.bindings.iter().find(|b| b.field() == field)
    }

    /// Whether a load is in progress.
    pub fn is_loading(&self) -> bool {
        self.guard.is_active()
    }

    /// Node currently bound to a field's target.
    pub fn bound_node(&self, field: &str) -> Option<NodeId> {
        let target = self.binding(field)?.target();
        self.state.get(&target.key).filter(|n| self.tree.is_attached(*n))
    }

    /// Push document values into the form.
    ///
    /// Bound nodes are resolved but never created. Missing attributes load
    /// the field's default. The notifications produced by the push are
    /// handed to [`Session::write`] while the guard is raised, so none of
    /// them reach the document.
    pub fn load(&mut self, form: &mut Form) -> Result<LoadReport, BindError> {
        let token = self.guard.enter();
        let mut report = LoadReport::default();
        let mut changes = Vec::new();

        for binding in &self.bindings {
            let Some(field) = form.field(binding.field()) else {
                log::debug!("No form field for binding '{}'", binding.field());
                report.skipped += 1;
                continue;
            };
            let value = read_binding(&self.tree, &mut self.state, binding, field);
            if let Some(change) = form.sync(binding.field(), value)? {
                changes.push(change);
            }
            report.values_pushed += 1;
        }

        for change in &changes {
            match self.write(change)? {
                WriteOutcome::Suppressed => report.suppressed += 1,
                _ => report.writes_applied += 1,
            }
        }
        drop(token);

        log::debug!(
            "Loaded {} values ({} notifications suppressed)",
            report.values_pushed,
            report.suppressed
        );
        Ok(report)
    }

    /// Apply one control change to the document.
    pub fn write(&mut self, change: &ValueChanged) -> Result<WriteOutcome, BindError> {
        if self.guard.is_active() {
            log::trace!("Suppressed write of '{}' during load", change.label);
            return Ok(WriteOutcome::Suppressed);
        }
        let Some(binding) = self.bindings.iter().find(|b| b.field() == change.label) else {
            log::debug!("No binding for field '{}'", change.label);
            return Ok(WriteOutcome::Unbound);
        };

        match binding {
            FieldBinding::Attribute {
                field,
                target,
                attribute,
                policy,
            } => {
                let node = match policy {
                    CreatePolicy::CreateIfMissing => {
                        resolve_or_create(&mut self.tree, &mut self.state, target, attribute)?.node()
                    }
                    CreatePolicy::RequireBound => self
                        .state
                        .get(&target.key)
                        .filter(|n| self.tree.is_attached(*n))
                        .ok_or_else(|| BindError::require_bound(field.as_str(), target.tag.as_str()))?,
                };
                let text = change.value.to_attribute().unwrap_or_default();
                if self.tree.attribute(node, attribute) == Some(text.as_str()) {
                    return Ok(WriteOutcome::Unchanged);
                }
                self.tree.set_attribute(node, attribute, &text)?;
                log::debug!("Wrote {}@{}={:?}", target.tag, attribute, text);
                Ok(WriteOutcome::Applied { node })
            }
            FieldBinding::Toggle {
                field,
                target,
                presets,
                matches,
            } => {
                let on = change
                    .value
                    .as_bool()
                    .ok_or_else(|| ControlError::kind_mismatch(field.as_str(), "bool", change.value.kind_name()))?;
                if on {
                    toggle_on(&mut self.tree, &mut self.state, target, presets, matches)
                } else {
                    toggle_off(&mut self.tree, &mut self.state, target, matches)
                }
            }
        }
    }
}

/// Current document value of a binding, as a value for `field`'s control.
fn read_binding<T: AttributedTree>(
    tree: &T,
    state: &mut BindingState,
    binding: &FieldBinding,
    field: &FieldDescriptor,
) -> FieldValue {
    match binding {
        FieldBinding::Attribute {
            target,
            attribute,
            policy,
            ..
        } => {
            let node = match policy {
                CreatePolicy::CreateIfMissing => resolve(tree, state, target, attribute).map(|r| r.node()),
                CreatePolicy::RequireBound => state.get(&target.key).filter(|n| tree.is_attached(*n)),
            };
            let raw = node.and_then(|n| tree.attribute(n, attribute));
            match raw {
                Some(raw) => coerce_attribute(field, raw),
                None => field.default_value().clone(),
            }
        }
        FieldBinding::Toggle { target, matches, .. } => {
            let found = find_toggle_node(tree, state, target, matches);
            match found {
                Some(node) => state.bind(&target.key, node),
                None => {
                    state.unbind(&target.key);
                }
            }
            FieldValue::Bool(found.is_some())
        }
    }
}

/// Turn an attribute string into a value the field's control accepts,
/// falling back to the field default.
fn coerce_attribute(field: &FieldDescriptor, raw: &str) -> FieldValue {
    let value = match field.control().kind() {
        ControlKind::TextArea(_) => Some(FieldValue::text(raw)),
        ControlKind::Selector(s) => s.options.iter().any(|o| o == raw).then(|| FieldValue::text(raw)),
        ControlKind::Toggle(_) => match raw.trim() {
            v if v.eq_ignore_ascii_case("true") => Some(FieldValue::Bool(true)),
            v if v.eq_ignore_ascii_case("false") => Some(FieldValue::Bool(false)),
            _ => None,
        },
        ControlKind::Stepper(s) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|v| s.accepts(*v))
            .map(FieldValue::Int),
        ControlKind::Thumbnail(_) => Some(FieldValue::None),
    };
    value.unwrap_or_else(|| {
        log::warn!(
            "Attribute value {:?} does not fit field '{}', using its default",
            raw,
            field.name()
        );
        field.default_value().clone()
    })
}

fn has_attributes<T: AttributedTree>(tree: &T, node: NodeId, attributes: &[(String, String)]) -> bool {
    attributes
        .iter()
        .all(|(name, value)| tree.attribute(node, name) == Some(value.as_str()))
}

/// Node standing for a toggle: the bound one if it still matches, else the
/// first node with the tag carrying every matched attribute.
fn find_toggle_node<T: AttributedTree>(
    tree: &T,
    state: &BindingState,
    target: &Target,
    matches: &[(String, String)],
) -> Option<NodeId> {
    state
        .get(&target.key)
        .filter(|n| tree.is_attached(*n) && has_attributes(tree, *n, matches))
        .or_else(|| {
            tree.nodes_by_tag(&target.tag)
                .into_iter()
                .find(|n| has_attributes(tree, *n, matches))
        })
}

fn toggle_on<T: AttributedTree>(
    tree: &mut T,
    state: &mut BindingState,
    target: &Target,
    presets: &[(String, String)],
    matches: &[(String, String)],
) -> Result<WriteOutcome, BindError> {
    if let Some(node) = find_toggle_node(tree, state, target, matches) {
        state.bind(&target.key, node);
        return Ok(WriteOutcome::Unchanged);
    }

    let existing = container_node(tree, target, false)?;
    let parent = match existing {
        Some(parent) => parent,
        None => {
            let parent = container_node(tree, target, true)?.unwrap_or_else(|| tree.root());
            state.mark_created_container(parent);
            parent
        }
    };
    let node = tree.create_child(parent, &target.tag)?;
    for (name, value) in presets {
        tree.set_attribute(node, name, value)?;
    }
    state.bind(&target.key, node);
    log::debug!("Toggle '{}' created <{}>", target.key, target.tag);
    Ok(WriteOutcome::Created { node })
}

/// Remove a toggle's node, and its container once empty if the session
/// created that container.
fn toggle_off<T: AttributedTree>(
    tree: &mut T,
    state: &mut BindingState,
    target: &Target,
    matches: &[(String, String)],
) -> Result<WriteOutcome, BindError> {
    let Some(node) = find_toggle_node(tree, state, target, matches) else {
        state.unbind(&target.key);
        return Ok(WriteOutcome::Unchanged);
    };

    if let Some(parent) = tree.parent(node) {
        tree.remove_child(parent, node)?;
        if tree.child_count(parent) == 0 && state.take_created_container(parent) {
            if let Some(outer) = tree.parent(parent) {
                tree.remove_child(outer, parent)?;
                log::debug!(
                    "Removed empty <{}> added for '{}'",
                    target.container.as_deref().unwrap_or_default(),
                    target.key
                );
            }
        }
    }
    state.unbind(&target.key);
    log::debug!("Toggle '{}' removed <{}>", target.key, target.tag);
    Ok(WriteOutcome::Removed { node })
}
