//! Bindings between form fields and document nodes.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::document::NodeId;

use super::error::BindError;

/// Name of a logical binding target ("the Experimenter node").
///
/// Fields bound to the same key share one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey(String);

impl TargetKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a bound node lives and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub key: TargetKey,
    /// Tag of the bound node
    pub tag: String,
    /// Tag of the element new nodes are created under (`None` = document root)
    pub container: Option<String>,
}

impl Target {
    /// A target directly under the document root, keyed by its tag.
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            key: TargetKey::new(tag.clone()),
            tag,
            container: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = TargetKey::new(key);
        self
    }

    pub fn in_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }
}

/// What to do when a write finds no node for its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreatePolicy {
    /// Create the node under the target's container
    #[default]
    CreateIfMissing,
    /// Fail unless another binding already bound the target
    RequireBound,
}

/// How one form field maps onto the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldBinding {
    /// The field mirrors one attribute of the target node.
    Attribute {
        field: String,
        target: Target,
        attribute: String,
        policy: CreatePolicy,
    },
    /// A boolean field whose `true` state is the presence of a node carrying
    /// the `matches` attributes. Turning it on creates a node with `presets`.
    Toggle {
        field: String,
        target: Target,
        presets: Vec<(String, String)>,
        matches: Vec<(String, String)>,
    },
}

impl FieldBinding {
    pub fn attribute(field: impl Into<String>, target: Target, attribute: impl Into<String>) -> Self {
        FieldBinding::Attribute {
            field: field.into(),
            target,
            attribute: attribute.into(),
            policy: CreatePolicy::CreateIfMissing,
        }
    }

    /// A toggle recognising its node by every preset.
    pub fn toggle<K, V>(field: impl Into<String>, target: Target, presets: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let presets = owned_pairs(presets);
        FieldBinding::Toggle {
            field: field.into(),
            target,
            matches: presets.clone(),
            presets,
        }
    }

    /// Recognise a toggle's node by these attributes only.
    pub fn matching<K, V>(mut self, attributes: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if let FieldBinding::Toggle { matches, .. } = &mut self {
            *matches = owned_pairs(attributes);
        }
        self
    }

    /// Change the create policy of an attribute binding.
    pub fn with_policy(mut self, new_policy: CreatePolicy) -> Self {
        if let FieldBinding::Attribute { policy, .. } = &mut self {
            *policy = new_policy;
        }
        self
    }

    /// Resolve this binding's node apart from other bindings on the same tag.
    pub fn with_target_key(mut self, key: impl Into<String>) -> Self {
        match &mut self {
            FieldBinding::Attribute { target, .. } | FieldBinding::Toggle { target, .. } => {
                target.key = TargetKey::new(key);
            }
        }
        self
    }

    /// Build an attribute binding from a template `valueMap`.
    ///
    /// Accepts `Tag:Attribute` (node under the root) and
    /// `Container/Tag:Attribute`. The target key is the part before `:`.
    pub fn from_value_map(field: impl Into<String>, value_map: &str) -> Result<Self, BindError> {
        let invalid = || BindError::InvalidValueMap(value_map.to_string());

        let (path, attribute) = value_map.trim().split_once(':').ok_or_else(invalid)?;
        let (container, tag) = match path.split_once('/') {
            Some((container, tag)) => (Some(container.trim()), tag.trim()),
            None => (None, path.trim()),
        };
        let attribute = attribute.trim();
        if tag.is_empty() || attribute.is_empty() || container.is_some_and(str::is_empty) {
            return Err(invalid());
        }

        let mut target = Target::new(tag).with_key(path.trim());
        if let Some(container) = container {
            target = target.in_container(container);
        }
        Ok(Self::attribute(field, target, attribute))
    }

    /// Name of the bound form field.
    pub fn field(&self) -> &str {
        match self {
            FieldBinding::Attribute { field, .. } | FieldBinding::Toggle { field, .. } => field,
        }
    }

    pub fn target(&self) -> &Target {
        match self {
            FieldBinding::Attribute { target, .. } | FieldBinding::Toggle { target, .. } => target,
        }
    }
}

fn owned_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect()
}

/// Bound node per target for the open document, plus the containers the
/// session added to it.
#[derive(Debug, Clone, Default)]
pub struct BindingState {
    bound: HashMap<TargetKey, NodeId>,
    created_containers: HashSet<NodeId>,
}

impl BindingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &TargetKey) -> Option<NodeId> {
        self.bound.get(key).copied()
    }

    pub fn bind(&mut self, key: &TargetKey, node: NodeId) {
        if self.bound.insert(key.clone(), node) != Some(node) {
            log::trace!("Bound target '{}' to {:?}", key, node);
        }
    }

    pub fn unbind(&mut self, key: &TargetKey) -> Option<NodeId> {
        self.bound.remove(key)
    }

    /// Remember a container element created by the session.
    pub fn mark_created_container(&mut self, node: NodeId) {
        self.created_containers.insert(node);
    }

    /// Forget a created container. Returns whether it was one.
    pub fn take_created_container(&mut self, node: NodeId) -> bool {
        self.created_containers.remove(&node)
    }

    /// Forget every binding and created container.
    pub fn clear(&mut self) {
        self.bound.clear();
        self.created_containers.clear();
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_map_root_target() {
        let binding = FieldBinding::from_value_map("Project Name", "Project:Name").unwrap();
        assert_eq!(
            binding,
            FieldBinding::Attribute {
                field: "Project Name".into(),
                target: Target::new("Project"),
                attribute: "Name".into(),
                policy: CreatePolicy::CreateIfMissing,
            }
        );
    }

    #[test]
    fn test_value_map_container_target() {
        let binding = FieldBinding::from_value_map("Gain", "CustomAttributes/Detector:Gain").unwrap();
        let target = binding.target();
        assert_eq!(target.key.as_str(), "CustomAttributes/Detector");
        assert_eq!(target.tag, "Detector");
        assert_eq!(target.container.as_deref(), Some("CustomAttributes"));
    }

    #[test]
    fn test_target_key_override() {
        let binding = FieldBinding::from_value_map("Description", "Experiment:Description")
            .unwrap()
            .with_target_key("experiment description");
        let target = binding.target();
        assert_eq!(target.key.as_str(), "experiment description");
        assert_eq!(target.tag, "Experiment");
    }

    #[test]
    fn test_value_map_rejects_malformed() {
        for bad in ["Project", "Project:", ":Name", "/Detector:Gain", ""] {
            assert!(
                matches!(
                    FieldBinding::from_value_map("x", bad),
                    Err(BindError::InvalidValueMap(_))
                ),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_policy_only_changes_attribute_bindings() {
        let toggle = FieldBinding::toggle("PMT", Target::new("Detector"), &[("Type", "PMT")]);
        assert_eq!(toggle.clone().with_policy(CreatePolicy::RequireBound), toggle);

        let gain = FieldBinding::attribute("Gain", Target::new("Detector"), "Gain")
            .with_policy(CreatePolicy::RequireBound);
        assert!(matches!(
            gain,
            FieldBinding::Attribute { policy: CreatePolicy::RequireBound, .. }
        ));
    }

    #[test]
    fn test_toggle_match_set() {
        let presets = [("Manufacturer", "Hamamatsu"), ("Type", "PMT")];
        let toggle = FieldBinding::toggle("PMT", Target::new("Detector"), &presets);
        let FieldBinding::Toggle { matches, .. } = &toggle else {
            panic!("expected a toggle");
        };
        assert_eq!(matches.len(), 2);

        let toggle = toggle.matching(&[("Type", "PMT")]);
        let FieldBinding::Toggle { presets, matches, .. } = &toggle else {
            panic!("expected a toggle");
        };
        assert_eq!(presets.len(), 2);
        assert_eq!(matches, &vec![("Type".to_string(), "PMT".to_string())]);
    }

    #[test]
    fn test_binding_state() {
        let mut state = BindingState::new();
        let key = TargetKey::new("experimenter");
        assert_eq!(state.get(&key), None);

        state.bind(&key, NodeId::from_index(3));
        assert_eq!(state.get(&key), Some(NodeId::from_index(3)));
        assert_eq!(state.len(), 1);

        state.mark_created_container(NodeId::from_index(1));
        assert!(state.take_created_container(NodeId::from_index(1)));
        assert!(!state.take_created_container(NodeId::from_index(1)));

        state.mark_created_container(NodeId::from_index(2));
        state.clear();
        assert!(state.is_empty());
        assert!(!state.take_created_container(NodeId::from_index(2)));
    }
}
