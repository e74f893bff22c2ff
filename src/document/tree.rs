//! Arena-backed attributed tree.

use super::error::DocumentError;

/// Handle to a node of a [`Document`].
///
/// Ids stay valid after the node is removed from the tree; operations on a
/// removed node report [`DocumentError::Detached`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn from_index(index: usize) -> Self {
        NodeId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Capabilities the binder needs from an attributed tree.
///
/// Node lists are always in document order (pre-order, parents before
/// children, siblings left to right).
pub trait AttributedTree {
    /// The document element.
    fn root(&self) -> NodeId;

    /// Tag name of a node.
    fn tag(&self, node: NodeId) -> Option<&str>;

    /// All attached nodes with the given tag, in document order.
    fn nodes_by_tag(&self, tag: &str) -> Vec<NodeId>;

    /// Value of an attribute.
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Set (or add) an attribute.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DocumentError>;

    /// Append a new empty element under `parent`.
    fn create_child(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DocumentError>;

    /// Detach `child` (and its subtree) from `parent`.
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError>;

    /// Parent of a node, `None` for the root and for removed nodes.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Number of child elements.
    fn child_count(&self, node: NodeId) -> usize;

    /// Whether the node is still reachable from the root.
    fn is_attached(&self, node: NodeId) -> bool;
}

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    text: String,
}

impl NodeData {
    fn new(tag: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            parent,
            text: String::new(),
        }
    }
}

/// An XML-like document: elements with ordered attributes, ordered children
/// and character data.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

/// Tag names match exactly, or by local name when the query has no prefix
/// (`Project` matches `ome:Project`).
fn tag_matches(tag: &str, query: &str) -> bool {
    if tag == query {
        return true;
    }
    !query.contains(':') && tag.rsplit(':').next() == Some(query)
}

fn check_name(name: &str) -> Result<(), DocumentError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));
    if valid {
        Ok(())
    } else {
        Err(DocumentError::InvalidName(name.to_string()))
    }
}

impl Document {
    /// Create a document holding only a root element.
    pub fn new(root_tag: &str) -> Result<Self, DocumentError> {
        check_name(root_tag)?;
        Ok(Self {
            nodes: vec![NodeData::new(root_tag, None)],
            root: NodeId(0),
        })
    }

    fn data(&self, node: NodeId) -> Result<&NodeData, DocumentError> {
        self.nodes.get(node.0).ok_or(DocumentError::UnknownNode(node))
    }

    fn data_mut(&mut self, node: NodeId) -> Result<&mut NodeData, DocumentError> {
        self.nodes
            .get_mut(node.0)
            .ok_or(DocumentError::UnknownNode(node))
    }

    fn attached(&self, node: NodeId) -> Result<&NodeData, DocumentError> {
        if !self.is_attached(node) {
            return Err(DocumentError::Detached(node));
        }
        self.data(node)
    }

    /// Children of a node, in order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Attributes of a node, in document order.
    pub fn attributes(&self, node: NodeId) -> &[(String, String)] {
        self.nodes
            .get(node.0)
            .map(|n| n.attributes.as_slice())
            .unwrap_or(&[])
    }

    /// Character data of a node (empty when it has none).
    pub fn text(&self, node: NodeId) -> &str {
        self.nodes.get(node.0).map(|n| n.text.as_str()).unwrap_or("")
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DocumentError> {
        self.data_mut(node)?.text = text.to_string();
        Ok(())
    }

    /// First attached child of `parent` with the given tag.
    pub fn child_by_tag(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.nodes.get(c.0).is_some_and(|n| tag_matches(&n.tag, tag)))
    }

    /// Attached nodes in document order, with their depth below the root.
    pub fn walk(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![(self.root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            out.push((node, depth));
            for child in self.children(node).iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }

    /// Number of attached nodes.
    pub fn node_count(&self) -> usize {
        self.walk().len()
    }

    pub(super) fn push_node(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::new(tag, Some(parent)));
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    pub(super) fn push_attribute(&mut self, node: NodeId, name: String, value: String) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.attributes.push((name, value));
        }
    }

    pub(super) fn append_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.text.push_str(text);
        }
    }
}

impl AttributedTree for Document {
    fn root(&self) -> NodeId {
        self.root
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.tag.as_str())
    }

    fn nodes_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .map(|(node, _)| node)
            .filter(|node| tag_matches(&self.nodes[node.0].tag, tag))
            .collect()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0)?
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DocumentError> {
        check_name(name)?;
        self.attached(node)?;
        let data = self.data_mut(node)?;
        match data.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => data.attributes.push((name.to_string(), value.to_string())),
        }
        log::trace!("Set {}@{}={:?} on {:?}", data.tag, name, value, node);
        Ok(())
    }

    fn create_child(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DocumentError> {
        check_name(tag)?;
        self.attached(parent)?;
        let id = self.push_node(parent, tag);
        log::debug!("Created <{}> {:?} under {:?}", tag, id, parent);
        Ok(id)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        self.attached(parent)?;
        self.data(child)?;
        let data = self.data_mut(parent)?;
        let Some(pos) = data.children.iter().position(|c| *c == child) else {
            return Err(DocumentError::NotAChild { parent, child });
        };
        data.children.remove(pos);
        self.data_mut(child)?.parent = None;
        log::debug!("Removed {:?} from {:?}", child, parent);
        Ok(())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.nodes.get(node.0).map_or(0, |n| n.children.len())
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes.get(current.0).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }
}
