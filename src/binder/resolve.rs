//! Node resolution for binding targets.

use crate::document::{AttributedTree, NodeId};

use super::binding::{BindingState, Target};
use super::error::BindError;

/// How a target's node was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// First node carrying the attribute
    Found(NodeId),
    /// The node already bound to the target
    Bound(NodeId),
    /// First node with the tag (the attribute is not set yet)
    First(NodeId),
    /// A new node under the target's container
    Created(NodeId),
}

impl Resolution {
    pub fn node(&self) -> NodeId {
        match *self {
            Resolution::Found(n) | Resolution::Bound(n) | Resolution::First(n) | Resolution::Created(n) => n,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Resolution::Created(_))
    }
}

/// Find the node for `target` without creating anything, and record it.
///
/// First match wins: the first node (document order) with the tag that
/// carries `attribute` is used, unless a different node is already bound, in
/// which case the bound node is kept. Without any carrier the bound node or
/// else the first node with the tag is used. A bound node that has been
/// removed from the tree is forgotten first.
pub fn resolve<T>(tree: &T, state: &mut BindingState, target: &Target, attribute: &str) -> Option<Resolution>
where
    T: AttributedTree + ?Sized,
{
    let mut bound = state.get(&target.key);
    if let Some(node) = bound.filter(|n| !tree.is_attached(*n)) {
        log::debug!("Dropping stale binding of '{}' to {:?}", target.key, node);
        state.unbind(&target.key);
        bound = None;
    }

    let candidates = tree.nodes_by_tag(&target.tag);

    let resolution = candidates
        .iter()
        .copied()
        .find(|n| tree.has_attribute(*n, attribute) && bound.map_or(true, |b| b == *n))
        .map(Resolution::Found)
        .or_else(|| {
            bound
                .filter(|b| candidates.contains(b))
                .map(Resolution::Bound)
        })
        .or_else(|| candidates.first().copied().map(Resolution::First))?;

    state.bind(&target.key, resolution.node());
    Some(resolution)
}

/// The element new nodes for `target` are created under.
///
/// With `create` set, a missing container is added under the root.
pub fn container_node<T>(tree: &mut T, target: &Target, create: bool) -> Result<Option<NodeId>, BindError>
where
    T: AttributedTree + ?Sized,
{
    let Some(container) = target.container.as_deref() else {
        return Ok(Some(tree.root()));
    };
    if let Some(node) = tree.nodes_by_tag(container).first() {
        return Ok(Some(*node));
    }
    if !create {
        return Ok(None);
    }
    let root = tree.root();
    Ok(Some(tree.create_child(root, container)?))
}

/// [`resolve`], creating the node under the target's container when the
/// document has none.
pub fn resolve_or_create<T>(
    tree: &mut T,
    state: &mut BindingState,
    target: &Target,
    attribute: &str,
) -> Result<Resolution, BindError>
where
    T: AttributedTree + ?Sized,
{
    if let Some(resolution) = resolve(tree, state, target, attribute) {
        return Ok(resolution);
    }

    let parent = container_node(tree, target, true)?.unwrap_or_else(|| tree.root());
    let node = tree.create_child(parent, &target.tag)?;
    state.bind(&target.key, node);
    log::debug!("Created <{}> for target '{}'", target.tag, target.key);
    Ok(Resolution::Created(node))
}
