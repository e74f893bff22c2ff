//! Read-only metadata viewer: element outline plus an attribute table for
//! the selected node.

use std::fmt::Write as _;

use crate::document::{AttributedTree, Document, NodeId};

/// A parsed document, or the raw text when it could not be parsed.
#[derive(Debug, Clone)]
pub enum MetadataView {
    Tree(Document),
    Raw { xml: String, reason: String },
}

/// One line of the element outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub node: NodeId,
    pub depth: usize,
    pub tag: String,
}

/// Side-panel contents for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDetails {
    pub tag: String,
    /// Character data, empty when the node has none
    pub cdata: String,
    /// (Attribute, Value) rows in document order
    pub attributes: Vec<(String, String)>,
}

impl MetadataView {
    /// Parse metadata text. A parse failure yields [`MetadataView::Raw`].
    pub fn from_xml(xml: &str) -> Self {
        match Document::parse(xml) {
            Ok(doc) => MetadataView::Tree(doc),
            Err(e) => {
                log::warn!("Metadata parsing failed, showing raw text: {}", e);
                MetadataView::Raw {
                    xml: xml.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn document(&self) -> Option<&Document> {
        match self {
            MetadataView::Tree(doc) => Some(doc),
            MetadataView::Raw { .. } => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, MetadataView::Raw { .. })
    }

    /// Every element in document order, fully expanded.
    pub fn outline(&self) -> Vec<OutlineEntry> {
        let Some(doc) = self.document() else {
            return Vec::new();
        };
        doc.walk()
            .into_iter()
            .map(|(node, depth)| OutlineEntry {
                node,
                depth,
                tag: doc.tag(node).unwrap_or_default().to_string(),
            })
            .collect()
    }

    pub fn inspect(&self, node: NodeId) -> Option<NodeDetails> {
        let doc = self.document()?;
        if !doc.is_attached(node) {
            return None;
        }
        Some(NodeDetails {
            tag: doc.tag(node)?.to_string(),
            cdata: doc.text(node).to_string(),
            attributes: doc.attributes(node).to_vec(),
        })
    }

    /// Indented tag outline, or the raw text with the failure reason.
    pub fn render_outline(&self) -> String {
        match self {
            MetadataView::Raw { xml, reason } => {
                format!("Metadata parsing failed ({}), here is the raw info:\n{}", reason, xml)
            }
            MetadataView::Tree(_) => {
                let mut out = String::new();
                for entry in self.outline() {
                    let _ = writeln!(out, "{}{}", "  ".repeat(entry.depth), entry.tag);
                }
                out
            }
        }
    }
}

/// Text table of a node's character data and attributes.
pub fn render_details(details: &NodeDetails) -> String {
    let width = details
        .attributes
        .iter()
        .map(|(k, _)| k.len())
        .chain(std::iter::once("Attribute".len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "<{}>", details.tag);
    if !details.cdata.is_empty() {
        let _ = writeln!(out, "CDATA: {}", details.cdata);
    }
    let _ = writeln!(out, "{:<width$}  Value", "Attribute");
    for (name, value) in &details.attributes {
        let _ = writeln!(out, "{:<width$}  {}", name, value);
    }
    out
}
