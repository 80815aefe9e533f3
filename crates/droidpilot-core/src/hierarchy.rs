//! Parsed UI hierarchy tree.
//!
//! A uiautomator dump is strict XML: a `hierarchy` root holding nested
//! `node` elements whose attributes carry the interesting data (`text`,
//! `resource-id`, `class`, `package`, `bounds`, ...). [`Hierarchy::parse`]
//! reads it with `roxmltree` and copies the element structure into an
//! arena of [`Node`]s. Parent and child links are arena indices, so a node
//! can walk up to its parent without owning it, and every node lives
//! exactly as long as the tree that created it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::Result;

/// Index of a node within its [`Hierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

/// A single element of the hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// The element name (`hierarchy` or `node` in uiautomator dumps).
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Decode this node's `bounds` attribute; see [`Bounds::from_attr`].
    pub fn bounds(&self) -> Result<Bounds> {
        Bounds::from_attr(self.attr("bounds"))
    }
}

/// An immutable, arena-backed element tree.
///
/// Nodes are stored in document order (depth-first, pre-order), so
/// iterating [`Hierarchy::nodes`] visits them in the order a selector
/// reports matches.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    nodes: Vec<Node>,
}

impl Hierarchy {
    /// Parse dump text into a tree.
    ///
    /// # Errors
    ///
    /// [`Parse`](crate::error::AutomatorError::Parse) if the text is not well-formed XML.
    pub fn parse(text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text)?;
        let mut nodes = Vec::new();
        copy_element(doc.root_element(), None, &mut nodes);
        Ok(Self { nodes })
    }

    /// The document element.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Panics if `id` did not come from this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in document order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Iterates from `id`'s parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |p| self.node(*p).parent)
    }

    /// Foreground package: the `package` attribute of the first `node`
    /// directly under the `hierarchy` root.
    pub fn package(&self) -> Option<&str> {
        let root = self.nodes.first()?;
        if root.tag != "hierarchy" {
            return None;
        }
        root.children
            .iter()
            .map(|id| self.node(*id))
            .find(|n| n.tag == "node")
            .and_then(|n| n.attr("package"))
    }
}

fn copy_element(element: roxmltree::Node<'_, '_>, parent: Option<NodeId>, nodes: &mut Vec<Node>) {
    let id = NodeId(nodes.len());
    nodes.push(Node {
        tag: element.tag_name().name().to_string(),
        attributes: element
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect(),
        parent,
        children: Vec::new(),
    });
    if let Some(parent) = parent {
        nodes[parent.0].children.push(id);
    }
    for child in element.children().filter(|c| c.is_element()) {
        copy_element(child, Some(id), nodes);
    }
}

/// Owned view of a matched node, detached from its tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    /// Number of ancestors between this node and the root.
    pub depth: usize,
}

impl NodeSummary {
    pub fn from_tree(tree: &Hierarchy, id: NodeId) -> Self {
        let node = tree.node(id);
        Self {
            tag: node.tag.clone(),
            attributes: node.attributes.clone(),
            depth: tree.ancestors(id).count(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn bounds(&self) -> Result<Bounds> {
        Bounds::from_attr(self.attr("bounds"))
    }
}
