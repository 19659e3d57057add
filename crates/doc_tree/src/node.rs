//! Node identity and node kinds

use std::collections::BTreeMap;
use std::fmt;

/// Index of a node inside a [`DocTree`](crate::DocTree) arena.
///
/// Ids are plain arena indices: stable for the lifetime of the tree.
/// Removing a node detaches it but never invalidates other ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Get the raw arena index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two node kinds the anchoring core distinguishes
#[derive(Debug, Clone)]
pub enum NodeKind {
    Element {
        /// Lowercased tag name
        tag: String,
        /// Attribute map (class, annotation tags, ...)
        attrs: BTreeMap<String, String>,
        /// Child nodes in document order
        children: Vec<NodeId>,
    },
    Text {
        /// Character data of the node
        content: String,
    },
}

/// Arena slot: a node's kind plus its parent link
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}
