//! Document tree operations and storage

use std::collections::BTreeMap;

use crate::{NodeData, NodeId, NodeKind, Result, TreeError};

/// The document tree arena
///
/// Nodes are stored in a flat vector and addressed by [`NodeId`]. The
/// root element is created by [`DocTree::new`] and never detached.
#[derive(Debug, Clone)]
pub struct DocTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl DocTree {
    /// Create a tree with a single root element
    pub fn new(root_tag: &str) -> Self {
        let root_data = NodeData {
            parent: None,
            kind: NodeKind::Element {
                tag: root_tag.to_ascii_lowercase(),
                attrs: BTreeMap::new(),
                children: Vec::new(),
            },
        };
        Self {
            nodes: vec![root_data],
            root: NodeId(0),
        }
    }

    /// Get the root element id
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever created, detached ones included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether an id refers to a node in this arena
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    fn data(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes.get(id.0).ok_or(TreeError::NodeNotFound(id))
    }

    fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.nodes.get_mut(id.0).ok_or(TreeError::NodeNotFound(id))
    }

    /// Get the kind of a node
    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        Ok(&self.data(id)?.kind)
    }

    /// Get a node's parent, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|d| d.parent)
    }

    /// Check whether a node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Ok(NodeKind::Element { .. }))
    }

    /// Check whether a node is a text node
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Ok(NodeKind::Text { .. }))
    }

    /// Get an element's tag name
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Ok(NodeKind::Element { tag, .. }) => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Get a text node's character data
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Ok(NodeKind::Text { content }) => Some(content.as_str()),
            _ => None,
        }
    }

    /// Get an element's children; empty for text nodes and unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            Ok(NodeKind::Element { children, .. }) => children,
            _ => &[],
        }
    }

    /// Get an attribute value on an element
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id) {
            Ok(NodeKind::Element { attrs, .. }) => attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Set an attribute on an element
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Element { attrs, .. } => {
                attrs.insert(name.to_string(), value.to_string());
                Ok(())
            }
            NodeKind::Text { .. } => Err(TreeError::NotAnElement(id)),
        }
    }

    /// Create a detached element node
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent: None,
            kind: NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: BTreeMap::new(),
                children: Vec::new(),
            },
        });
        id
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent: None,
            kind: NodeKind::Text {
                content: content.into(),
            },
        });
        id
    }

    /// Append a detached node as the last child of an element
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Insert a detached node at a child index of an element
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        if self.data(child)?.parent.is_some() {
            return Err(TreeError::Structure(format!(
                "node {child} already has a parent"
            )));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(TreeError::Structure(format!(
                "inserting {child} under {parent} would create a cycle"
            )));
        }
        match &mut self.data_mut(parent)?.kind {
            NodeKind::Element { children, .. } => {
                if index > children.len() {
                    let len = children.len();
                    return Err(TreeError::InvalidOffset {
                        node: parent,
                        offset: index,
                        len,
                    });
                }
                children.insert(index, child);
            }
            NodeKind::Text { .. } => return Err(TreeError::NotAnElement(parent)),
        }
        self.data_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Create and append an element in one step
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId> {
        let id = self.create_element(tag);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Create and append a text node in one step
    pub fn append_text(&mut self, parent: NodeId, content: impl Into<String>) -> Result<NodeId> {
        let id = self.create_text(content);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Detach a node from its parent; the subtree below it stays intact
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let parent = self
            .data(id)?
            .parent
            .ok_or(TreeError::DetachedNode(id))?;
        if let NodeKind::Element { children, .. } = &mut self.data_mut(parent)?.kind {
            children.retain(|&c| c != id);
        }
        self.data_mut(id)?.parent = None;
        Ok(())
    }

    /// Index of a node within its parent's child list
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Check whether `ancestor` is a proper ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = self.parent(node);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Check whether `ancestor` is `node` or a proper ancestor of it
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.is_ancestor(ancestor, node)
    }

    /// Concatenated text of all descendant text nodes, in document order
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Ok(NodeKind::Text { content }) => out.push_str(content),
            Ok(NodeKind::Element { children, .. }) => {
                for &child in children {
                    self.collect_text(child, out);
                }
            }
            Err(_) => {}
        }
    }

    /// Total text length of a subtree, counted in chars
    pub fn text_len(&self, id: NodeId) -> usize {
        match self.kind(id) {
            Ok(NodeKind::Text { content }) => content.chars().count(),
            Ok(NodeKind::Element { children, .. }) => {
                children.iter().map(|&c| self.text_len(c)).sum()
            }
            Err(_) => 0,
        }
    }

    /// All text nodes under a subtree, in document order.
    /// A text node id passed in is returned as its own singleton walk.
    pub fn text_nodes_in(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_text_nodes(id, &mut out);
        out
    }

    fn collect_text_nodes(&self, id: NodeId, out: &mut Vec<NodeId>) {
        match self.kind(id) {
            Ok(NodeKind::Text { .. }) => out.push(id),
            Ok(NodeKind::Element { children, .. }) => {
                for &child in children {
                    self.collect_text_nodes(child, out);
                }
            }
            Err(_) => {}
        }
    }

    fn first_text_in(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id).ok()? {
            NodeKind::Text { .. } => Some(id),
            NodeKind::Element { children, .. } => {
                children.iter().find_map(|&c| self.first_text_in(c))
            }
        }
    }

    fn last_text_in(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id).ok()? {
            NodeKind::Text { .. } => Some(id),
            NodeKind::Element { children, .. } => {
                children.iter().rev().find_map(|&c| self.last_text_in(c))
            }
        }
    }

    /// First text node strictly after `from`'s subtree, in document order
    pub fn next_text_node(&self, from: NodeId) -> Option<NodeId> {
        let mut node = from;
        loop {
            let parent = self.parent(node)?;
            let siblings = self.children(parent);
            let idx = siblings.iter().position(|&c| c == node)?;
            for &sibling in &siblings[idx + 1..] {
                if let Some(text) = self.first_text_in(sibling) {
                    return Some(text);
                }
            }
            node = parent;
        }
    }

    /// Last text node strictly before `from`'s subtree, in document order
    pub fn previous_text_node(&self, from: NodeId) -> Option<NodeId> {
        let mut node = from;
        loop {
            let parent = self.parent(node)?;
            let siblings = self.children(parent);
            let idx = siblings.iter().position(|&c| c == node)?;
            for &sibling in siblings[..idx].iter().rev() {
                if let Some(text) = self.last_text_in(sibling) {
                    return Some(text);
                }
            }
            node = parent;
        }
    }

    /// Split a text node at a char offset.
    ///
    /// The node keeps the head, a new sibling inserted directly after it
    /// receives the tail. Returns the new node's id.
    pub fn split_text(&mut self, id: NodeId, char_offset: usize) -> Result<NodeId> {
        let parent = self
            .data(id)?
            .parent
            .ok_or(TreeError::DetachedNode(id))?;
        let tail = match &mut self.data_mut(id)?.kind {
            NodeKind::Text { content } => {
                let byte = match content.char_indices().nth(char_offset) {
                    Some((byte, _)) => byte,
                    None if char_offset == content.chars().count() => content.len(),
                    None => {
                        let len = content.chars().count();
                        return Err(TreeError::InvalidOffset {
                            node: id,
                            offset: char_offset,
                            len,
                        });
                    }
                };
                content.split_off(byte)
            }
            NodeKind::Element { .. } => return Err(TreeError::NotAText(id)),
        };
        let new = self.create_text(tail);
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == id)
            .ok_or(TreeError::Structure(format!(
                "node {id} missing from parent {parent}"
            )))?;
        self.insert_child(parent, index + 1, new)?;
        Ok(new)
    }

    /// Put `wrapper` at `node`'s position and move `node` inside it.
    /// `wrapper` must be a detached, childless element.
    pub fn wrap_node(&mut self, node: NodeId, wrapper: NodeId) -> Result<()> {
        match self.kind(wrapper)? {
            NodeKind::Element { children, .. } if children.is_empty() => {}
            NodeKind::Element { .. } => {
                return Err(TreeError::Structure(format!(
                    "wrapper {wrapper} already has children"
                )))
            }
            NodeKind::Text { .. } => return Err(TreeError::NotAnElement(wrapper)),
        }
        let parent = self
            .data(node)?
            .parent
            .ok_or(TreeError::DetachedNode(node))?;
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == node)
            .ok_or(TreeError::Structure(format!(
                "node {node} missing from parent {parent}"
            )))?;
        self.remove_node(node)?;
        self.insert_child(parent, index, wrapper)?;
        self.append_child(wrapper, node)?;
        Ok(())
    }

    /// Replace an element with its children, preserving their order.
    /// Returns the ids of the reinserted children.
    pub fn unwrap_node(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let parent = self
            .data(id)?
            .parent
            .ok_or(TreeError::DetachedNode(id))?;
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == id)
            .ok_or(TreeError::Structure(format!(
                "node {id} missing from parent {parent}"
            )))?;
        let moved: Vec<NodeId> = self.children(id).to_vec();
        for &child in &moved {
            self.remove_node(child)?;
        }
        self.remove_node(id)?;
        for (i, &child) in moved.iter().enumerate() {
            self.insert_child(parent, index + i, child)?;
        }
        Ok(moved)
    }
}
