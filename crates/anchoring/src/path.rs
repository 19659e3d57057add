//! Structural path codec
//!
//! Serializes the location of a node relative to a root element as a
//! chain of `/tag[n]` segments, where `n` is the 1-based index among
//! siblings carrying the same tag. Text nodes use the reserved token
//! `text()`. Tag comparison on resolution is case-insensitive.

use doc_tree::{DocTree, NodeId, NodeKind};

use crate::{AnchorError, Result};

/// Reserved segment token for text nodes
const TEXT_TOKEN: &str = "text()";

/// Build the structural path of `node` relative to `root`
///
/// Fails with [`AnchorError::PathNotFound`] when `node` does not sit
/// under `root`.
pub fn path_from_node(tree: &DocTree, node: NodeId, root: NodeId) -> Result<String> {
    if node == root {
        return Ok("/".to_string());
    }
    let mut segments = Vec::new();
    let mut cur = node;
    while cur != root {
        let parent = tree
            .parent(cur)
            .ok_or_else(|| AnchorError::PathNotFound(format!("node {node} is not under the root")))?;
        let name = segment_name(tree, cur);
        let index = same_name_index(tree, parent, cur, &name);
        segments.push(format!("{name}[{index}]"));
        cur = parent;
    }
    segments.reverse();
    Ok(format!("/{}", segments.join("/")))
}

/// Resolve a structural path back to a node
///
/// Returns `None` (never an error) when any segment's child is absent
/// or the path does not parse; callers treat this as "selector
/// unusable" and fall back.
pub fn node_from_path(tree: &DocTree, path: &str, root: NodeId) -> Option<NodeId> {
    let trimmed = path.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return Some(root);
    }
    let mut cur = root;
    for segment in trimmed.split('/') {
        let (name, index) = parse_segment(segment)?;
        cur = nth_same_name_child(tree, cur, &name, index)?;
    }
    Some(cur)
}

fn segment_name(tree: &DocTree, node: NodeId) -> String {
    match tree.tag(node) {
        Some(tag) => tag.to_string(),
        None => TEXT_TOKEN.to_string(),
    }
}

/// 1-based position of `node` among `parent`'s children with the same
/// segment name
fn same_name_index(tree: &DocTree, parent: NodeId, node: NodeId, name: &str) -> usize {
    let mut index = 0;
    for &child in tree.children(parent) {
        if segment_name(tree, child) == name {
            index += 1;
        }
        if child == node {
            break;
        }
    }
    index
}

/// Parse `name[n]` into its parts; a missing index means 1
fn parse_segment(segment: &str) -> Option<(String, usize)> {
    let segment = segment.trim();
    if segment.is_empty() {
        return None;
    }
    match segment.find('[') {
        None => Some((segment.to_ascii_lowercase(), 1)),
        Some(open) => {
            let close = segment.rfind(']')?;
            if close < open {
                return None;
            }
            let name = segment[..open].to_ascii_lowercase();
            let index: usize = segment[open + 1..close].trim().parse().ok()?;
            if index == 0 {
                return None;
            }
            Some((name, index))
        }
    }
}

fn nth_same_name_child(tree: &DocTree, parent: NodeId, name: &str, index: usize) -> Option<NodeId> {
    let mut seen = 0;
    for &child in tree.children(parent) {
        let child_name = match tree.kind(child).ok()? {
            NodeKind::Text { .. } => TEXT_TOKEN,
            NodeKind::Element { tag, .. } => tag.as_str(),
        };
        // Tags are stored lowercased; the parsed name is lowercased too,
        // which makes the comparison case-insensitive.
        if child_name == name {
            seen += 1;
            if seen == index {
                return Some(child);
            }
        }
    }
    None
}
