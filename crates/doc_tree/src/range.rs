//! Range model - boundary points over the arena tree
//!
//! A [`Boundary`] follows DOM semantics: on an element node the offset
//! is a child index, on a text node it is a char offset into the
//! node's character data. A [`DomRange`] is an ordered pair of
//! boundaries in document order.

use std::cmp::Ordering;

use crate::{DocTree, NodeId};

/// A single boundary point inside the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    /// Create a new boundary point
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A contiguous region of the document between two boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: Boundary,
    pub end: Boundary,
}

impl DomRange {
    /// Create a new range
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// Create a collapsed range (both boundaries at the same point)
    pub fn collapsed(at: Boundary) -> Self {
        Self {
            start: at,
            end: at,
        }
    }

    /// Check if start and end are the same point
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Check that start does not come after end in document order.
    /// Boundaries outside the tree compare as unordered (`false`).
    pub fn is_ordered(&self, tree: &DocTree) -> bool {
        matches!(
            compare_boundaries(tree, self.start, self.end),
            Some(Ordering::Less) | Some(Ordering::Equal)
        )
    }
}

/// Compare two boundary points in document order.
///
/// Returns `None` when either node is not attached under the tree root.
pub fn compare_boundaries(tree: &DocTree, a: Boundary, b: Boundary) -> Option<Ordering> {
    let ka = boundary_key(tree, a)?;
    let kb = boundary_key(tree, b)?;
    Some(ka.cmp(&kb))
}

/// Lexicographic address of a boundary: child indices root -> node,
/// then the in-node offset.
fn boundary_key(tree: &DocTree, boundary: Boundary) -> Option<Vec<usize>> {
    let mut key = Vec::new();
    let mut node = boundary.node;
    while node != tree.root() {
        let index = tree.child_index(node)?;
        key.push(index);
        node = tree.parent(node)?;
    }
    key.reverse();
    key.push(boundary.offset);
    Some(key)
}
