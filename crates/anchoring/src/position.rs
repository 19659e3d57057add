//! Text position model - char offsets relative to an element
//!
//! A [`TextPosition`] addresses one point in an element's concatenated
//! descendant text. Positions convert losslessly between ancestors
//! ([`TextPosition::relative_to`]) and resolve to a concrete
//! (text node, in-node offset) pair ([`TextPosition::resolve`]).
//!
//! Offset 0 into an element with no text is genuinely ambiguous: the
//! nearest text node may sit before or after the element. Callers that
//! can tolerate the ambiguity pass an explicit [`Direction`]; there is
//! deliberately no default.

use doc_tree::{Boundary, DocTree, DomRange, NodeId, NodeKind};

use crate::text::{char_len, char_slice};
use crate::{AnchorError, Result};

/// Which neighboring text node to pick when an offset cannot be
/// resolved inside the element itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A char offset through an element's concatenated descendant text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub element: NodeId,
    pub offset: usize,
}

impl TextPosition {
    /// Create a new position; bounds are checked on resolution
    pub fn new(element: NodeId, offset: usize) -> Self {
        Self { element, offset }
    }

    /// Create a position after validating the offset against the
    /// element's total text length
    pub fn from_char_offset(tree: &DocTree, element: NodeId, offset: usize) -> Result<Self> {
        let len = tree.text_len(element);
        if offset > len {
            return Err(AnchorError::OffsetOutOfRange { offset, len });
        }
        Ok(Self::new(element, offset))
    }

    /// Build a position from a range boundary.
    ///
    /// A text-node boundary becomes a position on its parent element;
    /// an element boundary sums the text of the children preceding the
    /// child index.
    pub fn from_point(tree: &DocTree, boundary: Boundary) -> Result<Self> {
        match tree.kind(boundary.node)? {
            NodeKind::Text { content } => {
                let len = char_len(content);
                if boundary.offset > len {
                    return Err(AnchorError::OffsetOutOfRange {
                        offset: boundary.offset,
                        len,
                    });
                }
                let parent = tree
                    .parent(boundary.node)
                    .ok_or(AnchorError::Tree(doc_tree::TreeError::DetachedNode(
                        boundary.node,
                    )))?;
                let mut offset = boundary.offset;
                for &sibling in tree.children(parent) {
                    if sibling == boundary.node {
                        break;
                    }
                    offset += tree.text_len(sibling);
                }
                Ok(Self::new(parent, offset))
            }
            NodeKind::Element { children, .. } => {
                if boundary.offset > children.len() {
                    return Err(AnchorError::OffsetOutOfRange {
                        offset: boundary.offset,
                        len: children.len(),
                    });
                }
                let offset = children[..boundary.offset]
                    .iter()
                    .map(|&c| tree.text_len(c))
                    .sum();
                Ok(Self::new(boundary.node, offset))
            }
        }
    }

    /// Re-express this position relative to an ancestor element by
    /// adding the text lengths of everything preceding it on the way up
    pub fn relative_to(&self, tree: &DocTree, ancestor: NodeId) -> Result<TextPosition> {
        let mut element = self.element;
        let mut offset = self.offset;
        while element != ancestor {
            let parent = tree
                .parent(element)
                .ok_or(AnchorError::NotAncestor(ancestor))?;
            for &sibling in tree.children(parent) {
                if sibling == element {
                    break;
                }
                offset += tree.text_len(sibling);
            }
            element = parent;
        }
        Ok(TextPosition::new(ancestor, offset))
    }

    /// Map this position to a concrete (text node, in-node char offset).
    ///
    /// When the offset is 0 and the element holds no text, `direction`
    /// picks the neighboring text node in document order; without one
    /// the resolution fails with [`AnchorError::AmbiguousOffset`].
    pub fn resolve(
        &self,
        tree: &DocTree,
        direction: Option<Direction>,
    ) -> Result<(NodeId, usize)> {
        match self.resolve_within(tree) {
            Ok(hit) => Ok(hit),
            Err(err) => {
                if self.offset > 0 {
                    return Err(err);
                }
                match direction {
                    Some(Direction::Forward) => tree
                        .next_text_node(self.element)
                        .map(|node| (node, 0))
                        .ok_or(err),
                    Some(Direction::Backward) => tree
                        .previous_text_node(self.element)
                        .map(|node| {
                            let len = tree.text(node).map(char_len).unwrap_or(0);
                            (node, len)
                        })
                        .ok_or(err),
                    None => Err(AnchorError::AmbiguousOffset),
                }
            }
        }
    }

    fn resolve_within(&self, tree: &DocTree) -> Result<(NodeId, usize)> {
        let mut consumed = 0;
        for node in tree.text_nodes_in(self.element) {
            let len = tree.text(node).map(char_len).unwrap_or(0);
            if self.offset <= consumed + len {
                return Ok((node, self.offset - consumed));
            }
            consumed += len;
        }
        Err(AnchorError::OffsetOutOfRange {
            offset: self.offset,
            len: consumed,
        })
    }
}

/// An ordered pair of text positions. Transient: never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: TextPosition,
    pub end: TextPosition,
}

impl TextRange {
    /// Create a new text range
    pub fn new(start: TextPosition, end: TextPosition) -> Self {
        Self { start, end }
    }

    /// Create a range from absolute offsets under one root element
    pub fn from_offsets(root: NodeId, start: usize, end: usize) -> Self {
        Self::new(
            TextPosition::new(root, start),
            TextPosition::new(root, end),
        )
    }

    /// Convert a boundary-point range into text positions
    pub fn from_range(tree: &DocTree, range: &DomRange) -> Result<Self> {
        Ok(Self::new(
            TextPosition::from_point(tree, range.start)?,
            TextPosition::from_point(tree, range.end)?,
        ))
    }

    /// Re-express both positions relative to a common ancestor
    pub fn relative_to(&self, tree: &DocTree, ancestor: NodeId) -> Result<Self> {
        Ok(Self::new(
            self.start.relative_to(tree, ancestor)?,
            self.end.relative_to(tree, ancestor)?,
        ))
    }

    /// Resolve to a boundary-point range on tight text-node boundaries.
    ///
    /// The start resolves forward and the end backward, so a range
    /// snapped to element boundaries lands on the text it encloses.
    pub fn to_range(&self, tree: &DocTree) -> Result<DomRange> {
        let (start_node, start_offset) = self.start.resolve(tree, Some(Direction::Forward))?;
        let (end_node, end_offset) = self.end.resolve(tree, Some(Direction::Backward))?;
        Ok(DomRange::new(
            Boundary::new(start_node, start_offset),
            Boundary::new(end_node, end_offset),
        ))
    }

    /// Text covered by this range
    pub fn text(&self, tree: &DocTree) -> Result<String> {
        let range = self.to_range(tree)?;
        range_text(tree, &range)
    }
}

/// Concatenated text between a range's boundaries.
///
/// Boundaries must sit on text nodes (the shape [`TextRange::to_range`]
/// produces); element boundaries are first normalized through a
/// [`TextRange`] round-trip.
pub fn range_text(tree: &DocTree, range: &DomRange) -> Result<String> {
    let (start, end) = if tree.is_text(range.start.node) && tree.is_text(range.end.node) {
        (range.start, range.end)
    } else {
        let normalized = TextRange::from_range(tree, range)?.to_range(tree)?;
        (normalized.start, normalized.end)
    };

    if start.node == end.node {
        let content = tree.text(start.node).unwrap_or("");
        return Ok(char_slice(content, start.offset, end.offset).to_string());
    }

    let nodes = tree.text_nodes_in(tree.root());
    let start_index = nodes
        .iter()
        .position(|&n| n == start.node)
        .ok_or(AnchorError::Tree(doc_tree::TreeError::DetachedNode(
            start.node,
        )))?;
    let end_index = nodes
        .iter()
        .position(|&n| n == end.node)
        .ok_or(AnchorError::Tree(doc_tree::TreeError::DetachedNode(end.node)))?;
    if end_index < start_index {
        return Err(AnchorError::MalformedSelector(
            "range end precedes range start".to_string(),
        ));
    }

    let mut out = String::new();
    for (i, &node) in nodes[start_index..=end_index].iter().enumerate() {
        let content = tree.text(node).unwrap_or("");
        let from = if i == 0 { start.offset } else { 0 };
        let to = if start_index + i == end_index {
            end.offset
        } else {
            char_len(content)
        };
        out.push_str(char_slice(content, from, to));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// <root><p>"one "</p><p><b>"two"</b>" three"</p><p/></root>
    fn sample_tree() -> (DocTree, [NodeId; 3], [NodeId; 3]) {
        let mut tree = DocTree::new("root");
        let p1 = tree.append_element(tree.root(), "p").unwrap();
        let t1 = tree.append_text(p1, "one ").unwrap();
        let p2 = tree.append_element(tree.root(), "p").unwrap();
        let b = tree.append_element(p2, "b").unwrap();
        let t2 = tree.append_text(b, "two").unwrap();
        let t3 = tree.append_text(p2, " three").unwrap();
        let p3 = tree.append_element(tree.root(), "p").unwrap();
        (tree, [p1, p2, p3], [t1, t2, t3])
    }

    #[test]
    fn test_relative_to_ancestor() {
        let (tree, [_, p2, _], [_, t2, _]) = sample_tree();
        // "two" starts after "one " within the root.
        let pos = TextPosition::from_point(&tree, Boundary::new(t2, 0)).unwrap();
        assert_eq!(pos.element, tree.parent(t2).unwrap());
        let abs = pos.relative_to(&tree, tree.root()).unwrap();
        assert_eq!(abs.offset, 4);
        let local = pos.relative_to(&tree, p2).unwrap();
        assert_eq!(local.offset, 0);
    }

    #[test]
    fn test_relative_to_non_ancestor_fails() {
        let (tree, [p1, _, _], [_, t2, _]) = sample_tree();
        let pos = TextPosition::from_point(&tree, Boundary::new(t2, 1)).unwrap();
        let err = pos.relative_to(&tree, p1).unwrap_err();
        assert!(matches!(err, AnchorError::NotAncestor(_)));
    }

    #[test]
    fn test_resolve_walks_text_nodes() {
        let (tree, _, [t1, t2, t3]) = sample_tree();
        let root = tree.root();
        assert_eq!(
            TextPosition::new(root, 0).resolve(&tree, None).unwrap(),
            (t1, 0)
        );
        assert_eq!(
            TextPosition::new(root, 5).resolve(&tree, None).unwrap(),
            (t2, 1)
        );
        // Total text is "one two three" (13 chars): the end lands on
        // the last node's end.
        assert_eq!(
            TextPosition::new(root, 13).resolve(&tree, None).unwrap(),
            (t3, 6)
        );
    }

    #[test]
    fn test_resolve_out_of_range() {
        let (tree, ..) = sample_tree();
        let err = TextPosition::new(tree.root(), 14)
            .resolve(&tree, None)
            .unwrap_err();
        assert!(matches!(err, AnchorError::OffsetOutOfRange { len: 13, .. }));
    }

    #[test]
    fn test_empty_element_requires_direction() {
        let (tree, [_, _, p3], [_, _, t3]) = sample_tree();
        let pos = TextPosition::new(p3, 0);
        assert!(matches!(
            pos.resolve(&tree, None).unwrap_err(),
            AnchorError::AmbiguousOffset
        ));
        // Forward from the trailing empty <p> finds nothing.
        assert!(pos.resolve(&tree, Some(Direction::Forward)).is_err());
        // Backward lands at the end of " three".
        assert_eq!(
            pos.resolve(&tree, Some(Direction::Backward)).unwrap(),
            (t3, 6)
        );
    }

    #[test]
    fn test_from_point_element_boundary() {
        let (tree, [_, p2, _], _) = sample_tree();
        // Child index 1 of p2 sits after <b>two</b>.
        let pos = TextPosition::from_point(&tree, Boundary::new(p2, 1)).unwrap();
        assert_eq!(pos, TextPosition::new(p2, 3));
        let err = TextPosition::from_point(&tree, Boundary::new(p2, 3)).unwrap_err();
        assert!(matches!(err, AnchorError::OffsetOutOfRange { .. }));
    }

    #[test]
    fn test_from_char_offset_validates() {
        let (tree, ..) = sample_tree();
        assert!(TextPosition::from_char_offset(&tree, tree.root(), 13).is_ok());
        assert!(matches!(
            TextPosition::from_char_offset(&tree, tree.root(), 14).unwrap_err(),
            AnchorError::OffsetOutOfRange { .. }
        ));
    }

    #[test]
    fn test_text_range_round_trip() {
        let (tree, ..) = sample_tree();
        let range = TextRange::from_offsets(tree.root(), 4, 13);
        assert_eq!(range.text(&tree).unwrap(), "two three");

        let dom = range.to_range(&tree).unwrap();
        let back = TextRange::from_range(&tree, &dom)
            .unwrap()
            .relative_to(&tree, tree.root())
            .unwrap();
        assert_eq!(back.start.offset, 4);
        assert_eq!(back.end.offset, 13);
    }

    #[test]
    fn test_to_range_snaps_element_boundaries() {
        let (tree, [p1, p2, _], [t1, t2, _]) = sample_tree();
        // A range spanning whole elements resolves to tight text-node
        // boundaries.
        let dom = DomRange::new(Boundary::new(p1, 0), Boundary::new(p2, 1));
        let text_range = TextRange::from_range(&tree, &dom).unwrap();
        let tight = text_range.to_range(&tree).unwrap();
        assert_eq!(tight.start, Boundary::new(t1, 0));
        assert_eq!(tight.end, Boundary::new(t2, 3));
        assert_eq!(range_text(&tree, &tight).unwrap(), "one two");
    }

    #[test]
    fn test_range_text_single_node() {
        let (tree, _, [t1, ..]) = sample_tree();
        let dom = DomRange::new(Boundary::new(t1, 0), Boundary::new(t1, 3));
        assert_eq!(range_text(&tree, &dom).unwrap(), "one");
    }
}
