//! Highlight rendering
//!
//! Turns a resolved range into marker elements: boundary text nodes
//! are split so every touched node lies wholly inside or outside the
//! range, then each inside node is wrapped in a `<highlight>` element
//! carrying a style class. Visible text is never altered and nodes
//! outside the range are never reordered.
//!
//! Markers can afterwards be tagged with an owning [`AnnotationId`] so
//! they can be found, restyled or removed without keeping the
//! [`Highlight`] list around.

use doc_tree::{Boundary, DocTree, DomRange, NodeId, NodeKind};
use uuid::Uuid;

use crate::position::TextRange;
use crate::text::char_len;
use crate::Result;

/// Tag of marker elements
pub const HIGHLIGHT_TAG: &str = "highlight";

/// Attribute naming the annotation a marker belongs to
pub const ANNOTATION_ATTR: &str = "data-annotation-id";

/// Identity of an annotation, used to key its markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationId(Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AnnotationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One marker element and the text node it wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub marker: NodeId,
    pub text: NodeId,
}

/// Wrap every text node inside `range` in a marker element.
///
/// Boundary text nodes are split first; the caller's range is
/// rewritten to the equivalent post-split boundaries. Empty text nodes
/// inside the range are skipped. A collapsed range yields no markers
/// and leaves the tree untouched.
pub fn highlight_range(
    tree: &mut DocTree,
    range: &mut DomRange,
    style_class: &str,
) -> Result<Vec<Highlight>> {
    // Element boundaries are snapped onto the text they enclose.
    if !tree.is_text(range.start.node) || !tree.is_text(range.end.node) {
        *range = TextRange::from_range(tree, range)?.to_range(tree)?;
    }
    let (start, end) = (range.start, range.end);
    if start == end {
        return Ok(Vec::new());
    }

    let (first, last) = if start.node == end.node {
        // Split the end first so the start offset stays valid.
        let len = tree.text(end.node).map(char_len).unwrap_or(0);
        if end.offset < len {
            tree.split_text(end.node, end.offset)?;
        }
        let target = if start.offset > 0 {
            tree.split_text(start.node, start.offset)?
        } else {
            start.node
        };
        (target, target)
    } else {
        let first = if start.offset > 0 {
            tree.split_text(start.node, start.offset)?
        } else {
            start.node
        };
        let len = tree.text(end.node).map(char_len).unwrap_or(0);
        if end.offset < len {
            tree.split_text(end.node, end.offset)?;
        }
        (first, end.node)
    };

    let ordered = tree.text_nodes_in(tree.root());
    let first_index = ordered.iter().position(|&n| n == first);
    let last_index = ordered.iter().position(|&n| n == last);
    let (Some(first_index), Some(last_index)) = (first_index, last_index) else {
        return Ok(Vec::new());
    };

    let mut highlights = Vec::new();
    for &node in &ordered[first_index..=last_index.max(first_index)] {
        if tree.text(node).map(str::is_empty).unwrap_or(true) {
            continue;
        }
        let marker = tree.create_element(HIGHLIGHT_TAG);
        tree.set_attr(marker, "class", style_class)?;
        tree.wrap_node(node, marker)?;
        highlights.push(Highlight { marker, text: node });
    }

    if let (Some(head), Some(tail)) = (highlights.first(), highlights.last()) {
        let tail_len = tree.text(tail.text).map(char_len).unwrap_or(0);
        range.start = Boundary::new(head.text, 0);
        range.end = Boundary::new(tail.text, tail_len);
    }
    Ok(highlights)
}

/// Unwrap markers, reinserting the wrapped text where the marker
/// stood. Split text nodes stay split. Already-detached markers are
/// skipped.
pub fn remove_highlights(tree: &mut DocTree, highlights: &[Highlight]) -> Result<()> {
    for highlight in highlights {
        if tree.parent(highlight.marker).is_none() {
            continue;
        }
        tree.unwrap_node(highlight.marker)?;
    }
    Ok(())
}

/// Stamp markers with the annotation that owns them
pub fn tag_annotation(tree: &mut DocTree, highlights: &[Highlight], id: AnnotationId) -> Result<()> {
    let value = id.to_string();
    for highlight in highlights {
        tree.set_attr(highlight.marker, ANNOTATION_ATTR, &value)?;
    }
    Ok(())
}

/// Find the markers of one annotation under `root`, in document order
pub fn highlights_for_annotation(tree: &DocTree, root: NodeId, id: AnnotationId) -> Vec<Highlight> {
    let value = id.to_string();
    let mut out = Vec::new();
    collect_markers(tree, root, &value, &mut out);
    out
}

fn collect_markers(tree: &DocTree, node: NodeId, value: &str, out: &mut Vec<Highlight>) {
    let Ok(NodeKind::Element { tag, children, .. }) = tree.kind(node) else {
        return;
    };
    if tag == HIGHLIGHT_TAG && tree.attr(node, ANNOTATION_ATTR) == Some(value) {
        if let Some(&text) = children.iter().find(|&&c| tree.is_text(c)) {
            out.push(Highlight { marker: node, text });
        }
        return;
    }
    for &child in children {
        collect_markers(tree, child, value, out);
    }
}

/// Remove every marker of one annotation; returns how many were
/// unwrapped
pub fn remove_annotation(tree: &mut DocTree, root: NodeId, id: AnnotationId) -> Result<usize> {
    let highlights = highlights_for_annotation(tree, root, id);
    remove_highlights(tree, &highlights)?;
    Ok(highlights.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::range_text;

    /// <root><p>"one "</p><p><b>"two"</b>" three"</p></root>
    fn sample_tree() -> (DocTree, [NodeId; 3]) {
        let mut tree = DocTree::new("root");
        let p1 = tree.append_element(tree.root(), "p").unwrap();
        let t1 = tree.append_text(p1, "one ").unwrap();
        let p2 = tree.append_element(tree.root(), "p").unwrap();
        let b = tree.append_element(p2, "b").unwrap();
        let t2 = tree.append_text(b, "two").unwrap();
        let t3 = tree.append_text(p2, " three").unwrap();
        (tree, [t1, t2, t3])
    }

    #[test]
    fn test_highlight_mid_node_splits_boundaries() {
        let (mut tree, [t1, ..]) = sample_tree();
        let mut range = DomRange::new(Boundary::new(t1, 1), Boundary::new(t1, 3));
        let highlights = highlight_range(&mut tree, &mut range, "hl").unwrap();
        assert_eq!(highlights.len(), 1);
        assert_eq!(tree.text(highlights[0].text), Some("ne"));
        assert_eq!(tree.tag(highlights[0].marker), Some(HIGHLIGHT_TAG));
        assert_eq!(tree.attr(highlights[0].marker, "class"), Some("hl"));
        // Visible text is unchanged.
        assert_eq!(tree.text_content(tree.root()), "one two three");
        // The caller's range now addresses the post-split node.
        assert_eq!(range.start, Boundary::new(highlights[0].text, 0));
        assert_eq!(range.end, Boundary::new(highlights[0].text, 2));
        assert_eq!(range_text(&tree, &range).unwrap(), "ne");
    }

    #[test]
    fn test_highlight_spanning_sibling_nodes() {
        let (mut tree, [_, t2, t3]) = sample_tree();
        // "wo thr" spans the <b> text and its sibling.
        let mut range = DomRange::new(Boundary::new(t2, 1), Boundary::new(t3, 4));
        let highlights = highlight_range(&mut tree, &mut range, "hl").unwrap();
        assert_eq!(highlights.len(), 2);
        assert_eq!(tree.text(highlights[0].text), Some("wo"));
        assert_eq!(tree.text(highlights[1].text), Some(" thr"));
        assert_eq!(tree.text_content(tree.root()), "one two three");
        assert_eq!(range_text(&tree, &range).unwrap(), "wo thr");
    }

    #[test]
    fn test_remove_restores_combined_content() {
        let (mut tree, [_, t2, t3]) = sample_tree();
        let before = tree.text_content(tree.root());
        let mut range = DomRange::new(Boundary::new(t2, 0), Boundary::new(t3, 6));
        let highlights = highlight_range(&mut tree, &mut range, "hl").unwrap();
        assert_eq!(highlights.len(), 2);

        remove_highlights(&mut tree, &highlights).unwrap();
        assert_eq!(tree.text_content(tree.root()), before);
        for highlight in &highlights {
            assert_eq!(tree.parent(highlight.marker), None);
        }
        // Removing twice is a no-op.
        remove_highlights(&mut tree, &highlights).unwrap();
        assert_eq!(tree.text_content(tree.root()), before);
    }

    #[test]
    fn test_collapsed_range_yields_no_markers() {
        let (mut tree, [t1, ..]) = sample_tree();
        let node_count = tree.node_count();
        let mut range = DomRange::new(Boundary::new(t1, 2), Boundary::new(t1, 2));
        let highlights = highlight_range(&mut tree, &mut range, "hl").unwrap();
        assert!(highlights.is_empty());
        assert_eq!(tree.node_count(), node_count);
    }

    #[test]
    fn test_element_boundaries_are_snapped() {
        let (mut tree, _) = sample_tree();
        let root = tree.root();
        let p1 = tree.children(root)[0];
        let mut range = DomRange::new(Boundary::new(p1, 0), Boundary::new(p1, 1));
        let highlights = highlight_range(&mut tree, &mut range, "hl").unwrap();
        assert_eq!(highlights.len(), 1);
        assert_eq!(tree.text(highlights[0].text), Some("one "));
    }

    #[test]
    fn test_empty_text_nodes_are_skipped() {
        let (mut tree, [t1, t2, _]) = sample_tree();
        let p1 = tree.parent(t1).unwrap();
        tree.append_text(p1, "").unwrap();
        let mut range = DomRange::new(Boundary::new(t1, 0), Boundary::new(t2, 3));
        let highlights = highlight_range(&mut tree, &mut range, "hl").unwrap();
        assert_eq!(highlights.len(), 2);
        assert_eq!(tree.text(highlights[0].text), Some("one "));
        assert_eq!(tree.text(highlights[1].text), Some("two"));
    }

    #[test]
    fn test_tag_find_remove_by_annotation() {
        let (mut tree, [_, t2, t3]) = sample_tree();
        let mut range = DomRange::new(Boundary::new(t2, 0), Boundary::new(t3, 6));
        let highlights = highlight_range(&mut tree, &mut range, "hl").unwrap();

        let id = AnnotationId::new();
        tag_annotation(&mut tree, &highlights, id).unwrap();

        let found = highlights_for_annotation(&tree, tree.root(), id);
        assert_eq!(found, highlights);
        // A different id finds nothing.
        assert!(highlights_for_annotation(&tree, tree.root(), AnnotationId::new()).is_empty());

        let root = tree.root();
        let removed = remove_annotation(&mut tree, root, id).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(tree.text_content(tree.root()), "one two three");
        assert!(highlights_for_annotation(&tree, tree.root(), id).is_empty());
    }
}
