//! Strategy-specific anchors
//!
//! Each anchor converts one selector variant to and from a live range:
//!
//! - [`RangeAnchor`] - structural paths of the boundary text nodes
//! - [`PositionAnchor`] - absolute char offsets under the root
//! - [`QuoteAnchor`] - exact text plus a window of context
//!
//! Anchors are mechanical; ranking and fallback live in the
//! orchestrator.

use doc_tree::{DocTree, DomRange, NodeId};

use crate::match_quote::{match_quote, Match, MatchConfig, MatchContext};
use crate::path::{node_from_path, path_from_node};
use crate::position::{range_text, TextPosition, TextRange};
use crate::selector::Selector;
use crate::text::{char_len, char_slice};
use crate::{AnchorError, Result};

/// Chars of surrounding context captured on each side of a quote
pub const DEFAULT_CONTEXT_LEN: usize = 32;

// ====== Structural range anchor ======

/// A range held as text positions, serialized as boundary-node paths
#[derive(Debug, Clone, Copy)]
pub struct RangeAnchor {
    pub root: NodeId,
    pub range: TextRange,
}

impl RangeAnchor {
    /// Capture a live range, shrinking element boundaries onto the
    /// text they enclose
    pub fn from_range(tree: &DocTree, root: NodeId, range: &DomRange) -> Result<Self> {
        Ok(Self {
            root,
            range: TextRange::from_range(tree, range)?,
        })
    }

    pub fn from_selector(tree: &DocTree, root: NodeId, selector: &Selector) -> Result<Self> {
        let Selector::RangeSelector {
            start_container,
            start_offset,
            end_container,
            end_offset,
        } = selector
        else {
            return Err(AnchorError::MalformedSelector(format!(
                "expected RangeSelector, got {}",
                selector.kind()
            )));
        };
        let start_node = node_from_path(tree, start_container, root)
            .ok_or_else(|| AnchorError::PathNotFound(start_container.clone()))?;
        let end_node = node_from_path(tree, end_container, root)
            .ok_or_else(|| AnchorError::PathNotFound(end_container.clone()))?;
        let range = TextRange::new(
            TextPosition::from_point(tree, doc_tree::Boundary::new(start_node, *start_offset))?,
            TextPosition::from_point(tree, doc_tree::Boundary::new(end_node, *end_offset))?,
        );
        Ok(Self { root, range })
    }

    pub fn to_range(&self, tree: &DocTree) -> Result<DomRange> {
        self.range.to_range(tree)
    }

    /// Serialize as paths to the tight text-node boundaries
    pub fn to_selector(&self, tree: &DocTree) -> Result<Selector> {
        let tight = self.range.to_range(tree)?;
        Ok(Selector::RangeSelector {
            start_container: path_from_node(tree, tight.start.node, self.root)?,
            start_offset: tight.start.offset,
            end_container: path_from_node(tree, tight.end.node, self.root)?,
            end_offset: tight.end.offset,
        })
    }
}

// ====== Absolute position anchor ======

/// Absolute char offsets into the root's concatenated text
#[derive(Debug, Clone, Copy)]
pub struct PositionAnchor {
    pub root: NodeId,
    pub start: usize,
    pub end: usize,
}

impl PositionAnchor {
    pub fn new(root: NodeId, start: usize, end: usize) -> Self {
        Self { root, start, end }
    }

    pub fn from_range(tree: &DocTree, root: NodeId, range: &DomRange) -> Result<Self> {
        let relative = TextRange::from_range(tree, range)?.relative_to(tree, root)?;
        Ok(Self::new(root, relative.start.offset, relative.end.offset))
    }

    pub fn from_selector(root: NodeId, selector: &Selector) -> Result<Self> {
        let Selector::TextPositionSelector { start, end } = selector else {
            return Err(AnchorError::MalformedSelector(format!(
                "expected TextPositionSelector, got {}",
                selector.kind()
            )));
        };
        if end < start {
            return Err(AnchorError::MalformedSelector(format!(
                "position end {end} precedes start {start}"
            )));
        }
        Ok(Self::new(root, *start, *end))
    }

    /// Resolve to a live range; offsets beyond the available text fail
    /// with [`AnchorError::OffsetOutOfRange`]
    pub fn to_range(&self, tree: &DocTree) -> Result<DomRange> {
        TextRange::from_offsets(self.root, self.start, self.end).to_range(tree)
    }

    pub fn to_selector(&self) -> Selector {
        Selector::TextPositionSelector {
            start: self.start,
            end: self.end,
        }
    }
}

// ====== Quote anchor ======

/// The passage's exact text plus surrounding context
#[derive(Debug, Clone)]
pub struct QuoteAnchor {
    pub root: NodeId,
    pub exact: String,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl QuoteAnchor {
    /// Capture a live range's text with [`DEFAULT_CONTEXT_LEN`] chars
    /// of context on each side
    pub fn from_range(tree: &DocTree, root: NodeId, range: &DomRange) -> Result<Self> {
        Self::from_range_with_context(tree, root, range, DEFAULT_CONTEXT_LEN)
    }

    pub fn from_range_with_context(
        tree: &DocTree,
        root: NodeId,
        range: &DomRange,
        context_len: usize,
    ) -> Result<Self> {
        let exact = range_text(tree, range)?;
        let relative = TextRange::from_range(tree, range)?.relative_to(tree, root)?;
        let text = tree.text_content(root);
        let start = relative.start.offset;
        let end = relative.end.offset;
        let prefix = char_slice(&text, start.saturating_sub(context_len), start);
        let suffix = char_slice(&text, end, end + context_len);
        Ok(Self {
            root,
            exact,
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            suffix: (!suffix.is_empty()).then(|| suffix.to_string()),
        })
    }

    pub fn from_selector(root: NodeId, selector: &Selector) -> Result<Self> {
        let Selector::TextQuoteSelector {
            exact,
            prefix,
            suffix,
        } = selector
        else {
            return Err(AnchorError::MalformedSelector(format!(
                "expected TextQuoteSelector, got {}",
                selector.kind()
            )));
        };
        Ok(Self {
            root,
            exact: exact.clone(),
            prefix: prefix.clone(),
            suffix: suffix.clone(),
        })
    }

    /// Run the matcher against the root's text.
    ///
    /// Any non-null match is accepted; the matcher ranks candidates but
    /// never thresholds them.
    pub fn to_match(
        &self,
        tree: &DocTree,
        hint: Option<usize>,
        config: &MatchConfig,
    ) -> Result<Match> {
        let text = tree.text_content(self.root);
        let context = MatchContext {
            prefix: self.prefix.as_deref(),
            suffix: self.suffix.as_deref(),
            hint,
        };
        match_quote(&text, &self.exact, context, config).ok_or(AnchorError::QuoteNotFound)
    }

    pub fn to_position_anchor(
        &self,
        tree: &DocTree,
        hint: Option<usize>,
        config: &MatchConfig,
    ) -> Result<PositionAnchor> {
        let m = self.to_match(tree, hint, config)?;
        Ok(PositionAnchor::new(self.root, m.start, m.end))
    }

    pub fn to_range(
        &self,
        tree: &DocTree,
        hint: Option<usize>,
        config: &MatchConfig,
    ) -> Result<DomRange> {
        self.to_position_anchor(tree, hint, config)?.to_range(tree)
    }

    pub fn to_selector(&self) -> Selector {
        Selector::TextQuoteSelector {
            exact: self.exact.clone(),
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
        }
    }

    /// Context window this anchor would serialize, in chars
    pub fn context_len(&self) -> usize {
        self.prefix
            .as_deref()
            .map(char_len)
            .unwrap_or(0)
            .max(self.suffix.as_deref().map(char_len).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_tree::Boundary;

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

    fn word_two(tree: &DocTree, t2: NodeId) -> DomRange {
        DomRange::new(Boundary::new(t2, 0), Boundary::new(t2, 3))
    }

    #[test]
    fn test_range_anchor_round_trip() {
        let (tree, [_, t2, _]) = sample_tree();
        let range = word_two(&tree, t2);
        let anchor = RangeAnchor::from_range(&tree, tree.root(), &range).unwrap();
        let selector = anchor.to_selector(&tree).unwrap();
        assert_eq!(
            selector,
            Selector::RangeSelector {
                start_container: "/p[2]/b[1]/text()[1]".to_string(),
                start_offset: 0,
                end_container: "/p[2]/b[1]/text()[1]".to_string(),
                end_offset: 3,
            }
        );
        let back = RangeAnchor::from_selector(&tree, tree.root(), &selector).unwrap();
        assert_eq!(back.to_range(&tree).unwrap(), range);
    }

    #[test]
    fn test_range_anchor_missing_path() {
        let (tree, ..) = sample_tree();
        let selector = Selector::RangeSelector {
            start_container: "/div[1]/text()[1]".to_string(),
            start_offset: 0,
            end_container: "/p[1]/text()[1]".to_string(),
            end_offset: 1,
        };
        let err = RangeAnchor::from_selector(&tree, tree.root(), &selector).unwrap_err();
        assert!(matches!(err, AnchorError::PathNotFound(_)));
    }

    #[test]
    fn test_position_anchor_round_trip() {
        let (tree, [_, t2, _]) = sample_tree();
        let range = word_two(&tree, t2);
        let anchor = PositionAnchor::from_range(&tree, tree.root(), &range).unwrap();
        assert_eq!((anchor.start, anchor.end), (4, 7));
        assert_eq!(
            anchor.to_selector(),
            Selector::TextPositionSelector { start: 4, end: 7 }
        );
        assert_eq!(anchor.to_range(&tree).unwrap(), range);
    }

    #[test]
    fn test_position_anchor_rejects_inverted_selector() {
        let (tree, ..) = sample_tree();
        let selector = Selector::TextPositionSelector { start: 9, end: 4 };
        let err = PositionAnchor::from_selector(tree.root(), &selector).unwrap_err();
        assert!(matches!(err, AnchorError::MalformedSelector(_)));
    }

    #[test]
    fn test_position_anchor_out_of_range() {
        let (tree, ..) = sample_tree();
        let anchor = PositionAnchor::new(tree.root(), 4, 99);
        assert!(matches!(
            anchor.to_range(&tree).unwrap_err(),
            AnchorError::OffsetOutOfRange { .. }
        ));
    }

    #[test]
    fn test_quote_anchor_captures_clipped_context() {
        let (tree, [_, t2, _]) = sample_tree();
        let range = word_two(&tree, t2);
        let anchor =
            QuoteAnchor::from_range_with_context(&tree, tree.root(), &range, 32).unwrap();
        assert_eq!(anchor.exact, "two");
        // Document is only 13 chars; context clips at its edges.
        assert_eq!(anchor.prefix.as_deref(), Some("one "));
        assert_eq!(anchor.suffix.as_deref(), Some(" three"));
    }

    #[test]
    fn test_quote_anchor_resolves_after_restructure() {
        let (mut tree, [_, t2, _]) = sample_tree();
        let range = word_two(&tree, t2);
        let anchor = QuoteAnchor::from_range(&tree, tree.root(), &range).unwrap();

        // Unwrapping <b> invalidates structure but not the text.
        let b = tree.parent(t2).unwrap();
        tree.unwrap_node(b).unwrap();
        let resolved = anchor
            .to_range(&tree, None, &MatchConfig::default())
            .unwrap();
        assert_eq!(range_text(&tree, &resolved).unwrap(), "two");
    }

    #[test]
    fn test_quote_anchor_not_found() {
        let (tree, ..) = sample_tree();
        let selector = Selector::TextQuoteSelector {
            exact: "never present in this document at all".to_string(),
            prefix: None,
            suffix: None,
        };
        let anchor = QuoteAnchor::from_selector(tree.root(), &selector).unwrap();
        assert!(matches!(
            anchor
                .to_range(&tree, None, &MatchConfig::default())
                .unwrap_err(),
            AnchorError::QuoteNotFound
        ));
    }

    #[test]
    fn test_wrong_selector_variant() {
        let (tree, ..) = sample_tree();
        let selector = Selector::TextPositionSelector { start: 0, end: 3 };
        assert!(matches!(
            RangeAnchor::from_selector(&tree, tree.root(), &selector).unwrap_err(),
            AnchorError::MalformedSelector(_)
        ));
        assert!(matches!(
            QuoteAnchor::from_selector(tree.root(), &selector).unwrap_err(),
            AnchorError::MalformedSelector(_)
        ));
    }
}
