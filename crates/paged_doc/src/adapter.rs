//! Paginated anchoring
//!
//! Adapts the selector model to a lazily rendered, paginated document.
//! Absolute offsets address the concatenation of all page texts; the
//! adapter finds the owning page, converts to page-local offsets and
//! anchors inside the page's text layer. A page without a text layer
//! gets a placeholder element instead; the host re-anchors after
//! rendering, the adapter never retries on its own.
//!
//! Structural selectors are skipped here: page containers are
//! destroyed and rebuilt on re-render, so stored paths never survive.

use anchoring::{
    char_len, char_slice, match_quote, AnchorError, MatchConfig, MatchContext, Selector,
    TextRange, DEFAULT_CONTEXT_LEN,
};
use doc_tree::{Boundary, DocTree, DomRange, NodeId};
use tokio::sync::{watch, RwLock};

use crate::cache::{CachedQuoteMatch, PageTextCache, QuoteMatchCache};
use crate::page::PageSource;
use crate::{PagedError, Result};

/// Class of the marker element anchored into unrendered pages
pub const PLACEHOLDER_CLASS: &str = "annotation-placeholder";

/// Visible text of a placeholder
pub const PLACEHOLDER_TEXT: &str = "Loading annotations\u{2026}";

/// Per-document anchoring state: caches plus the load signal
///
/// One instance per open document; caches never outlive the document
/// they were filled from.
#[derive(Debug)]
pub struct PagedAnchor {
    loaded: watch::Receiver<bool>,
    page_texts: PageTextCache,
    quote_matches: QuoteMatchCache,
    match_config: MatchConfig,
}

impl PagedAnchor {
    /// Adapter that suspends until `loaded` turns true
    pub fn new(loaded: watch::Receiver<bool>) -> Self {
        Self {
            loaded,
            page_texts: PageTextCache::default(),
            quote_matches: QuoteMatchCache::default(),
            match_config: MatchConfig::default(),
        }
    }

    /// Adapter whose document is already fully loaded
    pub fn ready() -> Self {
        let (tx, rx) = watch::channel(true);
        drop(tx);
        Self::new(rx)
    }

    /// Adapter plus the sender that flips its load signal
    pub fn loaded_channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self::new(rx))
    }

    pub fn with_match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// Drop all cached page text and quote positions. Called on
    /// document replacement; there is no partial invalidation.
    pub fn purge(&mut self) {
        tracing::debug!(
            pages = self.page_texts.len(),
            quotes = self.quote_matches.len(),
            "purging paginated anchoring caches"
        );
        self.page_texts.clear();
        self.quote_matches.clear();
    }

    /// Whether any page carries non-whitespace text
    pub async fn document_has_selectable_text(
        &mut self,
        source: &impl PageSource,
    ) -> Result<bool> {
        self.wait_until_loaded().await;
        for page in 0..source.page_count() {
            let text = self
                .page_texts
                .get_or_try_insert(page, || source.extract_text(page))?;
            if !text.trim().is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Resolve a selector set against the paginated document.
    ///
    /// The position selector is tried first and cross-checked against
    /// the stored quote; on mismatch or failure the quote is searched
    /// across pages, nearest-first around the position hint.
    pub async fn anchor(
        &mut self,
        tree: &RwLock<DocTree>,
        source: &impl PageSource,
        selectors: &[Selector],
    ) -> Result<DomRange> {
        self.wait_until_loaded().await;

        let skipped = selectors
            .iter()
            .filter(|s| matches!(s, Selector::RangeSelector { .. }))
            .count();
        if skipped > 0 {
            tracing::debug!(skipped, "skipping structural selectors in paginated mode");
        }
        let position = selectors.iter().find_map(|s| match s {
            Selector::TextPositionSelector { start, end } => Some((*start, *end)),
            _ => None,
        });
        let quote = selectors.iter().find_map(|s| match s {
            Selector::TextQuoteSelector {
                exact,
                prefix,
                suffix,
            } => Some((exact.as_str(), prefix.as_deref(), suffix.as_deref())),
            _ => None,
        });

        let mut guard = tree.write().await;
        let mut attempts = Vec::new();

        if let Some((start, end)) = position {
            match self.anchor_position(&mut guard, source, start, end, quote.map(|q| q.0)) {
                Ok(range) => return Ok(range),
                Err(err) => {
                    tracing::debug!(error = %err, "position anchoring failed");
                    attempts.push(format!("position: {err}"));
                }
            }
        }

        if let Some((exact, prefix, suffix)) = quote {
            let hint = position.map(|(start, _)| start);
            match self.anchor_quote(&mut guard, source, exact, prefix, suffix, hint) {
                Ok(range) => return Ok(range),
                Err(err) => {
                    tracing::debug!(error = %err, "quote anchoring failed");
                    attempts.push(format!("quote: {err}"));
                }
            }
        }

        if attempts.is_empty() {
            attempts.push("no usable selectors".to_string());
        }
        Err(AnchorError::Exhausted { attempts }.into())
    }

    /// Capture selectors for a range inside a rendered page.
    ///
    /// Offsets are absolute across the page concatenation; the quote's
    /// context window is page-scoped. No structural selector is
    /// produced.
    pub async fn describe(
        &mut self,
        tree: &RwLock<DocTree>,
        source: &impl PageSource,
        range: &DomRange,
    ) -> Result<Vec<Selector>> {
        let guard = tree.read().await;
        let (page, layer) = self
            .owning_page(&guard, source, range.start.node)
            .ok_or_else(|| {
                AnchorError::MalformedSelector(
                    "range is not inside a rendered page".to_string(),
                )
            })?;
        let local = TextRange::from_range(&guard, range)?.relative_to(&guard, layer)?;
        let exact = local.text(&guard)?;
        if exact.is_empty() {
            return Err(
                AnchorError::MalformedSelector("cannot describe an empty selection".to_string())
                    .into(),
            );
        }

        let page_start = self.page_offset(source, page)?;
        let (start, end) = (local.start.offset, local.end.offset);
        let page_text = self
            .page_texts
            .get_or_try_insert(page, || source.extract_text(page))?;
        let prefix = char_slice(page_text, start.saturating_sub(DEFAULT_CONTEXT_LEN), start);
        let suffix = char_slice(page_text, end, end + DEFAULT_CONTEXT_LEN);

        Ok(vec![
            Selector::TextPositionSelector {
                start: page_start + start,
                end: page_start + end,
            },
            Selector::TextQuoteSelector {
                exact,
                prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
                suffix: (!suffix.is_empty()).then(|| suffix.to_string()),
            },
        ])
    }

    // ====== Position strategy ======

    fn anchor_position(
        &mut self,
        tree: &mut DocTree,
        source: &impl PageSource,
        start: usize,
        end: usize,
        exact: Option<&str>,
    ) -> Result<DomRange> {
        if end < start {
            return Err(AnchorError::MalformedSelector(format!(
                "position end {end} precedes start {start}"
            ))
            .into());
        }
        let page = self.find_page(source, start)?;
        let end_page = self.find_page(source, end.saturating_sub(1).max(start))?;
        if end_page != page {
            return Err(AnchorError::MalformedSelector(format!(
                "position {start}..{end} spans pages {page} and {end_page}"
            ))
            .into());
        }

        let page_start = self.page_offset(source, page)?;
        let local_start = start - page_start;
        let local_end = end - page_start;

        // A drifted position silently covering other text is worse
        // than falling back to quote search.
        if let Some(expected) = exact {
            let page_text = self
                .page_texts
                .get_or_try_insert(page, || source.extract_text(page))?;
            let actual = char_slice(page_text, local_start, local_end);
            if actual != expected {
                return Err(AnchorError::QuoteMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                }
                .into());
            }
        }

        self.anchor_local(tree, source, page, local_start, local_end)
    }

    // ====== Quote strategy ======

    fn anchor_quote(
        &mut self,
        tree: &mut DocTree,
        source: &impl PageSource,
        exact: &str,
        prefix: Option<&str>,
        suffix: Option<&str>,
        hint: Option<usize>,
    ) -> Result<DomRange> {
        if let Some(hit) = self.quote_matches.get(exact, hint) {
            tracing::debug!(page = hit.page, "quote cache hit");
            return self.anchor_local(tree, source, hit.page, hit.start, hit.end);
        }

        let count = source.page_count();
        let hint_page = match hint {
            Some(offset) => Some(self.find_page(source, offset)?),
            None => None,
        };
        for page in page_order(count, hint_page) {
            let page_start = self.page_offset(source, page)?;
            let config = self.match_config.clone();
            let page_text = self
                .page_texts
                .get_or_try_insert(page, || source.extract_text(page))?;
            let local_hint =
                hint.map(|h| h.saturating_sub(page_start).min(char_len(page_text)));
            let context = MatchContext {
                prefix,
                suffix,
                hint: local_hint,
            };
            let Some(hit) = match_quote(page_text, exact, context, &config) else {
                continue;
            };
            self.quote_matches.insert(
                exact,
                hint,
                CachedQuoteMatch {
                    page,
                    start: hit.start,
                    end: hit.end,
                },
            );
            return self.anchor_local(tree, source, page, hit.start, hit.end);
        }
        Err(AnchorError::QuoteNotFound.into())
    }

    // ====== Shared plumbing ======

    /// Anchor page-local offsets, into the text layer when rendered
    /// and onto a placeholder otherwise
    fn anchor_local(
        &mut self,
        tree: &mut DocTree,
        source: &impl PageSource,
        page: usize,
        start: usize,
        end: usize,
    ) -> Result<DomRange> {
        if let Some(layer) = source.text_layer(page) {
            return Ok(TextRange::from_offsets(layer, start, end).to_range(tree)?);
        }
        let container = source.container(page).ok_or(PagedError::PageOutOfBounds {
            index: page,
            count: source.page_count(),
        })?;
        tracing::debug!(page, "page not rendered, anchoring to placeholder");
        let text = placeholder_text_node(tree, container)?;
        let len = tree.text(text).map(char_len).unwrap_or(0);
        Ok(DomRange::new(Boundary::new(text, 0), Boundary::new(text, len)))
    }

    /// Page owning an absolute char offset: the first page whose
    /// cumulative length exceeds it, or the last page
    fn find_page(&mut self, source: &impl PageSource, offset: usize) -> Result<usize> {
        let count = source.page_count();
        if count == 0 {
            return Err(PagedError::PageOutOfBounds { index: 0, count: 0 });
        }
        let mut consumed = 0;
        for page in 0..count {
            let len = char_len(
                self.page_texts
                    .get_or_try_insert(page, || source.extract_text(page))?,
            );
            if offset < consumed + len || page == count - 1 {
                return Ok(page);
            }
            consumed += len;
        }
        Err(PagedError::PageOutOfBounds {
            index: count,
            count,
        })
    }

    /// Absolute offset of a page's first char
    fn page_offset(&mut self, source: &impl PageSource, page: usize) -> Result<usize> {
        let count = source.page_count();
        if page >= count {
            return Err(PagedError::PageOutOfBounds { index: page, count });
        }
        let mut offset = 0;
        for earlier in 0..page {
            offset += char_len(
                self.page_texts
                    .get_or_try_insert(earlier, || source.extract_text(earlier))?,
            );
        }
        Ok(offset)
    }

    /// Rendered page whose text layer contains `node`
    fn owning_page(
        &self,
        tree: &DocTree,
        source: &impl PageSource,
        node: NodeId,
    ) -> Option<(usize, NodeId)> {
        (0..source.page_count()).find_map(|page| {
            let layer = source.text_layer(page)?;
            tree.is_inclusive_ancestor(layer, node).then_some((page, layer))
        })
    }

    async fn wait_until_loaded(&mut self) {
        // A dropped sender counts as loaded.
        let _ = self.loaded.wait_for(|loaded| *loaded).await;
    }
}

/// Find or create the page's placeholder, returning its text node.
///
/// Repeated anchoring into the same unrendered page reuses one
/// placeholder instead of stacking new ones.
fn placeholder_text_node(tree: &mut DocTree, container: NodeId) -> Result<NodeId> {
    let existing = tree
        .children(container)
        .iter()
        .copied()
        .find(|&child| tree.attr(child, "class") == Some(PLACEHOLDER_CLASS));
    let holder = match existing {
        Some(holder) => holder,
        None => {
            let holder = tree.append_element(container, "div")?;
            tree.set_attr(holder, "class", PLACEHOLDER_CLASS)?;
            tree.append_text(holder, PLACEHOLDER_TEXT)?;
            holder
        }
    };
    match tree.children(holder).iter().copied().find(|&c| tree.is_text(c)) {
        Some(text) => Ok(text),
        None => Ok(tree.append_text(holder, PLACEHOLDER_TEXT)?),
    }
}

/// Visit pages nearest-first around a hint page, alternating outward
fn page_order(count: usize, hint: Option<usize>) -> Vec<usize> {
    let Some(hint) = hint else {
        return (0..count).collect();
    };
    if count == 0 {
        return Vec::new();
    }
    let hint = hint.min(count - 1);
    let mut order = Vec::with_capacity(count);
    order.push(hint);
    let mut step = 1;
    while order.len() < count {
        if hint + step < count {
            order.push(hint + step);
        }
        if step <= hint {
            order.push(hint - step);
        }
        step += 1;
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_order_without_hint_is_sequential() {
        assert_eq!(page_order(4, None), vec![0, 1, 2, 3]);
        assert!(page_order(0, Some(2)).is_empty());
    }

    #[test]
    fn test_page_order_zig_zags_around_hint() {
        assert_eq!(page_order(6, Some(2)), vec![2, 3, 1, 4, 0, 5]);
        assert_eq!(page_order(4, Some(0)), vec![0, 1, 2, 3]);
        assert_eq!(page_order(4, Some(3)), vec![3, 2, 1, 0]);
        // Out-of-range hints clamp to the last page.
        assert_eq!(page_order(3, Some(9)), vec![2, 1, 0]);
    }
}
