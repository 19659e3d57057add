//! Per-document caches
//!
//! Text extraction and quote search are the expensive steps of
//! paginated anchoring, so both are cached per adapter instance. There
//! is no partial invalidation: replacing the document calls
//! [`PagedAnchor::purge`](crate::PagedAnchor::purge), which clears
//! both caches wholesale.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::Result;

/// Extracted page text, keyed by page index
#[derive(Debug, Default)]
pub struct PageTextCache {
    pages: HashMap<usize, String>,
}

impl PageTextCache {
    /// Return the cached text for a page, filling the slot on a miss
    pub fn get_or_try_insert<F>(&mut self, page: usize, fill: F) -> Result<&str>
    where
        F: FnOnce() -> Result<String>,
    {
        match self.pages.entry(page) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_str()),
            Entry::Vacant(slot) => Ok(slot.insert(fill()?).as_str()),
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

/// Where a quote was last found, in page-local char offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedQuoteMatch {
    pub page: usize,
    pub start: usize,
    pub end: usize,
}

/// Quote search results, keyed by the exact text and the offset hint
/// the search ran with
#[derive(Debug, Default)]
pub struct QuoteMatchCache {
    matches: HashMap<(String, Option<usize>), CachedQuoteMatch>,
}

impl QuoteMatchCache {
    pub fn get(&self, exact: &str, hint: Option<usize>) -> Option<CachedQuoteMatch> {
        self.matches.get(&(exact.to_string(), hint)).copied()
    }

    pub fn insert(&mut self, exact: &str, hint: Option<usize>, hit: CachedQuoteMatch) {
        self.matches.insert((exact.to_string(), hint), hit);
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn clear(&mut self) {
        self.matches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_text_cache_fills_once() {
        let mut cache = PageTextCache::default();
        let mut calls = 0;
        for _ in 0..3 {
            let text = cache
                .get_or_try_insert(0, || {
                    calls += 1;
                    Ok("hello".to_string())
                })
                .unwrap();
            assert_eq!(text, "hello");
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_quote_cache_keyed_by_exact_and_hint() {
        let mut cache = QuoteMatchCache::default();
        let hit = CachedQuoteMatch {
            page: 1,
            start: 20,
            end: 30,
        };
        cache.insert("needle", Some(120), hit);
        assert_eq!(cache.get("needle", Some(120)), Some(hit));
        assert_eq!(cache.get("needle", None), None);
        assert_eq!(cache.get("other", Some(120)), None);
    }
}
