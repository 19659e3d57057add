//! Page access abstraction
//!
//! A paginated host renders pages lazily: every page can report its
//! text, but only rendered pages have a text layer in the tree. The
//! adapter talks to the host through [`PageSource`] and treats
//! [`PageSource::extract_text`] as expensive, caching its results.

use doc_tree::{DocTree, NodeId};

use crate::{PagedError, Result};

/// Host-side view of a paginated document
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Full text of a page, rendered or not. Expensive; callers cache.
    fn extract_text(&self, page: usize) -> Result<String>;

    /// The page's rendered text layer, `None` while unrendered
    fn text_layer(&self, page: usize) -> Option<NodeId>;

    /// The page's container element, present even before rendering
    fn container(&self, page: usize) -> Option<NodeId>;
}

/// In-memory page source with explicit, per-page rendering
///
/// Each page gets a `<page>` container under the root up front; text
/// layers appear only when [`StaticPages::render_page`] is called.
#[derive(Debug)]
pub struct StaticPages {
    texts: Vec<String>,
    containers: Vec<NodeId>,
    layers: Vec<Option<NodeId>>,
}

impl StaticPages {
    pub fn new(tree: &mut DocTree, texts: &[&str]) -> Result<Self> {
        let root = tree.root();
        let mut containers = Vec::with_capacity(texts.len());
        for _ in texts {
            containers.push(tree.append_element(root, "page")?);
        }
        Ok(Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            containers,
            layers: vec![None; texts.len()],
        })
    }

    /// Materialize a page's text layer; idempotent per page
    pub fn render_page(&mut self, tree: &mut DocTree, page: usize) -> Result<NodeId> {
        let container = *self
            .containers
            .get(page)
            .ok_or(PagedError::PageOutOfBounds {
                index: page,
                count: self.containers.len(),
            })?;
        if let Some(layer) = self.layers[page] {
            return Ok(layer);
        }
        let layer = tree.append_element(container, "textlayer")?;
        tree.append_text(layer, self.texts[page].clone())?;
        self.layers[page] = Some(layer);
        Ok(layer)
    }
}

impl PageSource for StaticPages {
    fn page_count(&self) -> usize {
        self.texts.len()
    }

    fn extract_text(&self, page: usize) -> Result<String> {
        self.texts
            .get(page)
            .cloned()
            .ok_or(PagedError::PageOutOfBounds {
                index: page,
                count: self.texts.len(),
            })
    }

    fn text_layer(&self, page: usize) -> Option<NodeId> {
        self.layers.get(page).copied().flatten()
    }

    fn container(&self, page: usize) -> Option<NodeId> {
        self.containers.get(page).copied()
    }
}
