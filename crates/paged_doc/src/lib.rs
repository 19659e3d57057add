//! Paginated-document anchoring
//!
//! Adapts the `anchoring` selector model to documents rendered one
//! page at a time:
//!
//! - [`page`] - the [`PageSource`] host abstraction and an in-memory
//!   implementation for tests and demos
//! - [`cache`] - per-document page-text and quote-position caches
//! - [`adapter`] - [`PagedAnchor`], the per-document anchoring state
//!
//! Absolute selector offsets address the concatenation of every
//! page's text; resolution happens page-locally after the owning page
//! is found. Unrendered pages anchor to a placeholder element until
//! the host renders them and re-anchors.

pub mod adapter;
pub mod cache;
mod error;
pub mod page;

pub use adapter::{PagedAnchor, PLACEHOLDER_CLASS, PLACEHOLDER_TEXT};
pub use cache::{CachedQuoteMatch, PageTextCache, QuoteMatchCache};
pub use error::{PagedError, Result};
pub use page::{PageSource, StaticPages};
