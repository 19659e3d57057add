//! Anchoring - durable text locations over a mutable document tree
//!
//! This crate converts between persisted, serializable selectors and
//! live ranges in a [`doc_tree::DocTree`]:
//!
//! - [`path`] - structural path codec (`/tag[n]` segments)
//! - [`position`] - char-offset positions and ranges relative to an element
//! - [`match_quote`] - approximate quote search with confidence scoring
//! - [`selector`] - the persisted wire format (serde tagged union)
//! - [`anchors`] - strategy-specific selector <-> range converters
//! - [`orchestrator`] - ordered fallback across strategies, async retry
//! - [`highlight`] - marker rendering for resolved ranges
//!
//! An annotation is described once ([`describe`]) and re-anchored on
//! every render ([`anchor`]); the orchestrator reconciles the three
//! strategies and recovers from exact-match failure via fuzzy search.

pub mod anchors;
mod error;
pub mod highlight;
pub mod match_quote;
pub mod orchestrator;
pub mod path;
pub mod position;
mod selector;
mod text;

pub use anchors::{PositionAnchor, QuoteAnchor, RangeAnchor, DEFAULT_CONTEXT_LEN};
pub use error::*;
pub use highlight::{
    highlight_range, highlights_for_annotation, remove_annotation, remove_highlights,
    tag_annotation, AnnotationId, Highlight, ANNOTATION_ATTR, HIGHLIGHT_TAG,
};
pub use match_quote::{match_quote, Match, MatchConfig, MatchContext};
pub use orchestrator::{anchor, anchor_all, anchor_once, describe, AnchorOptions, RetryPolicy, Strategy};
pub use path::{node_from_path, path_from_node};
pub use position::{range_text, Direction, TextPosition, TextRange};
pub use selector::Selector;
pub use text::{char_len, char_slice};
