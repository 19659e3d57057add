//! Error types for anchoring operations

use doc_tree::{NodeId, TreeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnchorError {
    /// A structural path segment had no matching child under the root.
    /// Recoverable: the orchestrator falls back to the next strategy.
    #[error("structural path not found: {0}")]
    PathNotFound(String),

    /// A position exceeds the available text. Recoverable.
    #[error("offset {offset} is outside text of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// No acceptable fuzzy match. Terminal only as the last strategy.
    #[error("quote not found")]
    QuoteNotFound,

    /// A mechanically resolved range whose text contradicts the exact
    /// quote. Forces fallback: a silent wrong anchor is worse.
    #[error("quote mismatch: expected {expected:?}, resolved {actual:?}")]
    QuoteMismatch { expected: String, actual: String },

    #[error("node {0} is not an ancestor of the position's element")]
    NotAncestor(NodeId),

    /// Offset 0 into an element with no text cannot be resolved without
    /// an explicit direction.
    #[error("offset 0 in an empty element is ambiguous without a direction")]
    AmbiguousOffset,

    #[error("malformed selector: {0}")]
    MalformedSelector(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Every present strategy was attempted and failed.
    #[error("unable to anchor: [{}]", .attempts.join("; "))]
    Exhausted { attempts: Vec<String> },
}

pub type Result<T> = std::result::Result<T, AnchorError>;
