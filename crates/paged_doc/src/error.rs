//! Error types for paginated anchoring

use anchoring::AnchorError;
use doc_tree::TreeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PagedError {
    #[error("page {index} out of bounds ({count} pages)")]
    PageOutOfBounds { index: usize, count: usize },

    #[error(transparent)]
    Anchor(#[from] AnchorError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

pub type Result<T> = std::result::Result<T, PagedError>;
