//! Error types for document tree operations

use thiserror::Error;

use crate::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0} is not a text node")]
    NotAText(NodeId),

    #[error("offset {offset} is out of bounds for node {node} (length {len})")]
    InvalidOffset {
        node: NodeId,
        offset: usize,
        len: usize,
    },

    #[error("node {0} is detached from the tree")]
    DetachedNode(NodeId),

    #[error("tree structure error: {0}")]
    Structure(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;
