//! Document Tree - node arena standing in for a live document tree
//!
//! This crate provides the in-memory document structure the anchoring
//! core operates on: an explicit arena of element and text nodes with
//! parent/children indices instead of live-tree pointers. It supports
//! the mutations anchoring and highlighting need (append, insert,
//! remove, text-node splitting, wrapping and unwrapping) plus the
//! traversals they are built on (ordered text-node walks and
//! document-order neighbor lookup).

mod error;
mod node;
mod range;
mod tree;

pub use error::*;
pub use node::*;
pub use range::*;
pub use tree::*;
