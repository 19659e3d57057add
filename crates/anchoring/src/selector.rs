//! Persisted selector wire format
//!
//! A stored annotation carries up to three selectors describing the
//! same passage through independent means. The JSON encoding is a
//! tagged union on `type`; unknown fields are ignored on input so the
//! format can grow without breaking old readers.

use serde::{Deserialize, Serialize};

/// One serialized description of a passage
///
/// Selectors are immutable once persisted; re-anchoring never rewrites
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Selector {
    /// Structural paths of the range's boundary nodes plus in-node
    /// offsets. Precise but brittle under structural mutation.
    #[serde(rename_all = "camelCase")]
    RangeSelector {
        start_container: String,
        start_offset: usize,
        end_container: String,
        end_offset: usize,
    },

    /// Absolute char offsets into the root's concatenated text.
    /// Survives restructuring, drifts under edits before the passage.
    TextPositionSelector { start: usize, end: usize },

    /// The passage's text with a window of surrounding context.
    /// Slowest, but survives both restructuring and nearby edits.
    TextQuoteSelector {
        exact: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suffix: Option<String>,
    },
}

impl Selector {
    /// Wire-format tag, used in log messages and failure reports
    pub fn kind(&self) -> &'static str {
        match self {
            Selector::RangeSelector { .. } => "RangeSelector",
            Selector::TextPositionSelector { .. } => "TextPositionSelector",
            Selector::TextQuoteSelector { .. } => "TextQuoteSelector",
        }
    }
}
