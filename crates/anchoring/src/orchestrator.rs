//! Anchoring orchestrator
//!
//! Resolves a persisted selector set against a live tree by trying the
//! strategies in a strict order: structural path, then absolute
//! position, then quote. A later strategy runs only when the previous
//! one failed or when its mechanically resolved text contradicts the
//! stored exact quote. The quote strategy itself is exempt from that
//! cross-check since the matcher already ranks by text similarity.
//!
//! [`describe`] is the inverse: it captures all three selector
//! variants for a live range so a later [`anchor`] has every fallback
//! available.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use doc_tree::{DocTree, DomRange, NodeId};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::anchors::{PositionAnchor, QuoteAnchor, RangeAnchor};
use crate::match_quote::MatchConfig;
use crate::position::range_text;
use crate::selector::Selector;
use crate::{AnchorError, Result};

/// One resolution strategy, in fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Structural,
    Position,
    Quote,
}

impl Strategy {
    const ALL: [Strategy; 3] = [Strategy::Structural, Strategy::Position, Strategy::Quote];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Structural => "structural",
            Strategy::Position => "position",
            Strategy::Quote => "quote",
        };
        f.write_str(name)
    }
}

/// Bounded polling while document content is still loading
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            timeout: Duration::from_secs(3),
        }
    }
}

/// Knobs for one anchoring call
#[derive(Debug, Clone, Default)]
pub struct AnchorOptions {
    /// Expected char offset of the passage; falls back to the position
    /// selector's start when absent
    pub hint: Option<usize>,
    pub retry: RetryPolicy,
    pub match_config: MatchConfig,
}

impl AnchorOptions {
    pub fn with_hint(mut self, hint: usize) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// What one strategy produced for one selector set
enum Outcome {
    /// No selector of this strategy's variant was present
    Skipped,
    Resolved(DomRange),
    Failed(String),
}

/// Resolve a selector set against the current tree, once.
///
/// Only [`AnchorError::Exhausted`] escapes; every per-strategy failure
/// is recorded in its attempt list.
pub fn anchor_once(
    tree: &DocTree,
    root: NodeId,
    selectors: &[Selector],
    options: &AnchorOptions,
) -> Result<DomRange> {
    let exact = selectors.iter().find_map(|s| match s {
        Selector::TextQuoteSelector { exact, .. } => Some(exact.as_str()),
        _ => None,
    });
    let hint = options.hint.or_else(|| {
        selectors.iter().find_map(|s| match s {
            Selector::TextPositionSelector { start, .. } => Some(*start),
            _ => None,
        })
    });

    let mut attempts = Vec::new();
    for strategy in Strategy::ALL {
        match attempt(tree, root, strategy, selectors, hint, &options.match_config) {
            Outcome::Skipped => {}
            Outcome::Failed(reason) => {
                tracing::debug!(%strategy, %reason, "anchoring strategy failed");
                attempts.push(format!("{strategy}: {reason}"));
            }
            Outcome::Resolved(range) => {
                // A mechanically correct resolution that no longer
                // covers the stored quote is a stale selector, not a
                // success.
                if strategy != Strategy::Quote {
                    if let Some(expected) = exact {
                        let actual = range_text(tree, &range).unwrap_or_default();
                        if actual != expected {
                            let err = AnchorError::QuoteMismatch {
                                expected: expected.to_string(),
                                actual,
                            };
                            tracing::warn!(%strategy, "resolved text contradicts stored quote");
                            attempts.push(format!("{strategy}: {err}"));
                            continue;
                        }
                    }
                }
                return Ok(range);
            }
        }
    }

    if attempts.is_empty() {
        attempts.push("no usable selectors".to_string());
    }
    Err(AnchorError::Exhausted { attempts })
}

fn attempt(
    tree: &DocTree,
    root: NodeId,
    strategy: Strategy,
    selectors: &[Selector],
    hint: Option<usize>,
    config: &MatchConfig,
) -> Outcome {
    let result = match strategy {
        Strategy::Structural => selectors
            .iter()
            .find(|s| matches!(s, Selector::RangeSelector { .. }))
            .map(|s| RangeAnchor::from_selector(tree, root, s).and_then(|a| a.to_range(tree))),
        Strategy::Position => selectors
            .iter()
            .find(|s| matches!(s, Selector::TextPositionSelector { .. }))
            .map(|s| PositionAnchor::from_selector(root, s).and_then(|a| a.to_range(tree))),
        Strategy::Quote => selectors
            .iter()
            .find(|s| matches!(s, Selector::TextQuoteSelector { .. }))
            .map(|s| {
                QuoteAnchor::from_selector(root, s).and_then(|a| a.to_range(tree, hint, config))
            }),
    };
    match result {
        None => Outcome::Skipped,
        Some(Ok(range)) => Outcome::Resolved(range),
        Some(Err(err)) => Outcome::Failed(err.to_string()),
    }
}

/// Capture every selector variant that can describe `range`.
///
/// Variants are attempted independently; a variant that fails is
/// logged and omitted rather than failing the whole description.
pub fn describe(tree: &DocTree, root: NodeId, range: &DomRange) -> Vec<Selector> {
    let mut selectors = Vec::with_capacity(3);
    match RangeAnchor::from_range(tree, root, range).and_then(|a| a.to_selector(tree)) {
        Ok(selector) => selectors.push(selector),
        Err(err) => tracing::debug!(error = %err, "range selector not captured"),
    }
    match PositionAnchor::from_range(tree, root, range) {
        Ok(anchor) => selectors.push(anchor.to_selector()),
        Err(err) => tracing::debug!(error = %err, "position selector not captured"),
    }
    match QuoteAnchor::from_range(tree, root, range) {
        Ok(anchor) => selectors.push(anchor.to_selector()),
        Err(err) => tracing::debug!(error = %err, "quote selector not captured"),
    }
    selectors
}

/// Resolve a selector set, retrying while the document is still
/// loading.
///
/// Each failed attempt is retried at the policy's interval until its
/// timeout elapses; the last attempt's aggregate failure is returned.
pub async fn anchor(
    tree: &RwLock<DocTree>,
    root: NodeId,
    selectors: &[Selector],
    options: &AnchorOptions,
) -> Result<DomRange> {
    let deadline = Instant::now() + options.retry.timeout;
    loop {
        let result = {
            let guard = tree.read().await;
            anchor_once(&guard, root, selectors, options)
        };
        match result {
            Ok(range) => return Ok(range),
            Err(err) => {
                if Instant::now() + options.retry.interval > deadline {
                    return Err(err);
                }
                tracing::debug!(error = %err, "anchoring failed, retrying");
                tokio::time::sleep(options.retry.interval).await;
            }
        }
    }
}

/// Anchor many selector sets concurrently.
///
/// Annotations are independent: one result per input set, in input
/// order, with no cross-annotation ordering of the work itself.
pub async fn anchor_all(
    tree: Arc<RwLock<DocTree>>,
    root: NodeId,
    annotations: Vec<Vec<Selector>>,
    options: AnchorOptions,
) -> Vec<Result<DomRange>> {
    let mut handles = Vec::with_capacity(annotations.len());
    for selectors in annotations {
        let tree = Arc::clone(&tree);
        let options = options.clone();
        handles.push(tokio::spawn(async move {
            anchor(&tree, root, &selectors, &options).await
        }));
    }
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(match handle.await {
            Ok(result) => result,
            Err(err) => Err(AnchorError::Exhausted {
                attempts: vec![format!("anchoring task failed: {err}")],
            }),
        });
    }
    results
}
