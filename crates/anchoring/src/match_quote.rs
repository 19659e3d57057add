//! Approximate quote matcher
//!
//! Finds the best occurrence of a quote in a text. Exact occurrences
//! are preferred outright; otherwise a bounded edit-distance scan
//! proposes candidates, and each candidate is scored by a weighted
//! combination of quote similarity, surrounding-context similarity and
//! proximity to an expected offset. The weights heavily favor content
//! over position: a previously recorded offset goes stale under
//! mutation, while the quote and its context are content-derived.

use crate::text::char_len;

/// Weights and bounds for quote matching.
///
/// The defaults (50/20/20/2, error cap 256) are empirical; they are
/// fields rather than constants so callers can tune them.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub quote_weight: u32,
    pub prefix_weight: u32,
    pub suffix_weight: u32,
    pub position_weight: u32,
    /// Upper bound on the edit-distance budget, capping worst-case
    /// search cost on pathological long quotes
    pub max_error_cap: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            quote_weight: 50,
            prefix_weight: 20,
            suffix_weight: 20,
            position_weight: 2,
            max_error_cap: 256,
        }
    }
}

/// Expected surroundings of a quote, all optional
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchContext<'a> {
    /// Text expected immediately before the quote
    pub prefix: Option<&'a str>,
    /// Text expected immediately after the quote
    pub suffix: Option<&'a str>,
    /// Expected char offset of the quote's start
    pub hint: Option<usize>,
}

/// A scored occurrence; offsets are char offsets into the text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    errors: usize,
}

/// Find the best approximate occurrence of `quote` in `text`
///
/// Returns `None` for an empty quote or when no candidate survives the
/// error bound `min(cap, quote_len / 2)`. Identical inputs always
/// produce the identical best match: ties are broken by score only,
/// first occurrence winning.
pub fn match_quote(
    text: &str,
    quote: &str,
    context: MatchContext<'_>,
    config: &MatchConfig,
) -> Option<Match> {
    if quote.is_empty() {
        return None;
    }
    let text_chars: Vec<char> = text.chars().collect();
    let quote_chars: Vec<char> = quote.chars().collect();
    let tlen = text_chars.len();
    let qlen = quote_chars.len();

    // Exact occurrences are the sole candidate set when any exist:
    // fuzzy search can never beat a zero-error match on quote score,
    // and skipping it keeps the common case cheap.
    let byte_offsets: Vec<usize> = text.char_indices().map(|(byte, _)| byte).collect();
    let mut candidates: Vec<Candidate> = text
        .match_indices(quote)
        .map(|(byte, _)| {
            let start = byte_offsets
                .binary_search(&byte)
                .unwrap_or_else(|insert| insert);
            Candidate {
                start,
                end: start + qlen,
                errors: 0,
            }
        })
        .collect();

    if candidates.is_empty() {
        let max_errors = (qlen / 2).min(config.max_error_cap);
        let errors_at = scan_errors(&text_chars, &quote_chars);
        for end in 1..=tlen {
            let errors = errors_at[end];
            if errors > max_errors {
                continue;
            }
            // One candidate per local minimum of the error curve; a
            // plateau contributes its last position.
            let before = errors_at[end - 1];
            let after = if end < tlen {
                errors_at[end + 1]
            } else {
                usize::MAX
            };
            if errors <= before && errors < after {
                let start = find_start(&text_chars, &quote_chars, end, errors);
                candidates.push(Candidate { start, end, errors });
            }
        }
    }

    let total_weight = (config.quote_weight
        + config.prefix_weight
        + config.suffix_weight
        + config.position_weight) as f64;
    let mut best: Option<Match> = None;
    for candidate in candidates {
        let quote_score = 1.0 - candidate.errors as f64 / qlen as f64;
        let prefix_score = context
            .prefix
            .map(|expected| {
                let plen = char_len(expected);
                let window = &text_chars[candidate.start.saturating_sub(plen)..candidate.start];
                similarity(window, expected)
            })
            .unwrap_or(1.0);
        let suffix_score = context
            .suffix
            .map(|expected| {
                let slen = char_len(expected);
                let window = &text_chars[candidate.end..(candidate.end + slen).min(tlen)];
                similarity(window, expected)
            })
            .unwrap_or(1.0);
        let position_score = match context.hint {
            Some(hint) if tlen > 0 => {
                let distance = candidate.start.abs_diff(hint) as f64 / tlen as f64;
                (1.0 - distance).max(0.0)
            }
            _ => 1.0,
        };
        let score = (config.quote_weight as f64 * quote_score
            + config.prefix_weight as f64 * prefix_score
            + config.suffix_weight as f64 * suffix_score
            + config.position_weight as f64 * position_score)
            / total_weight;
        let better = match best {
            None => true,
            Some(current) => score > current.score,
        };
        if better {
            best = Some(Match {
                start: candidate.start,
                end: candidate.end,
                score,
            });
        }
    }
    best
}

/// Similarity of an expected string against the best-matching substring
/// of `window`: `1 - minErrors / expectedLen`. An empty expectation is
/// a perfect match.
fn similarity(window: &[char], expected: &str) -> f64 {
    let expected_chars: Vec<char> = expected.chars().collect();
    if expected_chars.is_empty() {
        return 1.0;
    }
    let errors_at = scan_errors(window, &expected_chars);
    let min_errors = errors_at.iter().copied().min().unwrap_or(expected_chars.len());
    1.0 - (min_errors.min(expected_chars.len()) as f64 / expected_chars.len() as f64)
}

/// Sellers edit-distance scan: `result[i]` is the minimum edit distance
/// between `pattern` and some substring of `text` ending at char `i`.
fn scan_errors(text: &[char], pattern: &[char]) -> Vec<usize> {
    let m = pattern.len();
    let mut column: Vec<usize> = (0..=m).collect();
    let mut result = Vec::with_capacity(text.len() + 1);
    result.push(column[m]);
    for &ch in text {
        let mut prev_diagonal = column[0];
        for j in 1..=m {
            let previous = column[j];
            let cost = usize::from(pattern[j - 1] != ch);
            column[j] = (prev_diagonal + cost)
                .min(column[j - 1] + 1)
                .min(previous + 1);
            prev_diagonal = previous;
        }
        result.push(column[m]);
    }
    result
}

/// Recover the start of a match that ends at `end` with `errors`
/// errors, by aligning the reversed pattern against the reversed tail.
fn find_start(text: &[char], pattern: &[char], end: usize, errors: usize) -> usize {
    let window_start = end.saturating_sub(pattern.len() + errors);
    let reversed_text: Vec<char> = text[window_start..end].iter().rev().copied().collect();
    let reversed_pattern: Vec<char> = pattern.iter().rev().copied().collect();
    let errors_at = scan_errors(&reversed_text, &reversed_pattern);
    let min_errors = errors_at
        .iter()
        .copied()
        .min()
        .unwrap_or(pattern.len());
    let span = errors_at
        .iter()
        .position(|&e| e == min_errors)
        .unwrap_or(pattern.len());
    end - span
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEXT: &str = "The quick brown fox jumps over the lazy dog.";

    #[test]
    fn test_exact_match_with_context_scores_one() {
        let m = match_quote(
            TEXT,
            "brown fox",
            MatchContext {
                prefix: Some("quick "),
                suffix: Some(" jumps"),
                hint: None,
            },
            &MatchConfig::default(),
        )
        .unwrap();
        assert_eq!(m.start, 10);
        assert_eq!(m.end, 19);
        assert_eq!(m.score, 1.0);
    }

    #[test]
    fn test_transposed_quote_single_candidate() {
        let corrupted = TEXT.replace("brown fox", "brown fxo");
        let m = match_quote(
            &corrupted,
            "brown fox",
            MatchContext {
                prefix: Some("quick "),
                suffix: Some(" jumps"),
                hint: None,
            },
            &MatchConfig::default(),
        )
        .unwrap();
        assert_eq!(m.start, 10);
        assert!(m.score > 0.85, "score {} too low", m.score);
        assert!(m.score < 1.0, "score {} not penalized", m.score);
    }

    #[test]
    fn test_empty_quote_yields_none() {
        assert_eq!(
            match_quote(TEXT, "", MatchContext::default(), &MatchConfig::default()),
            None
        );
    }

    #[test]
    fn test_unmatchable_quote_yields_none() {
        assert_eq!(
            match_quote(
                TEXT,
                "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxx",
                MatchContext::default(),
                &MatchConfig::default()
            ),
            None
        );
    }

    #[test]
    fn test_exact_occurrences_shadow_fuzzy_search() {
        // "fax" appears exactly; "fox" is one error away. The exact
        // occurrence must win with a full quote-score component.
        let text = "a fox here, a fax there";
        let m = match_quote(text, "fax", MatchContext::default(), &MatchConfig::default())
            .unwrap();
        assert_eq!((m.start, m.end), (14, 17));
        assert_eq!(m.score, 1.0);
    }

    #[test]
    fn test_hint_breaks_ties_between_occurrences() {
        let text = "one match here and one match there";
        let near_start = match_quote(
            text,
            "match",
            MatchContext {
                hint: Some(0),
                ..Default::default()
            },
            &MatchConfig::default(),
        )
        .unwrap();
        assert_eq!(near_start.start, 4);

        let near_end = match_quote(
            text,
            "match",
            MatchContext {
                hint: Some(23),
                ..Default::default()
            },
            &MatchConfig::default(),
        )
        .unwrap();
        assert_eq!(near_end.start, 23);
    }

    #[test]
    fn test_context_disambiguates_occurrences() {
        let text = "red pen, blue pen";
        let m = match_quote(
            text,
            "pen",
            MatchContext {
                prefix: Some("blue "),
                suffix: None,
                hint: None,
            },
            &MatchConfig::default(),
        )
        .unwrap();
        assert_eq!(m.start, 14);
    }

    #[test]
    fn test_custom_weights_change_ranking() {
        // With position weight dominating, the hint outranks context.
        let text = "red pen, blue pen";
        let config = MatchConfig {
            quote_weight: 1,
            prefix_weight: 0,
            suffix_weight: 0,
            position_weight: 100,
            max_error_cap: 256,
        };
        let m = match_quote(
            text,
            "pen",
            MatchContext {
                prefix: Some("blue "),
                suffix: None,
                hint: Some(4),
            },
            &config,
        )
        .unwrap();
        assert_eq!(m.start, 4);
    }

    #[test]
    fn test_error_budget_is_capped() {
        // quote_len / 2 would allow 3 errors; a cap of 1 forbids them.
        let config = MatchConfig {
            max_error_cap: 1,
            ..Default::default()
        };
        let result = match_quote(TEXT, "brXXn fox", MatchContext::default(), &config);
        assert_eq!(result, None);
    }

    proptest! {
        #[test]
        fn test_matcher_is_deterministic(
            text in "[ab ]{0,40}",
            quote in "[ab ]{1,8}",
            hint in proptest::option::of(0usize..40),
        ) {
            let context = MatchContext { prefix: None, suffix: None, hint };
            let first = match_quote(&text, &quote, context, &MatchConfig::default());
            let second = match_quote(&text, &quote, context, &MatchConfig::default());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn test_verbatim_slice_scores_one(
            text in "[abc ]{5,40}",
            start in 0usize..5,
            len in 1usize..5,
        ) {
            let quote: String = text.chars().skip(start).take(len).collect();
            prop_assume!(!quote.is_empty());
            let m = match_quote(&text, &quote, MatchContext::default(), &MatchConfig::default())
                .expect("verbatim slice must match");
            prop_assert_eq!(m.score, 1.0);
        }
    }
}
