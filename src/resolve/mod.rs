//! Match resolution: locating a caller-supplied snippet in file content.
//!
//! A language model describing "where to edit" rarely reproduces the file's
//! exact bytes: indentation drifts, tabs become spaces, blocks get quoted at
//! a different nesting depth. Instead of one clever fuzzy matcher, the
//! resolver runs a fixed cascade of increasingly permissive strategies and
//! stops at the first success:
//!
//! 1. exact substring
//! 2. per-line trimmed comparison
//! 3. horizontal-whitespace normalization
//! 4. relative-indentation comparison
//!
//! Whatever matched, the returned span always indexes into the *original*
//! content. Substitution never happens against a normalized copy; that is
//! what makes the replacement safe to splice byte-for-byte.

mod strategies;

use strategies::StrategyHit;
use thiserror::Error;
use tracing::debug;

/// Which cascade stage produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    Exact,
    LineTrimmed,
    WhitespaceNormalized,
    IndentFlexible,
}

impl MatchStrategy {
    /// Human-readable strategy name for responses and logs.
    pub fn name(&self) -> &'static str {
        match self {
            MatchStrategy::Exact => "exact",
            MatchStrategy::LineTrimmed => "line-trimmed",
            MatchStrategy::WhitespaceNormalized => "whitespace-normalized",
            MatchStrategy::IndentFlexible => "indent-flexible",
        }
    }
}

/// A resolved match inside the original file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Verbatim text of the first match, sliced from the original content.
    pub matched_text: String,
    /// Byte span of `matched_text` in the original content.
    pub byte_start: usize,
    pub byte_end: usize,
    /// The strategy that produced the match.
    pub strategy: MatchStrategy,
    /// Total candidate occurrences seen by that strategy.
    pub occurrences: usize,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MatchError {
    #[error("search text is empty or whitespace-only")]
    EmptySnippet,

    #[error("search text not found in file content")]
    NotFound,
}

/// The cascade, in fixed order. First success wins.
const CASCADE: &[(MatchStrategy, fn(&str, &str) -> Option<StrategyHit>)] = &[
    (MatchStrategy::Exact, strategies::exact),
    (MatchStrategy::LineTrimmed, strategies::line_trimmed),
    (
        MatchStrategy::WhitespaceNormalized,
        strategies::whitespace_normalized,
    ),
    (MatchStrategy::IndentFlexible, strategies::indent_flexible),
];

/// Find the best match for `snippet` inside `content`.
///
/// Strategies are tried in cascade order and the first one that matches
/// wins; `MatchError::NotFound` is returned only after all four are
/// exhausted. Whitespace-only snippets are rejected before resolution
/// begins; pure insertions need a different addressing mode.
pub fn find_match(content: &str, snippet: &str) -> Result<MatchResult, MatchError> {
    if snippet.trim().is_empty() {
        return Err(MatchError::EmptySnippet);
    }

    for (strategy, try_match) in CASCADE {
        match try_match(content, snippet) {
            Some(hit) => {
                debug!(
                    strategy = strategy.name(),
                    occurrences = hit.occurrences,
                    "snippet matched"
                );
                return Ok(MatchResult {
                    matched_text: content[hit.byte_start..hit.byte_end].to_string(),
                    byte_start: hit.byte_start,
                    byte_end: hit.byte_end,
                    strategy: *strategy,
                    occurrences: hit.occurrences,
                });
            }
            None => {
                debug!(strategy = strategy.name(), "no match");
            }
        }
    }

    Err(MatchError::NotFound)
}

/// Best-effort "did you mean" lookup for not-found errors.
///
/// Scans for the content line most similar to the snippet's first non-blank
/// line. Returns the 1-indexed line number and its text when the similarity
/// clears a usefulness threshold.
pub fn closest_line(content: &str, snippet: &str) -> Option<(usize, String)> {
    let probe = snippet.lines().find(|l| !l.trim().is_empty())?.trim();

    let mut best: Option<(f64, usize, &str)> = None;
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let score = strsim::normalized_levenshtein(probe, trimmed);
        if best.map_or(true, |(s, _, _)| score > s) {
            best = Some((score, idx + 1, line));
        }
    }

    match best {
        Some((score, number, line)) if score >= 0.5 => Some((number, line.to_string())),
        _ => None,
    }
}
