//! Symbol location via an external structural-extraction capability.
//!
//! Resolving a name like `parse_config` to a line range requires a real
//! parser; that lives outside this engine behind [`SymbolExtractor`],
//! addressed the way extraction services address code (`path#symbolName`).
//! This module adds no parsing of its own: it wraps the raw extraction
//! into a [`SymbolMatch`] with a derived base indent, and provides the
//! indentation helpers used when splicing replacement blocks.
//!
//! Symbol ranges are re-resolved on every call. The file may have been
//! mutated between edits, so nothing here is cached.

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// What the external extraction capability hands back for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbol {
    /// 1-indexed, inclusive.
    pub start_line: usize,
    pub end_line: usize,
    /// Exact source text of the symbol's definition.
    pub source_text: String,
}

/// Transport or service failure inside the extraction capability.
#[derive(Error, Debug)]
#[error("structural extraction failed: {0}")]
pub struct ExtractionError(pub String);

/// The external structural-extraction capability, addressed as
/// `path#symbolName`.
///
/// `Ok(None)` means the service answered and the symbol does not exist;
/// `Err` means the service itself failed.
pub trait SymbolExtractor {
    fn extract(&self, path: &Path, symbol: &str) -> Result<Option<RawSymbol>, ExtractionError>;
}

/// A located symbol, enriched with its base indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatch {
    /// 1-indexed, inclusive.
    pub start_line: usize,
    pub end_line: usize,
    pub source_text: String,
    /// Leading whitespace of the symbol's first non-blank line. Derived,
    /// never supplied by the extractor.
    pub base_indent: String,
}

#[derive(Error, Debug)]
pub enum SymbolError {
    #[error("symbol '{symbol}' not found in {path}")]
    NotFound { symbol: String, path: String },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Resolve `symbol` in `path` to a [`SymbolMatch`].
pub fn locate(
    extractor: &dyn SymbolExtractor,
    path: &Path,
    symbol: &str,
) -> Result<SymbolMatch, SymbolError> {
    let raw = extractor
        .extract(path, symbol)?
        .ok_or_else(|| SymbolError::NotFound {
            symbol: symbol.to_string(),
            path: path.display().to_string(),
        })?;

    debug!(
        symbol,
        start = raw.start_line,
        end = raw.end_line,
        "symbol resolved"
    );

    let base_indent = detect_base_indent(&raw.source_text).to_string();
    Ok(SymbolMatch {
        start_line: raw.start_line,
        end_line: raw.end_line,
        source_text: raw.source_text,
        base_indent,
    })
}

/// Leading whitespace of the first non-blank line of `text`.
pub fn detect_base_indent(text: &str) -> &str {
    for line in text.lines() {
        if !line.trim().is_empty() {
            return &line[..line.len() - line.trim_start().len()];
        }
    }
    ""
}

/// Rebase `text` onto `target_indent`.
///
/// The block's own base indent is detected, then every non-blank line that
/// starts with it has that prefix swapped for `target_indent`. Lines that
/// do not carry the detected prefix pass through unchanged, which tolerates
/// mixed indentation in caller-supplied replacement text.
pub fn reindent(text: &str, target_indent: &str) -> String {
    let own_indent = detect_base_indent(text);

    let mut out = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            out.push(line.to_string());
        } else if let Some(rest) = line.strip_prefix(own_indent) {
            out.push(format!("{target_indent}{rest}"));
        } else {
            out.push(line.to_string());
        }
    }
    out.join("\n")
}
