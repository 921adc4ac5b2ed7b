//! The engine-boundary error taxonomy.
//!
//! Every failure that can reach the caller is a variant here, and every
//! message is written for a caller that will retry without human help: it
//! names the likely cause and the concrete next action. Failures from the
//! leaf modules convert into this taxonomy at the orchestrator boundary;
//! nothing below it is surfaced raw.

use crate::lineref::LineRefError;
use crate::symbol::ExtractionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(
        "no edit location given. Provide one of: 'symbol' (a named function/struct/method), \
         'start_line'/'end_line' (1-indexed, optionally checksummed like '42:ab'), or \
         'old_text' (literal text to replace)"
    )]
    NoAddressing,

    #[error("invalid request: {reason}")]
    InvalidInput { reason: String },

    #[error(
        "access to '{path}' is not allowed; edits must stay inside the workspace and outside \
         version-control and build directories"
    )]
    PermissionDenied { path: String },

    #[error(
        "'{path}' has not been read this session; read the file first so the edit is based on \
         its current content"
    )]
    Unread { path: String },

    #[error("file not found: '{path}'")]
    FileNotFound { path: String },

    #[error(
        "symbol '{symbol}' not found in '{path}'; check the name against the file's current \
         definitions, or fall back to old_text matching"
    )]
    SymbolNotFound { symbol: String, path: String },

    #[error(
        "old_text not found in the file{hint}. Re-read the region and copy the exact current \
         text, or address the edit by line number"
    )]
    MatchNotFound { hint: String },

    #[error(
        "old_text matches {count} locations; pass replace_all=true to change all of them, or \
         include more surrounding lines to make the match unique"
    )]
    Ambiguous { count: usize },

    #[error(
        "line {line} changed since it was last read: checksum '{expected}' no longer matches. \
         The line is currently {line}:{actual_checksum} | {actual_text}; retry with checksum \
         '{actual_checksum}'"
    )]
    StaleReference {
        line: usize,
        expected: String,
        actual_checksum: String,
        actual_text: String,
    },

    #[error("the edit produces identical content; the file was left unchanged")]
    NoOp,

    #[error("line {line} is out of range; the file currently has {line_count} lines")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("end_line {end} is before start_line {start}")]
    InvalidRange { start: usize, end: usize },

    #[error("invalid line reference: {0}")]
    LineRef(#[from] LineRefError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Render the "did you mean" suffix for [`EngineError::MatchNotFound`].
    pub(crate) fn not_found_hint(closest: Option<(usize, String)>) -> String {
        match closest {
            Some((line, text)) => format!("; the closest line is {line}: `{}`", text.trim_end()),
            None => String::new(),
        }
    }
}
