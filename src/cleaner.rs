//! Heuristic cleanup of model-generated replacement text.
//!
//! Replacement blocks produced by a language model routinely carry
//! artifacts of the context they were shown: the `N:cc | ` observation
//! prefixes, or a repetition of the line just outside the range being
//! edited. Applying such a block verbatim would silently duplicate code,
//! so the cleaner runs three passes in a fixed order and reports every
//! correction it made. Silent content changes are never fully invisible.

use crate::symbol::{detect_base_indent, reindent};
use std::fmt;
use tracing::debug;

/// Where an inserted block lands relative to its anchor range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
}

impl InsertPosition {
    /// Parse a caller-supplied position value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "before" => Some(InsertPosition::Before),
            "after" => Some(InsertPosition::After),
            _ => None,
        }
    }
}

impl fmt::Display for InsertPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertPosition::Before => write!(f, "before"),
            InsertPosition::After => write!(f, "after"),
        }
    }
}

/// A correction the cleaner applied, reported by name in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
    StrippedLinePrefixes,
    DroppedLeadingEcho,
    DroppedTrailingEcho,
    Reindented,
}

impl fmt::Display for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Cleanup::StrippedLinePrefixes => "stripped line-number prefixes",
            Cleanup::DroppedLeadingEcho => "dropped duplicated leading line",
            Cleanup::DroppedTrailingEcho => "dropped duplicated trailing line",
            Cleanup::Reindented => "reindented to the surrounding block",
        };
        f.write_str(text)
    }
}

/// Cleaned replacement text plus the corrections that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    pub text: String,
    pub applied: Vec<Cleanup>,
}

/// Run the cleanup passes over `new_text`.
///
/// `start_line`/`end_line` are the 1-indexed inclusive target range in
/// `file_lines`; for insertions they name the anchor range the block is
/// inserted relative to. Passes, in order:
///
/// 1. strip `N:cc | ` observation prefixes from each line
/// 2. drop echoed boundary/anchor lines (blank lines never trigger this)
/// 3. replace mode only: reindent to the replaced block's base indent
pub fn clean(
    new_text: &str,
    file_lines: &[&str],
    start_line: usize,
    end_line: usize,
    position: Option<InsertPosition>,
) -> Cleaned {
    let mut applied = Vec::new();

    let (body, had_trailing_newline) = match new_text.strip_suffix('\n') {
        Some(b) => (b, true),
        None => (new_text, false),
    };
    let mut lines: Vec<String> = body.split('\n').map(str::to_string).collect();

    // Pass 1: observation-format prefixes.
    let mut stripped_any = false;
    for line in &mut lines {
        if let Some(rest) = strip_observation_prefix(line) {
            *line = rest.to_string();
            stripped_any = true;
        }
    }
    if stripped_any {
        applied.push(Cleanup::StrippedLinePrefixes);
    }

    // Pass 2: echoed boundary lines.
    match position {
        None => {
            if let Some(before) = start_line
                .checked_sub(2)
                .and_then(|i| file_lines.get(i))
            {
                if echoes(lines.first(), before) {
                    lines.remove(0);
                    applied.push(Cleanup::DroppedLeadingEcho);
                }
            }
            if let Some(after) = file_lines.get(end_line) {
                if echoes(lines.last(), after) {
                    lines.pop();
                    applied.push(Cleanup::DroppedTrailingEcho);
                }
            }
        }
        Some(InsertPosition::After) => {
            if let Some(anchor) = file_lines.get(end_line.wrapping_sub(1)) {
                if echoes(lines.first(), anchor) {
                    lines.remove(0);
                    applied.push(Cleanup::DroppedLeadingEcho);
                }
            }
        }
        Some(InsertPosition::Before) => {
            if let Some(anchor) = file_lines.get(start_line.wrapping_sub(1)) {
                if echoes(lines.last(), anchor) {
                    lines.pop();
                    applied.push(Cleanup::DroppedTrailingEcho);
                }
            }
        }
    }

    let mut text = lines.join("\n");

    // Pass 3: indentation, replace mode only.
    if position.is_none() && !text.trim().is_empty() {
        let target = replaced_block_indent(file_lines, start_line, end_line);
        let reindented = reindent(&text, target);
        if reindented != text {
            text = reindented;
            applied.push(Cleanup::Reindented);
        }
    }

    if had_trailing_newline && !text.is_empty() {
        text.push('\n');
    }

    if !applied.is_empty() {
        debug!(?applied, "replacement text cleaned");
    }

    Cleaned { text, applied }
}

/// A non-blank replacement line echoing a non-blank file line, compared
/// trimmed. Blank lines are not meaningful evidence of an echo.
fn echoes(candidate: Option<&String>, existing: &str) -> bool {
    match candidate {
        Some(line) => {
            let line = line.trim();
            let existing = existing.trim();
            !line.is_empty() && line == existing
        }
        None => false,
    }
}

/// Base indent of the lines about to be replaced.
fn replaced_block_indent<'a>(
    file_lines: &[&'a str],
    start_line: usize,
    end_line: usize,
) -> &'a str {
    for line in file_lines
        .iter()
        .take(end_line.min(file_lines.len()))
        .skip(start_line.saturating_sub(1))
    {
        if !line.trim().is_empty() {
            return detect_base_indent(line);
        }
    }
    ""
}

/// Strip a leading `"<line>:<cc> | "` (or `"<line> | "`) observation
/// prefix, tolerating the `>` change marker and alignment spaces. Returns
/// the remainder when the line carries such a prefix.
fn strip_observation_prefix(line: &str) -> Option<&str> {
    let mut rest = line.trim_start_matches([' ', '\t']);
    if let Some(after_marker) = rest.strip_prefix('>') {
        rest = after_marker.trim_start_matches(' ');
    }

    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    rest = &rest[digits..];

    if let Some(after_colon) = rest.strip_prefix(':') {
        let checksum_ok = after_colon.len() >= 2
            && after_colon
                .bytes()
                .take(2)
                .all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase());
        if !checksum_ok {
            return None;
        }
        rest = &after_colon[2..];
    }

    rest.strip_prefix(" | ")
}
