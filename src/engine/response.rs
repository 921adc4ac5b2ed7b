//! Response assembly: the context block a caller needs for its next edit.
//!
//! Successful line-targeted and symbol edits answer with the changed
//! region rendered in the observation format (each line prefixed with its
//! current number and checksum, newly written lines marked with `>`) plus
//! one line of context on either side. That is enough for the caller to
//! issue a correct follow-up edit without re-reading the whole file.

use crate::cleaner::Cleanup;
use crate::lineref;
use std::fmt::Write;

/// Render one line in the observation format.
pub(crate) fn observation_line(number: usize, text: &str) -> String {
    format!("{number}:{} | {text}", lineref::checksum(text))
}

/// Render the changed region with one context line on each side.
///
/// `marked_start..=marked_end` (1-indexed) are the newly written lines; an
/// inverted range marks nothing, which is how deletions render.
pub(crate) fn context_block(lines: &[String], marked_start: usize, marked_end: usize) -> String {
    if lines.is_empty() {
        return String::new();
    }

    let from = marked_start.saturating_sub(1).max(1);
    let to = marked_end
        .checked_add(1)
        .unwrap_or(marked_end)
        .max(marked_start)
        .min(lines.len());

    let mut out = String::new();
    for number in from..=to {
        let text = &lines[number - 1];
        let marker = if number >= marked_start && number <= marked_end {
            "> "
        } else {
            "  "
        };
        let _ = writeln!(out, "{marker}{}", observation_line(number, text));
    }
    out.pop();
    out
}

/// Render the cleanup notes appended to a success message.
pub(crate) fn cleanup_note(applied: &[Cleanup]) -> String {
    if applied.is_empty() {
        return String::new();
    }
    let names: Vec<String> = applied.iter().map(|c| c.to_string()).collect();
    format!("\nAdjustments applied to the replacement text: {}.", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(content: &str) -> Vec<String> {
        content.split('\n').map(str::to_string).collect()
    }

    #[test]
    fn marks_changed_lines_with_context() {
        let lines = lines("a\nb\nc\nd");
        let block = context_block(&lines, 2, 3);
        let rendered: Vec<&str> = block.lines().collect();
        assert_eq!(rendered.len(), 4);
        assert!(rendered[0].starts_with("  1:"));
        assert!(rendered[1].starts_with("> 2:"));
        assert!(rendered[2].starts_with("> 3:"));
        assert!(rendered[3].starts_with("  4:"));
        assert!(rendered[1].ends_with("| b"));
    }

    #[test]
    fn clamps_context_at_file_edges() {
        let lines = lines("a\nb");
        let block = context_block(&lines, 1, 2);
        let rendered: Vec<&str> = block.lines().collect();
        assert_eq!(rendered.len(), 2);
        assert!(rendered.iter().all(|l| l.starts_with("> ")));
    }

    #[test]
    fn deletion_renders_unmarked_neighbors() {
        let lines = lines("a\nb\nc");
        // Lines 2..=1 is an inverted range: nothing is new, show the seam.
        let block = context_block(&lines, 2, 1);
        let rendered: Vec<&str> = block.lines().collect();
        assert_eq!(rendered.len(), 2);
        assert!(rendered.iter().all(|l| l.starts_with("  ")));
    }

    #[test]
    fn observation_line_format() {
        let line = observation_line(7, "let x = 1;");
        assert!(line.starts_with("7:"));
        assert!(line.ends_with(" | let x = 1;"));
        assert_eq!(line.split(':').nth(1).unwrap().len(), 2 + " | let x = 1;".len());
    }
}
