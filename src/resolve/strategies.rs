//! The individual matching strategies of the resolution cascade.
//!
//! Every strategy shares one signature: given the file content and the
//! caller's search snippet, return the first matching span plus the total
//! number of candidate occurrences, or `None`. Spans always index into the
//! *original* content, so the text they cover round-trips byte-for-byte.

/// A successful strategy application: the first matching span (lowest file
/// offset) and how many candidate windows matched in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StrategyHit {
    pub byte_start: usize,
    pub byte_end: usize,
    pub occurrences: usize,
}

/// Exact substring search.
pub(crate) fn exact(content: &str, snippet: &str) -> Option<StrategyHit> {
    let byte_start = content.find(snippet)?;
    Some(StrategyHit {
        byte_start,
        byte_end: byte_start + snippet.len(),
        occurrences: content.matches(snippet).count(),
    })
}

/// Per-line trimmed comparison over a sliding window.
///
/// Both sides are split into lines and trimmed before comparing; the
/// returned span covers the *untrimmed* window in the original content.
/// Blank snippet lines must align with blank content lines but are never
/// evidence of a match on their own.
pub(crate) fn line_trimmed(content: &str, snippet: &str) -> Option<StrategyHit> {
    let (snippet_body, trailing_newline) = split_trailing_newline(snippet);
    let needle: Vec<&str> = snippet_body.split('\n').collect();
    let lines = line_spans(content);

    if needle.is_empty() || needle.len() > lines.len() {
        return None;
    }
    // A snippet that trims to nothing carries no evidence.
    if needle.iter().all(|l| l.trim().is_empty()) {
        return None;
    }

    let mut first: Option<(usize, usize)> = None;
    let mut occurrences = 0;

    for start in 0..=(lines.len() - needle.len()) {
        let window = &lines[start..start + needle.len()];
        let matches = needle
            .iter()
            .zip(window.iter())
            .all(|(n, &(ls, le))| n.trim() == content[ls..le].trim());

        if matches {
            occurrences += 1;
            if first.is_none() {
                let span_start = window[0].0;
                let span_end = window[window.len() - 1].1;
                first = Some((span_start, span_end));
            }
        }
    }

    let (byte_start, mut byte_end) = first?;
    if trailing_newline && content[byte_end..].starts_with('\n') {
        byte_end += 1;
    }
    Some(StrategyHit {
        byte_start,
        byte_end,
        occurrences,
    })
}

/// Horizontal-whitespace-normalized search.
///
/// Runs of spaces and tabs collapse to a single space in both strings; the
/// normalized snippet is then searched inside the normalized content, and
/// the hit is mapped back to original byte offsets through a parallel index
/// array built during normalization. The end of the span extends through
/// any trailing whitespace run that was collapsed, so the covered original
/// bytes reproduce exactly.
pub(crate) fn whitespace_normalized(content: &str, snippet: &str) -> Option<StrategyHit> {
    let needle = normalize_ws(snippet);
    if needle.is_empty() {
        return None;
    }

    let (haystack, starts, ends) = normalize_ws_indexed(content);

    let mut first: Option<(usize, usize)> = None;
    let mut occurrences = 0;
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(&needle) {
        let at = from + rel;
        occurrences += 1;
        if first.is_none() {
            let byte_start = starts[at];
            let byte_end = ends[at + needle.len() - 1];
            first = Some((byte_start, byte_end));
        }
        from = at + needle.len();
    }

    let (byte_start, byte_end) = first?;
    Some(StrategyHit {
        byte_start,
        byte_end,
        occurrences,
    })
}

/// Relative-indentation comparison over a sliding window.
///
/// The minimum leading-whitespace width over non-blank lines is computed
/// independently for the window and the snippet, stripped from each side,
/// and the dedented lines compared. Code extracted at a different nesting
/// depth still matches as long as its internal indentation shape agrees.
pub(crate) fn indent_flexible(content: &str, snippet: &str) -> Option<StrategyHit> {
    let (snippet_body, trailing_newline) = split_trailing_newline(snippet);
    let needle: Vec<&str> = snippet_body.split('\n').collect();
    let lines = line_spans(content);

    if needle.is_empty() || needle.len() > lines.len() {
        return None;
    }
    if needle.iter().all(|l| l.trim().is_empty()) {
        return None;
    }

    let needle_dedent = min_indent(needle.iter().copied());
    let dedented_needle: Vec<&str> = needle.iter().map(|l| dedent(l, needle_dedent)).collect();

    let mut first: Option<(usize, usize)> = None;
    let mut occurrences = 0;

    for start in 0..=(lines.len() - needle.len()) {
        let window = &lines[start..start + needle.len()];
        let window_dedent = min_indent(window.iter().map(|&(ls, le)| &content[ls..le]));

        let matches = dedented_needle.iter().zip(window.iter()).all(|(n, &(ls, le))| {
            let w = dedent(&content[ls..le], window_dedent);
            if n.trim().is_empty() {
                w.trim().is_empty()
            } else {
                *n == w
            }
        });

        if matches {
            occurrences += 1;
            if first.is_none() {
                first = Some((window[0].0, window[window.len() - 1].1));
            }
        }
    }

    let (byte_start, mut byte_end) = first?;
    if trailing_newline && content[byte_end..].starts_with('\n') {
        byte_end += 1;
    }
    Some(StrategyHit {
        byte_start,
        byte_end,
        occurrences,
    })
}

/// Byte spans of every line in `content`, excluding the terminating newline.
fn line_spans(content: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, b) in content.bytes().enumerate() {
        if b == b'\n' {
            spans.push((start, i));
            start = i + 1;
        }
    }
    spans.push((start, content.len()));
    spans
}

/// Strip at most one trailing newline, reporting whether it was present.
fn split_trailing_newline(snippet: &str) -> (&str, bool) {
    match snippet.strip_suffix('\n') {
        Some(body) => (body, true),
        None => (snippet, false),
    }
}

/// Collapse runs of horizontal whitespace to a single space.
fn normalize_ws(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if ch == ' ' || ch == '\t' {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

/// Normalize like [`normalize_ws`], additionally building per-byte maps
/// from the normalized string back to original byte offsets.
///
/// `starts[i]` is the original offset where normalized byte `i` begins;
/// `ends[i]` is one past the original text it stands for. A collapsed
/// whitespace run maps a single normalized space to the whole run.
fn normalize_ws_indexed(text: &str) -> (String, Vec<usize>, Vec<usize>) {
    let mut out = String::with_capacity(text.len());
    let mut starts = Vec::with_capacity(text.len());
    let mut ends = Vec::with_capacity(text.len());

    let mut chars = text.char_indices().peekable();
    while let Some((offset, ch)) = chars.next() {
        if ch == ' ' || ch == '\t' {
            let mut run_end = offset + ch.len_utf8();
            while let Some(&(next_offset, next_ch)) = chars.peek() {
                if next_ch == ' ' || next_ch == '\t' {
                    run_end = next_offset + next_ch.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            out.push(' ');
            starts.push(offset);
            ends.push(run_end);
        } else {
            let ch_end = offset + ch.len_utf8();
            for _ in 0..ch.len_utf8() {
                starts.push(offset);
                ends.push(ch_end);
            }
            out.push(ch);
        }
    }

    (out, starts, ends)
}

/// Minimum leading-whitespace width (in bytes) over non-blank lines.
fn min_indent<'a>(lines: impl Iterator<Item = &'a str>) -> usize {
    lines
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0)
}

/// Strip `width` leading bytes from a non-blank line; blank lines pass
/// through untouched.
fn dedent(line: &str, width: usize) -> &str {
    if line.trim().is_empty() {
        return line;
    }
    let cut = width.min(line.len());
    if line.is_char_boundary(cut) {
        &line[cut..]
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_finds_substring() {
        let hit = exact("aaa bbb ccc", "bbb").unwrap();
        assert_eq!((hit.byte_start, hit.byte_end), (4, 7));
        assert_eq!(hit.occurrences, 1);
    }

    #[test]
    fn exact_counts_all_occurrences() {
        let hit = exact("x y x y x", "x").unwrap();
        assert_eq!(hit.byte_start, 0);
        assert_eq!(hit.occurrences, 3);
    }

    #[test]
    fn line_trimmed_ignores_indentation_drift() {
        let content = "fn main() {\n    let x = 1;\n}\n";
        let hit = line_trimmed(content, "let x = 1;").unwrap();
        assert_eq!(&content[hit.byte_start..hit.byte_end], "    let x = 1;");
        assert_eq!(hit.occurrences, 1);
    }

    #[test]
    fn line_trimmed_rejects_blank_snippet() {
        assert!(line_trimmed("a\n\nb\n", "   \n  ").is_none());
    }

    #[test]
    fn line_trimmed_multi_line_window() {
        let content = "if ready {\n        go();\n        stop();\n}\n";
        let hit = line_trimmed(content, "go();\nstop();").unwrap();
        assert_eq!(
            &content[hit.byte_start..hit.byte_end],
            "        go();\n        stop();"
        );
    }

    #[test]
    fn line_trimmed_extends_through_trailing_newline() {
        let content = "alpha\nbeta\ngamma\n";
        let hit = line_trimmed(content, "beta\n").unwrap();
        assert_eq!(&content[hit.byte_start..hit.byte_end], "beta\n");
    }

    #[test]
    fn whitespace_normalized_collapses_runs() {
        let content = "let  x\t=  1;";
        let hit = whitespace_normalized(content, "let x = 1;").unwrap();
        assert_eq!(&content[hit.byte_start..hit.byte_end], "let  x\t=  1;");
    }

    #[test]
    fn whitespace_normalized_span_round_trips() {
        let content = "a   b   c";
        let hit = whitespace_normalized(content, "a b").unwrap();
        assert_eq!(&content[hit.byte_start..hit.byte_end], "a   b");
    }

    #[test]
    fn whitespace_normalized_extends_trailing_run() {
        // A snippet ending in whitespace covers the whole collapsed run.
        let content = "a   b";
        let hit = whitespace_normalized(content, "a ").unwrap();
        assert_eq!(&content[hit.byte_start..hit.byte_end], "a   ");
    }

    #[test]
    fn whitespace_normalized_counts_occurrences() {
        let content = "f( a,  b )\nf( a, b )\n";
        let hit = whitespace_normalized(content, "f( a, b )").unwrap();
        assert_eq!(hit.occurrences, 2);
        assert_eq!(hit.byte_start, 0);
    }

    #[test]
    fn indent_flexible_matches_shifted_block() {
        let content = "mod outer {\n    fn f() {\n        a();\n    }\n}\n";
        let snippet = "fn f() {\n    a();\n}";
        let hit = indent_flexible(content, snippet).unwrap();
        assert_eq!(
            &content[hit.byte_start..hit.byte_end],
            "    fn f() {\n        a();\n    }"
        );
    }

    #[test]
    fn indent_flexible_requires_same_shape() {
        let content = "    a();\n        b();\n";
        // Snippet has the two lines at the same depth; content does not.
        assert!(indent_flexible(content, "a();\nb();").is_none());
    }

    #[test]
    fn normalize_index_maps_multibyte_text() {
        let content = "é   ß x";
        let hit = whitespace_normalized(content, "é ß").unwrap();
        assert_eq!(&content[hit.byte_start..hit.byte_end], "é   ß");
    }

    #[test]
    fn min_indent_skips_blank_lines() {
        let lines = ["    a", "", "  b"];
        assert_eq!(min_indent(lines.iter().copied()), 2);
    }
}
