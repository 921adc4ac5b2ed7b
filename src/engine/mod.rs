//! The edit orchestrator: one entry point for every addressing mode.
//!
//! An edit request names a file, replacement text, and exactly where the
//! replacement goes: by symbol, by line reference, or by literal text.
//! The orchestrator validates the request, consults the injected access
//! gate, re-reads the file from scratch, resolves the location with the
//! appropriate component, applies the mutation in memory, and writes the
//! whole file back. Nothing is cached between calls; re-reading and
//! re-resolving every time is what keeps stale matches from landing.
//!
//! Mode priority when several addressing fields are present:
//! symbol > line-targeted > text-match.
//!
//! Failures never escape raw. Every error becomes an `Error:`-prefixed
//! message that names the likely cause and the concrete next action, so
//! the caller can self-correct on the following attempt.

mod errors;
mod response;

pub use errors::EngineError;

use crate::access::AccessGate;
use crate::cleaner::{self, InsertPosition};
use crate::fsio::FileAccess;
use crate::lineref::{self, LineReference};
use crate::resolve::{self, MatchError, MatchStrategy};
use crate::symbol::{self, SymbolError, SymbolExtractor};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One structured edit request, the shape a tool-call layer hands over.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EditRequest {
    pub file_path: String,
    #[serde(default)]
    pub new_text: String,
    /// Literal text to replace (text-match mode).
    #[serde(default)]
    pub old_text: Option<String>,
    /// Named function/struct/method to target (symbol mode).
    #[serde(default)]
    pub symbol: Option<String>,
    /// `"before"` or `"after"`: insert relative to the target instead of
    /// replacing it.
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub replace_all: bool,
    /// Line reference like `"42"` or `"42:ab"` (line-targeted mode).
    #[serde(default)]
    pub start_line: Option<String>,
    #[serde(default)]
    pub end_line: Option<String>,
}

/// What one edit invocation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    pub success: bool,
    /// `Success:`- or `Error:`-prefixed, human-readable and stable enough
    /// to parse.
    pub message: String,
    /// 1-indexed inclusive range of newly written lines, when applicable.
    pub applied_lines: Option<(usize, usize)>,
}

/// A successful edit before rendering into an [`EditOutcome`].
#[derive(Debug, Clone)]
pub struct EditSuccess {
    pub message: String,
    pub applied_lines: Option<(usize, usize)>,
}

/// The patch resolution engine. Holds no state of its own beyond the
/// injected collaborators; every call starts from the file on disk.
pub struct EditEngine<'a> {
    files: &'a dyn FileAccess,
    symbols: &'a dyn SymbolExtractor,
    gate: &'a dyn AccessGate,
}

impl<'a> EditEngine<'a> {
    pub fn new(
        files: &'a dyn FileAccess,
        symbols: &'a dyn SymbolExtractor,
        gate: &'a dyn AccessGate,
    ) -> Self {
        Self {
            files,
            symbols,
            gate,
        }
    }

    /// Apply one edit request, rendering the result as an outcome whose
    /// message is safe to hand straight back to the caller.
    pub fn apply(&self, req: &EditRequest) -> EditOutcome {
        match self.try_apply(req) {
            Ok(success) => EditOutcome {
                success: true,
                message: format!("Success: {}", success.message),
                applied_lines: success.applied_lines,
            },
            Err(err) => {
                debug!(error = %err, "edit failed");
                EditOutcome {
                    success: false,
                    message: format!("Error: {err}"),
                    applied_lines: None,
                }
            }
        }
    }

    /// Typed variant of [`EditEngine::apply`].
    pub fn try_apply(&self, req: &EditRequest) -> Result<EditSuccess, EngineError> {
        if req.file_path.trim().is_empty() {
            return Err(EngineError::InvalidInput {
                reason: "file_path is empty".to_string(),
            });
        }
        let path = Path::new(&req.file_path);

        if !self.gate.is_path_allowed(path) {
            return Err(EngineError::PermissionDenied {
                path: req.file_path.clone(),
            });
        }
        if !self.gate.has_been_read(path) {
            return Err(EngineError::Unread {
                path: req.file_path.clone(),
            });
        }

        let raw = self.files.read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                EngineError::FileNotFound {
                    path: req.file_path.clone(),
                }
            } else {
                EngineError::Io(err)
            }
        })?;
        // Carriage returns are normalized exactly once, on entry.
        let content = raw.replace("\r\n", "\n");

        if let Some(name) = &req.symbol {
            self.apply_symbol(path, &content, name, req)
        } else if req.start_line.is_some() || req.end_line.is_some() {
            self.apply_line_targeted(path, &content, req)
        } else if let Some(old_text) = &req.old_text {
            self.apply_text_match(path, &content, old_text, req)
        } else {
            Err(EngineError::NoAddressing)
        }
    }

    fn apply_symbol(
        &self,
        path: &Path,
        content: &str,
        name: &str,
        req: &EditRequest,
    ) -> Result<EditSuccess, EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::InvalidInput {
                reason: "symbol name is empty".to_string(),
            });
        }
        let position = parse_position(req)?;

        // Always re-resolved: the file may have changed since the last call.
        let sym = symbol::locate(self.symbols, path, name).map_err(|err| match err {
            SymbolError::NotFound { symbol, path } => EngineError::SymbolNotFound { symbol, path },
            SymbolError::Extraction(inner) => inner.into(),
        })?;

        let (mut lines, trailing) = split_lines(content);
        if sym.start_line == 0 || sym.end_line < sym.start_line || sym.end_line > lines.len() {
            return Err(EngineError::LineOutOfRange {
                line: sym.end_line,
                line_count: lines.len(),
            });
        }

        match position {
            None if req.new_text.is_empty() => {
                lines.drain(sym.start_line - 1..sym.end_line);
                self.commit(path, content, &join_lines(&lines, trailing))?;
                Ok(EditSuccess {
                    message: format!(
                        "removed symbol '{name}' (lines {}-{}) from {}\n{}",
                        sym.start_line,
                        sym.end_line,
                        path.display(),
                        response::context_block(&lines, sym.start_line, sym.start_line - 1),
                    ),
                    applied_lines: None,
                })
            }
            None => {
                let block = symbol::reindent(one_trailing_newline_stripped(&req.new_text), &sym.base_indent);
                let replacement: Vec<String> = block.split('\n').map(str::to_string).collect();
                let last = sym.start_line + replacement.len() - 1;
                lines.splice(sym.start_line - 1..sym.end_line, replacement);
                self.commit(path, content, &join_lines(&lines, trailing))?;
                Ok(EditSuccess {
                    message: format!(
                        "replaced symbol '{name}' in {} (lines {}-{})\n{}",
                        path.display(),
                        sym.start_line,
                        last,
                        response::context_block(&lines, sym.start_line, last),
                    ),
                    applied_lines: Some((sym.start_line, last)),
                })
            }
            Some(pos) => {
                let line_views: Vec<&str> = lines.iter().map(String::as_str).collect();
                let cleaned = cleaner::clean(
                    &req.new_text,
                    &line_views,
                    sym.start_line,
                    sym.end_line,
                    Some(pos),
                );
                if cleaned.text.is_empty() {
                    return Err(EngineError::InvalidInput {
                        reason: "replacement text is empty; nothing to insert".to_string(),
                    });
                }
                let block =
                    symbol::reindent(one_trailing_newline_stripped(&cleaned.text), &sym.base_indent);
                let mut inserted: Vec<String> = block.split('\n').map(str::to_string).collect();
                let block_len = inserted.len();

                // One blank separator on the far side of the insertion from
                // the anchor symbol.
                let (insert_at, first, last) = match pos {
                    InsertPosition::After => {
                        inserted.push(String::new());
                        (sym.end_line, sym.end_line + 1, sym.end_line + block_len)
                    }
                    InsertPosition::Before => {
                        inserted.insert(0, String::new());
                        (
                            sym.start_line - 1,
                            sym.start_line + 1,
                            sym.start_line + block_len,
                        )
                    }
                };
                lines.splice(insert_at..insert_at, inserted);
                self.commit(path, content, &join_lines(&lines, trailing))?;
                Ok(EditSuccess {
                    message: format!(
                        "inserted {block_len} line(s) {pos} symbol '{name}' in {}{}\n{}",
                        path.display(),
                        response::cleanup_note(&cleaned.applied),
                        response::context_block(&lines, first, last),
                    ),
                    applied_lines: Some((first, last)),
                })
            }
        }
    }

    fn apply_line_targeted(
        &self,
        path: &Path,
        content: &str,
        req: &EditRequest,
    ) -> Result<EditSuccess, EngineError> {
        let position = parse_position(req)?;

        let start_ref = match &req.start_line {
            Some(raw) => lineref::parse(raw)?,
            None => {
                return Err(EngineError::InvalidInput {
                    reason: "start_line is required when addressing by line".to_string(),
                })
            }
        };
        let end_ref: Option<LineReference> = req
            .end_line
            .as_ref()
            .map(|raw| lineref::parse(raw))
            .transpose()?;

        let (mut lines, trailing) = split_lines(content);
        let start = start_ref.line;
        let end = end_ref.as_ref().map(|r| r.line).unwrap_or(start);
        if end < start {
            return Err(EngineError::InvalidRange { start, end });
        }
        // Line numbers are validated against the file as it exists right
        // now, not as the caller last saw it.
        for line in [start, end] {
            if line > lines.len() {
                return Err(EngineError::LineOutOfRange {
                    line,
                    line_count: lines.len(),
                });
            }
        }

        let line_views: Vec<&str> = lines.iter().map(String::as_str).collect();
        for reference in std::iter::once(&start_ref).chain(end_ref.as_ref()) {
            if let Some(expected) = &reference.checksum {
                let verification = lineref::verify(reference.line, expected, &line_views)
                    .expect("line bounds were checked above");
                if !verification.valid {
                    return Err(EngineError::StaleReference {
                        line: reference.line,
                        expected: expected.clone(),
                        actual_checksum: verification.actual_checksum,
                        actual_text: verification.actual_text,
                    });
                }
            }
        }

        let cleaned = cleaner::clean(&req.new_text, &line_views, start, end, position);

        match (cleaned.text.is_empty(), position) {
            (true, Some(_)) => Err(EngineError::InvalidInput {
                reason: "replacement text is empty; nothing to insert".to_string(),
            }),
            (true, None) => {
                lines.drain(start - 1..end);
                self.commit(path, content, &join_lines(&lines, trailing))?;
                Ok(EditSuccess {
                    message: format!(
                        "deleted lines {start}-{end} of {}\n{}",
                        path.display(),
                        response::context_block(&lines, start, start - 1),
                    ),
                    applied_lines: None,
                })
            }
            (false, None) => {
                let replacement: Vec<String> = one_trailing_newline_stripped(&cleaned.text)
                    .split('\n')
                    .map(str::to_string)
                    .collect();
                let last = start + replacement.len() - 1;
                lines.splice(start - 1..end, replacement);
                self.commit(path, content, &join_lines(&lines, trailing))?;
                Ok(EditSuccess {
                    message: format!(
                        "replaced lines {start}-{end} of {}{}\n{}",
                        path.display(),
                        response::cleanup_note(&cleaned.applied),
                        response::context_block(&lines, start, last),
                    ),
                    applied_lines: Some((start, last)),
                })
            }
            (false, Some(pos)) => {
                let inserted: Vec<String> = one_trailing_newline_stripped(&cleaned.text)
                    .split('\n')
                    .map(str::to_string)
                    .collect();
                let count = inserted.len();
                let (insert_at, first) = match pos {
                    InsertPosition::After => (end, end + 1),
                    InsertPosition::Before => (start - 1, start),
                };
                let last = first + count - 1;
                lines.splice(insert_at..insert_at, inserted);
                self.commit(path, content, &join_lines(&lines, trailing))?;
                Ok(EditSuccess {
                    message: format!(
                        "inserted {count} line(s) {pos} line {} of {}{}\n{}",
                        if pos == InsertPosition::After { end } else { start },
                        path.display(),
                        response::cleanup_note(&cleaned.applied),
                        response::context_block(&lines, first, last),
                    ),
                    applied_lines: Some((first, last)),
                })
            }
        }
    }

    fn apply_text_match(
        &self,
        path: &Path,
        content: &str,
        old_text: &str,
        req: &EditRequest,
    ) -> Result<EditSuccess, EngineError> {
        let matched = resolve::find_match(content, old_text).map_err(|err| match err {
            MatchError::EmptySnippet => EngineError::InvalidInput {
                reason: "old_text is empty or whitespace-only; for pure insertions use \
                         line-targeted or symbol addressing with a position"
                    .to_string(),
            },
            MatchError::NotFound => EngineError::MatchNotFound {
                hint: EngineError::not_found_hint(resolve::closest_line(content, old_text)),
            },
        })?;

        if matched.occurrences > 1 && !req.replace_all {
            return Err(EngineError::Ambiguous {
                count: matched.occurrences,
            });
        }

        let new_content = if req.replace_all {
            content.replace(&matched.matched_text, &req.new_text)
        } else {
            let mut rebuilt = String::with_capacity(
                content.len() + req.new_text.len() - matched.matched_text.len().min(content.len()),
            );
            rebuilt.push_str(&content[..matched.byte_start]);
            rebuilt.push_str(&req.new_text);
            rebuilt.push_str(&content[matched.byte_end..]);
            rebuilt
        };

        self.commit(path, content, &new_content)?;

        let via = match matched.strategy {
            MatchStrategy::Exact => String::new(),
            fuzzy => format!(" (matched via {} matching)", fuzzy.name()),
        };
        if req.replace_all {
            Ok(EditSuccess {
                message: format!(
                    "replaced {} occurrence(s) of old_text in {}{via}",
                    matched.occurrences,
                    path.display(),
                ),
                applied_lines: None,
            })
        } else {
            let first = content[..matched.byte_start].matches('\n').count() + 1;
            let applied_lines = if req.new_text.is_empty() {
                None
            } else {
                Some((first, first + req.new_text.matches('\n').count()))
            };
            Ok(EditSuccess {
                message: format!("replaced old_text in {}{via}", path.display()),
                applied_lines,
            })
        }
    }

    /// Write the mutated content back, rejecting edits that change nothing.
    fn commit(&self, path: &Path, original: &str, new_content: &str) -> Result<(), EngineError> {
        if new_content == original {
            return Err(EngineError::NoOp);
        }
        self.files.write(path, new_content)?;
        self.gate.mark_rewritten(path);
        Ok(())
    }
}

fn parse_position(req: &EditRequest) -> Result<Option<InsertPosition>, EngineError> {
    match &req.position {
        None => Ok(None),
        Some(raw) => InsertPosition::parse(raw)
            .map(Some)
            .ok_or_else(|| EngineError::InvalidInput {
                reason: format!("invalid position '{raw}'; expected 'before' or 'after'"),
            }),
    }
}

fn split_lines(content: &str) -> (Vec<String>, bool) {
    let trailing = content.ends_with('\n');
    let body = if trailing {
        &content[..content.len() - 1]
    } else {
        content
    };
    (body.split('\n').map(str::to_string).collect(), trailing)
}

fn join_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut joined = lines.join("\n");
    if trailing_newline {
        joined.push('\n');
    }
    joined
}

fn one_trailing_newline_stripped(text: &str) -> &str {
    text.strip_suffix('\n').unwrap_or(text)
}
