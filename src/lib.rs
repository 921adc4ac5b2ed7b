//! Drift Patcher: text patch resolution for AI coding agents
//!
//! A language model editing source files works from an observation of the
//! file that may already be stale or imprecise: indentation paraphrased,
//! line numbers shifted, context echoed back into the replacement. This
//! crate takes a structured edit request in one of three addressing modes
//! (named symbol, checksummed line reference, or literal text) and
//! deterministically locates and rewrites the right region of the file's
//! *current* content.
//!
//! # Architecture
//!
//! Resolution intelligence lives in the leaves; application stays dumb:
//!
//! - [`resolve`]: a fixed cascade of matching strategies, from exact
//!   substring to relative-indentation comparison. Matches always map back
//!   to verbatim spans of the original content.
//! - [`lineref`]: `"42:ab"`-style line references whose two-character
//!   checksums detect stale observations before an edit lands on the
//!   wrong line.
//! - [`symbol`]: symbol addressing via an injected structural-extraction
//!   capability, plus the indentation helpers used when splicing blocks.
//! - [`cleaner`]: strips artifacts typical of model-generated replacement
//!   text before it is applied.
//! - [`engine`]: the orchestrator tying the above together behind one
//!   [`engine::EditRequest`] → [`engine::EditOutcome`] operation.
//!
//! # Safety
//!
//! - Every call re-reads the file and re-resolves from scratch; no match
//!   state or symbol ranges survive between calls
//! - Substitution only ever happens against original file bytes
//! - The injected [`access::AccessGate`] is consulted before any file I/O
//! - Writes are atomic (tempfile + fsync + rename)
//! - A failed edit leaves the file untouched and reports a message the
//!   caller can act on without human help

pub mod access;
pub mod cleaner;
pub mod engine;
pub mod fsio;
pub mod lineref;
pub mod resolve;
pub mod symbol;

// Re-exports
pub use access::{AccessGate, WorkspaceGate};
pub use cleaner::{Cleaned, Cleanup, InsertPosition};
pub use engine::{EditEngine, EditOutcome, EditRequest, EngineError};
pub use fsio::{DiskFiles, FileAccess};
pub use lineref::{LineRefError, LineReference, Verification};
pub use resolve::{MatchError, MatchResult, MatchStrategy};
pub use symbol::{ExtractionError, RawSymbol, SymbolExtractor, SymbolMatch};
