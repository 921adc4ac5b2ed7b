//! Line references with content checksums.
//!
//! A caller addressing an edit by line number is working from a possibly
//! stale observation of the file. References therefore carry an optional
//! two-character checksum of the line's text as it was last seen
//! (`"42:ab"`); verification recomputes the checksum against the file as
//! currently read and hands back the authoritative text on mismatch, so a
//! corrected retry needs no extra read round trip.
//!
//! The checksum is a staleness hint, not a security control. It is the low
//! byte of `xxh3_64` over the line's exact text, rendered as two lowercase
//! hex digits; collisions are acceptable.

use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// A parsed `"42"` or `"42:ab"` line reference. 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReference {
    pub line: usize,
    pub checksum: Option<String>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LineRefError {
    #[error("empty line reference")]
    Empty,

    #[error("invalid line number '{0}' (expected a 1-indexed integer like '42' or '42:ab')")]
    InvalidLineNumber(String),

    #[error("line numbers are 1-indexed; 0 is not a valid line")]
    ZeroLine,

    #[error("invalid checksum '{0}' (expected exactly two lowercase hex digits, e.g. '42:ab')")]
    InvalidChecksum(String),
}

/// Result of verifying a checksummed reference against current content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
    /// Checksum of the line as it exists right now.
    pub actual_checksum: String,
    /// The line's current text.
    pub actual_text: String,
}

/// Parse a line reference. Invalid syntax is a hard error, never a
/// fallback to a different addressing mode.
pub fn parse(input: &str) -> Result<LineReference, LineRefError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(LineRefError::Empty);
    }

    let (number_part, checksum_part) = match input.split_once(':') {
        Some((n, c)) => (n, Some(c)),
        None => (input, None),
    };

    let line: usize = number_part
        .parse()
        .map_err(|_| LineRefError::InvalidLineNumber(input.to_string()))?;
    if line == 0 {
        return Err(LineRefError::ZeroLine);
    }

    let checksum = match checksum_part {
        Some(c) => {
            if c.len() != 2 || !c.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
                return Err(LineRefError::InvalidChecksum(c.to_string()));
            }
            Some(c.to_string())
        }
        None => None,
    };

    Ok(LineReference { line, checksum })
}

/// Two-character checksum of a single line's exact text.
pub fn checksum(line: &str) -> String {
    format!("{:02x}", xxh3_64(line.as_bytes()) as u8)
}

/// Recompute the checksum for `line` (1-indexed) from the current lines and
/// compare against `expected`. Returns `None` when the line is out of range.
pub fn verify(line: usize, expected: &str, current_lines: &[&str]) -> Option<Verification> {
    let text = *current_lines.get(line.checked_sub(1)?)?;
    let actual_checksum = checksum(text);
    Some(Verification {
        valid: actual_checksum == expected,
        actual_checksum,
        actual_text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_line_number() {
        assert_eq!(
            parse("42").unwrap(),
            LineReference {
                line: 42,
                checksum: None
            }
        );
    }

    #[test]
    fn parses_checksummed_reference() {
        assert_eq!(
            parse("42:ab").unwrap(),
            LineReference {
                line: 42,
                checksum: Some("ab".to_string())
            }
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse("abc"), Err(LineRefError::InvalidLineNumber(_))));
        assert!(matches!(parse(""), Err(LineRefError::Empty)));
        assert_eq!(parse("0"), Err(LineRefError::ZeroLine));
    }

    #[test]
    fn rejects_malformed_checksums() {
        assert!(matches!(parse("42:abc"), Err(LineRefError::InvalidChecksum(_))));
        assert!(matches!(parse("42:a"), Err(LineRefError::InvalidChecksum(_))));
        assert!(matches!(parse("42:AB"), Err(LineRefError::InvalidChecksum(_))));
        assert!(matches!(parse("42:zz"), Err(LineRefError::InvalidChecksum(_))));
    }

    #[test]
    fn checksum_is_deterministic() {
        assert_eq!(checksum("let x = 1;"), checksum("let x = 1;"));
    }

    #[test]
    fn checksum_is_two_lowercase_hex_chars() {
        for line in ["", "a", "let x = 1;", "    indented"] {
            let cs = checksum(line);
            assert_eq!(cs.len(), 2);
            assert!(cs.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        }
    }

    #[test]
    fn checksum_depends_only_on_the_line() {
        // Same line text, different neighbors: checksum unchanged.
        assert_eq!(checksum("shared line"), checksum("shared line"));
        // Whitespace differences matter.
        assert_ne!(checksum("let x = 1;"), checksum(" let x = 1;"));
    }

    #[test]
    fn verify_accepts_fresh_reference() {
        let lines = vec!["alpha", "beta"];
        let v = verify(2, &checksum("beta"), &lines).unwrap();
        assert!(v.valid);
        assert_eq!(v.actual_text, "beta");
    }

    #[test]
    fn verify_reports_authoritative_content_on_mismatch() {
        let lines = vec!["alpha", "beta"];
        let v = verify(2, "ff", &lines).unwrap();
        assert!(!v.valid);
        assert_eq!(v.actual_checksum, checksum("beta"));
        assert_eq!(v.actual_text, "beta");
    }

    #[test]
    fn verify_out_of_range_is_none() {
        let lines = vec!["only"];
        assert!(verify(2, "ab", &lines).is_none());
        assert!(verify(0, "ab", &lines).is_none());
    }
}
