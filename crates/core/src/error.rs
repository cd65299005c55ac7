use serde::{Deserialize, Serialize};
use std::fmt;

/// A positioned input error. Renders as `@{row},{col}: {message}`.
///
/// `row` is 1-based. `col` is the 1-based byte offset from the preceding
/// newline (or from the start of input on the first row).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseError {
    pub row: usize,
    pub col: usize,
    pub message: String,
    /// Valid alternatives, filled in for name lookup failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<String>,
}

impl ParseError {
    pub fn new(row: usize, col: usize, message: impl Into<String>) -> Self {
        ParseError {
            row,
            col,
            message: message.into(),
            candidates: Vec::new(),
        }
    }

    /// Build an error for a byte offset, resolving row/col through `lines`.
    pub fn at(offset: usize, lines: &LineIndex, message: impl Into<String>) -> Self {
        let (row, col) = lines.position_of(offset);
        ParseError::new(row, col, message)
    }

    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Serialize with every field present, candidates included even when empty.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "candidates": self.candidates,
            "col":        self.col,
            "message":    self.message,
            "row":        self.row,
        })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{},{}: {}", self.row, self.col, self.message)
    }
}

impl std::error::Error for ParseError {}

// ──────────────────────────────────────────────
// Newline index
// ──────────────────────────────────────────────

/// Byte offsets of every `'\n'` seen while tokenizing, in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index for a whole text in one pass.
    pub fn of(text: &str) -> Self {
        LineIndex {
            newlines: text
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i)
                .collect(),
        }
    }

    /// Record a newline offset. Offsets must arrive in ascending order;
    /// repeats are ignored.
    pub fn push(&mut self, offset: usize) {
        match self.newlines.last() {
            Some(&last) if last >= offset => {}
            _ => self.newlines.push(offset),
        }
    }

    pub fn len(&self) -> usize {
        self.newlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.newlines.is_empty()
    }

    /// Resolve a byte offset to a (row, col) pair, both 1-based.
    pub fn position_of(&self, offset: usize) -> (usize, usize) {
        // number of newlines strictly before `offset`
        let row = match self.newlines.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i,
        };
        let col = if row == 0 {
            offset + 1
        } else {
            offset - self.newlines[row - 1]
        };
        (row + 1, col)
    }
}

// ──────────────────────────────────────────────
// Configuration errors
// ──────────────────────────────────────────────

/// A grammar that cannot be built. These signal setup bugs, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("context '{0}' is not registered")]
    UnknownContext(String),

    #[error("context '{0}' is registered twice")]
    DuplicateContext(String),

    #[error("delimiter in context '{context}' has empty text")]
    EmptyDelimiter { context: String },

    #[error("operator '{text}' targets context '{target}', which is not an operator context")]
    NotAnOperatorContext { text: String, target: String },
}

/// Failure loading a [`crate::config::ParseConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("max_depth and max_fold_depth must be at least 1")]
    ZeroDepth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let e = ParseError::new(3, 7, "missing closing token");
        assert_eq!(e.to_string(), "@3,7: missing closing token");
    }

    #[test]
    fn position_on_first_row_is_one_based() {
        let lines = LineIndex::of("abc");
        assert_eq!(lines.position_of(0), (1, 1));
        assert_eq!(lines.position_of(2), (1, 3));
    }

    #[test]
    fn position_after_newlines() {
        let lines = LineIndex::of("ab\ncd\nef");
        assert_eq!(lines.len(), 2);
        // 'c' sits right after the first newline
        assert_eq!(lines.position_of(3), (2, 1));
        assert_eq!(lines.position_of(4), (2, 2));
        // 'f'
        assert_eq!(lines.position_of(7), (3, 2));
    }

    #[test]
    fn push_ignores_repeats() {
        let mut lines = LineIndex::new();
        lines.push(4);
        lines.push(4);
        lines.push(2);
        lines.push(9);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn json_includes_empty_candidates() {
        let e = ParseError::new(1, 2, "x");
        let v = e.to_json_value();
        assert_eq!(v["candidates"], serde_json::json!([]));
        assert_eq!(v["row"], 1);
    }

    #[test]
    fn serde_skips_empty_candidates() {
        let e = ParseError::new(1, 2, "x");
        let s = serde_json::to_string(&e).unwrap();
        assert!(!s.contains("candidates"), "{}", s);
        let back: ParseError = serde_json::from_str(&s).unwrap();
        assert_eq!(back, e);
    }
}
