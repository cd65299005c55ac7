//! Tokens and the token forest.
//!
//! The forest owns the source text, the root token sequence, and an arena of
//! entries. Each entry holds its own token sequence, bounded by its begin
//! and end delimiter tokens when it has them, and is represented in its
//! parent sequence by a single `Entry` token spanning the whole construct.

use std::fmt::Write as _;

use crate::context::ContextKind;
use crate::delim::DelimId;
use crate::error::{LineIndex, ParseError};
use crate::grammar::{ContextId, Grammar};
use crate::value::Value;

/// Index of an entry in its [`TokenForest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u32);

impl EntryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A token sequence: the root, or the interior of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqRef {
    Root,
    Entry(EntryId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenTag {
    /// Literal source text.
    Raw,
    Delim(DelimId),
    /// Representative of a nested entry. Inside an operator entry, the
    /// operator itself is retagged to point at its own entry.
    Entry(EntryId),
    /// Value produced by a parse rule.
    Sub(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub start: usize,
    pub len: usize,
    pub tag: TokenTag,
}

impl Token {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn text<'t>(&self, source: &'t str) -> &'t str {
        source.get(self.start..self.end()).unwrap_or("")
    }

    pub fn entry(&self) -> Option<EntryId> {
        match self.tag {
            TokenTag::Entry(id) => Some(id),
            _ => None,
        }
    }

    pub fn delim(&self) -> Option<DelimId> {
        match self.tag {
            TokenTag::Delim(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.tag, TokenTag::Raw)
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub context: ContextId,
    pub kind: ContextKind,
    pub parent: Option<EntryId>,
    pub tokens: Vec<Token>,
    /// Delimiter that opened the entry; its token is `tokens[0]`.
    pub begin: Option<DelimId>,
    /// Delimiter that closed the entry; its token is the last one.
    pub end: Option<DelimId>,
    /// Operator that produced the entry, for folded operator results.
    pub op: Option<DelimId>,
    pub closed: bool,
}

impl Entry {
    /// Token indexes between the begin and end delimiter tokens.
    pub fn interior_range(&self) -> std::ops::Range<usize> {
        let first = usize::from(self.begin.is_some()).min(self.tokens.len());
        let last = self
            .tokens
            .len()
            .saturating_sub(usize::from(self.end.is_some()));
        first..last.max(first)
    }

    pub fn interior(&self) -> &[Token] {
        &self.tokens[self.interior_range()]
    }

    pub fn start(&self) -> usize {
        self.tokens.first().map_or(0, |t| t.start)
    }

    pub fn end_offset(&self) -> usize {
        self.tokens.last().map_or(0, |t| t.end())
    }

    pub fn is_text(&self) -> bool {
        self.kind == ContextKind::Text
    }

    pub fn is_comment(&self) -> bool {
        self.kind == ContextKind::Comment
    }

    pub fn is_operator(&self) -> bool {
        self.op.is_some()
    }

    /// Brackets that can hold a nested structure.
    pub fn is_nesting(&self) -> bool {
        matches!(self.kind, ContextKind::Group | ContextKind::Enclosure)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenForest {
    text: String,
    root: Vec<Token>,
    entries: Vec<Entry>,
    lines: LineIndex,
}

impl TokenForest {
    pub fn new(text: impl Into<String>) -> Self {
        TokenForest {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &[Token] {
        &self.root
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.index()]
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    /// Every token of a sequence, delimiters included.
    pub fn seq(&self, seq: SeqRef) -> &[Token] {
        match seq {
            SeqRef::Root => &self.root,
            SeqRef::Entry(id) => &self.entries[id.index()].tokens,
        }
    }

    /// The tokens of a sequence without an entry's begin/end delimiters.
    pub fn interior(&self, seq: SeqRef) -> &[Token] {
        match seq {
            SeqRef::Root => &self.root,
            SeqRef::Entry(id) => self.entries[id.index()].interior(),
        }
    }

    pub(crate) fn seq_mut(&mut self, seq: SeqRef) -> &mut Vec<Token> {
        match seq {
            SeqRef::Root => &mut self.root,
            SeqRef::Entry(id) => &mut self.entries[id.index()].tokens,
        }
    }

    pub(crate) fn entry_mut(&mut self, id: EntryId) -> &mut Entry {
        &mut self.entries[id.index()]
    }

    pub(crate) fn lines_mut(&mut self) -> &mut LineIndex {
        &mut self.lines
    }

    pub(crate) fn push_entry(&mut self, entry: Entry) -> EntryId {
        let id = EntryId(self.entries.len() as u32);
        self.entries.push(entry);
        id
    }

    /// Depth of a sequence below the root (root is 0).
    pub fn depth_of(&self, seq: SeqRef) -> usize {
        let mut depth = 0;
        let mut current = match seq {
            SeqRef::Root => None,
            SeqRef::Entry(id) => Some(id),
        };
        while let Some(id) = current {
            depth += 1;
            current = self.entries[id.index()].parent;
        }
        depth
    }

    /// Whether `token`, found in `seq`, is the operator marker of the entry
    /// that owns `seq`.
    pub fn is_marker(&self, seq: SeqRef, token: &Token) -> bool {
        matches!((seq, &token.tag), (SeqRef::Entry(owner), TokenTag::Entry(id)) if owner == *id)
    }

    pub fn token_text(&self, token: &Token) -> &str {
        token.text(&self.text)
    }

    /// Source slice covered by an entry, begin and end delimiters included.
    pub fn span_text(&self, id: EntryId) -> &str {
        let entry = self.entry(id);
        self.text.get(entry.start()..entry.end_offset()).unwrap_or("")
    }

    /// Decoded interior of a string or char literal: raw runs are copied,
    /// escape substitutions contribute their value.
    pub fn literal_text(&self, id: EntryId) -> String {
        let mut out = String::new();
        for token in self.entry(id).interior() {
            match &token.tag {
                TokenTag::Sub(value) => {
                    let _ = write!(out, "{}", value);
                }
                _ => out.push_str(self.token_text(token)),
            }
        }
        out
    }

    pub fn error_at(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError::at(offset, &self.lines, message)
    }

    /// Replace `count` tokens of `seq` starting at `start` with a new
    /// operator entry, moving the run into it. The token at `marker` (an
    /// index inside the run) becomes the entry's self-referencing marker.
    pub fn fold(
        &mut self,
        seq: SeqRef,
        start: usize,
        count: usize,
        marker: usize,
        context: ContextId,
        op: DelimId,
    ) -> EntryId {
        let id = EntryId(self.entries.len() as u32);
        let parent = match seq {
            SeqRef::Root => None,
            SeqRef::Entry(owner) => Some(owner),
        };
        let tokens = self.seq_mut(seq);
        let span_start = tokens[start].start;
        let span_end = tokens[start + count - 1].end();
        let representative = Token {
            start: span_start,
            len: span_end - span_start,
            tag: TokenTag::Entry(id),
        };
        let mut run: Vec<Token> = tokens
            .splice(start..start + count, std::iter::once(representative))
            .collect();
        for token in &run {
            if let TokenTag::Entry(child) = token.tag {
                self.entries[child.index()].parent = Some(id);
            }
        }
        run[marker].tag = TokenTag::Entry(id);
        self.entries.push(Entry {
            context,
            kind: ContextKind::Operator,
            parent,
            tokens: run,
            begin: None,
            end: None,
            op: Some(op),
            closed: true,
        });
        id
    }

    // ──────────────────────────────────────────
    // Rendering
    // ──────────────────────────────────────────

    /// Re-render the token stream with single spaces between tokens.
    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        self.render_seq(SeqRef::Root, &mut parts);
        parts.join(" ")
    }

    fn render_seq<'s>(&'s self, seq: SeqRef, parts: &mut Vec<&'s str>) {
        // explicit stack: folded operator chains nest as deep as they are long
        let mut stack = vec![(seq, 0usize)];
        while let Some((seq, index)) = stack.pop() {
            let Some(token) = self.seq(seq).get(index) else {
                continue;
            };
            stack.push((seq, index + 1));
            match token.tag {
                TokenTag::Entry(id) if !self.is_marker(seq, token) => {
                    let entry = self.entry(id);
                    if entry.is_text() || entry.is_comment() {
                        parts.push(self.span_text(id).trim_end_matches(['\n', '\r']));
                    } else {
                        stack.push((SeqRef::Entry(id), 0));
                    }
                }
                _ => parts.push(self.token_text(token)),
            }
        }
    }

    /// Indented dump of the tree, one entry per line, for diagnostics.
    pub fn debug_tree(&self, grammar: &Grammar) -> String {
        let mut out = String::new();
        self.debug_seq(grammar, SeqRef::Root, 0, &mut out);
        out
    }

    fn debug_seq(&self, grammar: &Grammar, seq: SeqRef, depth: usize, out: &mut String) {
        for token in self.seq(seq) {
            match token.tag {
                TokenTag::Entry(id) if !self.is_marker(seq, token) => {
                    let entry = self.entry(id);
                    out.push('\n');
                    out.push_str(&"  ".repeat(depth + 1));
                    out.push_str(grammar.context_name(entry.context));
                    out.push_str(": ");
                    self.debug_seq(grammar, SeqRef::Entry(id), depth + 1, out);
                }
                TokenTag::Sub(ref value) => {
                    let _ = write!(out, "[{}:{}]", value.type_name(), value);
                }
                TokenTag::Delim(d) => {
                    let _ = write!(out, "[{}]", grammar.delim(d).display_text().escape_debug());
                }
                _ => {
                    let _ = write!(out, "[{}]", self.token_text(token));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(start: usize, len: usize) -> Token {
        Token {
            start,
            len,
            tag: TokenTag::Raw,
        }
    }

    #[test]
    fn fold_moves_run_into_new_entry() {
        let mut forest = TokenForest::new("a + b c");
        forest.root = vec![
            raw(0, 1),
            Token {
                start: 2,
                len: 1,
                tag: TokenTag::Delim(DelimId(0)),
            },
            raw(4, 1),
            raw(6, 1),
        ];
        let id = forest.fold(SeqRef::Root, 0, 3, 1, ContextId(0), DelimId(0));
        assert_eq!(forest.root().len(), 2);
        assert_eq!(forest.root()[0].tag, TokenTag::Entry(id));
        assert_eq!((forest.root()[0].start, forest.root()[0].len), (0, 5));
        let entry = forest.entry(id);
        assert_eq!(entry.tokens.len(), 3);
        assert!(forest.is_marker(SeqRef::Entry(id), &entry.tokens[1]));
        assert_eq!(entry.interior().len(), 3);
        assert_eq!(forest.depth_of(SeqRef::Entry(id)), 1);
        assert_eq!(forest.render(), "a + b c");
    }

    #[test]
    fn interior_excludes_delimiters() {
        let entry = Entry {
            context: ContextId(0),
            kind: ContextKind::Enclosure,
            parent: None,
            tokens: vec![raw(0, 1), raw(1, 1), raw(2, 1)],
            begin: Some(DelimId(0)),
            end: Some(DelimId(1)),
            op: None,
            closed: true,
        };
        assert_eq!(entry.interior_range(), 1..2);
        let unclosed = Entry {
            end: None,
            tokens: vec![raw(0, 1)],
            ..entry
        };
        assert_eq!(unclosed.interior_range(), 1..1);
    }
}
