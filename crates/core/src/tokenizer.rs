//! Context-sensitive tokenizer.
//!
//! A single left-to-right scan over the text. At each position the current
//! context's delimiter table is consulted; a match ends the pending literal,
//! runs the delimiter's parse rule if it has one, and applies its context
//! transition. Interior tokens of an open entry are written straight into
//! that entry's own sequence.

use crate::config::ParseConfig;
use crate::delim::DelimId;
use crate::diagnostics::{default_sink, Diagnostics};
use crate::error::ParseError;
use crate::grammar::{ContextId, Grammar};
use crate::token::{Entry, EntryId, SeqRef, Token, TokenForest, TokenTag};

/// Output of a tokenizer pass.
#[derive(Debug, Clone)]
pub struct Tokenized {
    pub forest: TokenForest,
    pub errors: Vec<ParseError>,
}

impl Tokenized {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Tokenize `text` with the grammar's default context and settings.
pub fn tokenize(grammar: &Grammar, text: &str) -> Tokenized {
    Tokenizer::new(grammar).tokenize(text)
}

pub struct Tokenizer<'g> {
    grammar: &'g Grammar,
    config: ParseConfig,
    diagnostics: &'g dyn Diagnostics,
    start: Option<ContextId>,
}

impl<'g> Tokenizer<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Tokenizer {
            grammar,
            config: ParseConfig::default(),
            diagnostics: default_sink(),
            start: None,
        }
    }

    pub fn with_config(mut self, config: ParseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: &'g dyn Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Scan in `context` instead of the grammar's default context.
    pub fn start_context(mut self, context: ContextId) -> Self {
        self.start = Some(context);
        self
    }

    pub fn tokenize(&self, text: &str) -> Tokenized {
        let base = self.start.unwrap_or_else(|| self.grammar.default_context());
        let mut scan = Scan {
            grammar: self.grammar,
            max_depth: self.config.max_depth,
            text,
            index: 0,
            base,
            current: base,
            stack: Vec::new(),
            literal: None,
            forest: TokenForest::new(text),
            pending: Vec::new(),
        };
        scan.run();

        let Scan { forest, pending, .. } = scan;
        let errors: Vec<ParseError> = pending
            .into_iter()
            .map(|(offset, message)| forest.error_at(offset, message))
            .collect();
        for error in &errors {
            self.diagnostics.error(&error.to_string());
        }
        self.diagnostics.log(&forest.debug_tree(self.grammar));
        Tokenized { forest, errors }
    }
}

// ──────────────────────────────────────────────
// Scan state
// ──────────────────────────────────────────────

struct Scan<'t, 'g> {
    grammar: &'g Grammar,
    max_depth: usize,
    text: &'t str,
    index: usize,
    base: ContextId,
    current: ContextId,
    stack: Vec<EntryId>,
    literal: Option<usize>,
    forest: TokenForest,
    // (offset, message); positions are resolved once every newline is known
    pending: Vec<(usize, String)>,
}

/// What the character at the scan position is.
enum Step {
    Delimiter(DelimId),
    /// Whitespace of the current context: ends a literal, emits nothing.
    Skip(usize),
    Literal(usize),
}

impl Scan<'_, '_> {
    fn step(&self, c: char) -> Step {
        if let Some(d) = self.grammar.delimiter_at(self.current, self.text, self.index) {
            Step::Delimiter(d)
        } else if self.grammar.context(self.current).is_whitespace(c) {
            Step::Skip(c.len_utf8())
        } else {
            Step::Literal(c.len_utf8())
        }
    }

    fn run(&mut self) {
        while let Some(c) = self.text[self.index..].chars().next() {
            match self.step(c) {
                Step::Delimiter(d) => {
                    self.flush();
                    self.delimiter(d);
                }
                Step::Skip(width) => {
                    self.flush();
                    self.advance_to(self.index + width);
                }
                Step::Literal(width) => {
                    self.literal.get_or_insert(self.index);
                    self.advance_to(self.index + width);
                }
            }
        }
        self.flush();
        self.close_all();
    }

    fn current_seq(&self) -> SeqRef {
        match self.stack.last() {
            Some(&id) => SeqRef::Entry(id),
            None => SeqRef::Root,
        }
    }

    fn push(&mut self, token: Token) {
        let seq = self.current_seq();
        self.forest.seq_mut(seq).push(token);
    }

    fn advance_to(&mut self, end: usize) {
        let end = end.min(self.text.len());
        for (i, b) in self.text.as_bytes()[self.index..end].iter().enumerate() {
            if *b == b'\n' {
                self.forest.lines_mut().push(self.index + i);
            }
        }
        self.index = end;
    }

    /// Emit the pending literal run, if any.
    fn flush(&mut self) {
        if let Some(start) = self.literal.take() {
            if self.index > start {
                self.push(Token {
                    start,
                    len: self.index - start,
                    tag: TokenTag::Raw,
                });
            }
        }
    }

    fn delimiter(&mut self, d: DelimId) {
        let grammar = self.grammar;
        let delim = grammar.delim(d);
        let start = self.index;
        let mut token = Token {
            start,
            len: delim.text.len(),
            tag: TokenTag::Delim(d),
        };
        if let Some(rule) = delim.parse_rule {
            let outcome = rule(self.text, start);
            if let Some(error) = outcome.error {
                self.pending.push((error.offset, error.message));
            }
            let mut len = outcome.consumed.max(delim.text.len());
            while !self.text.is_char_boundary(start + len) && start + len < self.text.len() {
                len += 1;
            }
            token.len = len.min(self.text.len() - start);
            if let Some(value) = outcome.value {
                token.tag = TokenTag::Sub(value);
            }
        }
        self.advance_to(token.end());

        if let (Some(role), Some(target)) = (delim.context_role(), grammar.target(d)) {
            if role.end && target == self.current && !self.stack.is_empty() {
                if let Some(message) = &role.error {
                    self.pending.push((start, message.clone()));
                }
                self.close(d, token);
                return;
            }
            if role.start {
                self.open(target, d, token);
                return;
            }
            if role.end {
                self.pending
                    .push((start, "unexpected context-ending token".to_owned()));
            }
        }
        self.push(token);
    }

    fn open(&mut self, context: ContextId, d: DelimId, token: Token) {
        if self.stack.len() >= self.max_depth {
            self.pending.push((token.start, "nesting too deep".to_owned()));
            self.push(token);
            return;
        }
        let parent = self.stack.last().copied();
        let (start, len) = (token.start, token.len);
        let id = self.forest.push_entry(Entry {
            context,
            kind: self.grammar.context(context).kind(),
            parent,
            tokens: vec![token],
            begin: Some(d),
            end: None,
            op: None,
            closed: false,
        });
        self.push(Token {
            start,
            len,
            tag: TokenTag::Entry(id),
        });
        self.stack.push(id);
        self.current = context;
    }

    fn close(&mut self, d: DelimId, token: Token) {
        let Some(id) = self.stack.pop() else {
            return;
        };
        let end = token.end();
        let entry = self.forest.entry_mut(id);
        entry.end = Some(d);
        entry.tokens.push(token);
        entry.closed = true;
        self.finish_entry(end);
    }

    /// Restore the enclosing context and stretch the representative token
    /// (always the last token of the parent sequence) to `end`.
    fn finish_entry(&mut self, end: usize) {
        self.current = match self.stack.last() {
            Some(&parent) => self.forest.entry(parent).context,
            None => self.base,
        };
        let seq = self.current_seq();
        if let Some(representative) = self.forest.seq_mut(seq).last_mut() {
            representative.len = end - representative.start;
        }
    }

    /// Force-close everything still open at end of input, innermost first.
    fn close_all(&mut self) {
        let end = self.text.len();
        while let Some(&id) = self.stack.last() {
            let entry = self.forest.entry(id);
            if !entry.is_comment() {
                let offset = entry.start();
                self.pending.push((offset, "missing closing token".to_owned()));
            }
            self.stack.pop();
            self.finish_entry(end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Level, Recorder};
    use crate::value::Value;

    fn standard(text: &str) -> Tokenized {
        tokenize(Grammar::standard(), text)
    }

    #[test]
    fn words_and_delimiters() {
        let t = standard("a = b;");
        assert!(t.success(), "{:?}", t.errors);
        let texts: Vec<&str> = t.forest.root().iter().map(|tok| t.forest.token_text(tok)).collect();
        assert_eq!(texts, vec!["a", "=", "b", ";"]);
        assert!(t.forest.root()[0].is_raw());
        assert!(t.forest.root()[1].delim().is_some());
    }

    #[test]
    fn string_entry_is_nested() {
        let t = standard(r#"x "a\tb" y"#);
        assert!(t.success(), "{:?}", t.errors);
        assert_eq!(t.forest.root().len(), 3);
        let id = t.forest.root()[1].entry().unwrap();
        assert_eq!(t.forest.span_text(id), r#""a\tb""#);
        assert_eq!(t.forest.literal_text(id), "a\tb");
        assert!(t.forest.entry(id).closed);
    }

    #[test]
    fn numbers_become_substitutions() {
        let t = standard("n = 0x1F + 2.5");
        let values: Vec<&Value> = t
            .forest
            .root()
            .iter()
            .filter_map(|tok| match &tok.tag {
                TokenTag::Sub(v) => Some(v),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![&Value::Int(31), &Value::Float(2.5)]);
    }

    #[test]
    fn unterminated_string_reports_once() {
        let t = standard("\"abc");
        assert_eq!(t.errors.len(), 1);
        assert_eq!(t.errors[0].message, "missing closing token");
        let rep = &t.forest.root()[0];
        assert_eq!(rep.end(), 4);
    }

    #[test]
    fn newline_inside_string_closes_it_with_error() {
        let t = standard("\"abc\nx");
        assert_eq!(t.errors.len(), 1);
        assert_eq!(t.errors[0].to_string(), "@1,5: missing closing token");
        assert_eq!(t.forest.root().len(), 2);
    }

    #[test]
    fn unterminated_comment_is_silent() {
        let t = standard("a /* never closed");
        assert!(t.success(), "{:?}", t.errors);
        let id = t.forest.root()[1].entry().unwrap();
        assert!(t.forest.entry(id).is_comment());
    }

    #[test]
    fn nested_brackets_track_parents() {
        let t = standard("{ a [ b ( c ) ] }");
        assert!(t.success());
        let brace = t.forest.root()[0].entry().unwrap();
        let bracket = t.forest.entry(brace).interior()[1].entry().unwrap();
        let paren = t.forest.entry(bracket).interior()[1].entry().unwrap();
        assert_eq!(t.forest.entry(paren).parent, Some(bracket));
        assert_eq!(t.forest.entry(bracket).parent, Some(brace));
        assert_eq!(t.forest.depth_of(SeqRef::Entry(paren)), 3);
    }

    #[test]
    fn error_positions_use_newline_index() {
        let t = standard("a\nb\n  \"x");
        assert_eq!(t.errors[0].to_string(), "@3,3: missing closing token");
        assert_eq!(t.forest.lines().len(), 2);
    }

    #[test]
    fn stray_closer_is_reported_and_kept() {
        let t = standard("a )");
        assert_eq!(t.errors.len(), 1, "{:?}", t.errors);
        assert_eq!(t.errors[0].to_string(), "@1,3: unexpected context-ending token");
        assert!(t.forest.root()[1].delim().is_some());

        let t = standard("( ] )");
        assert_eq!(t.errors.len(), 1, "{:?}", t.errors);
        assert_eq!(t.errors[0].to_string(), "@1,3: unexpected context-ending token");
        let paren = t.forest.root()[0].entry().unwrap();
        assert!(t.forest.entry(paren).closed);
    }

    #[test]
    fn doc_comment_closes_at_line_end() {
        let t = standard("/// about x
x");
        assert!(t.success(), "{:?}", t.errors);
        let id = t.forest.root()[0].entry().unwrap();
        assert!(t.forest.entry(id).is_comment());
        assert_eq!(
            Grammar::standard().context_name(t.forest.entry(id).context),
            "///"
        );
        assert_eq!(t.forest.token_text(&t.forest.root()[1]), "x");
    }

    #[test]
    fn depth_limit() {
        let t = Tokenizer::new(Grammar::standard())
            .with_config(ParseConfig::default().with_max_depth(2))
            .tokenize("((( x )))");
        assert!(t.errors.iter().any(|e| e.message == "nesting too deep"));
    }

    #[test]
    fn errors_reach_the_sink() {
        let recorder = Recorder::new();
        let t = Tokenizer::new(Grammar::standard())
            .with_diagnostics(&recorder)
            .tokenize("(a");
        assert_eq!(t.errors.len(), 1);
        assert_eq!(
            recorder.messages_at(Level::Error),
            vec!["@1,1: missing closing token".to_owned()]
        );
        assert_eq!(recorder.messages_at(Level::Log).len(), 1);
    }
}
