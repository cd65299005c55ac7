//! Delimiter definitions: boundary markers with optional literal
//! sub-parsers, context transitions, and operator metadata.

use std::cmp::Ordering;

use crate::operators::{Fold, OpSite};
use crate::resolve::Resolver;
use crate::token::{EntryId, TokenForest};
use crate::value::Value;

/// Index of a delimiter inside its [`crate::Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelimId(pub(crate) u32);

impl DelimId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Custom literal sub-parser, invoked with the full text and the byte
/// offset where the delimiter matched.
pub type ParseRule = fn(&str, usize) -> ParseOutcome;

/// Extra condition checked after the delimiter text matched.
pub type Predicate = fn(&str, usize) -> bool;

/// Builds the folded entry for an operator token.
pub type SyntaxFn = fn(&mut TokenForest, &OpSite) -> Result<Fold, String>;

/// Computes the value of a folded operator entry (or of a context entry,
/// when installed as a context resolver).
pub type ResolveFn = fn(&mut Resolver<'_>, EntryId) -> Value;

/// What a parse rule consumed and produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// Bytes consumed, counted from the delimiter's own offset.
    pub consumed: usize,
    /// Replaces the delimiter token when present.
    pub value: Option<Value>,
    pub error: Option<RuleError>,
}

impl ParseOutcome {
    pub fn new(consumed: usize, value: Value) -> Self {
        ParseOutcome {
            consumed,
            value: Some(value),
            error: None,
        }
    }

    pub fn failed(consumed: usize, offset: usize, message: impl Into<String>) -> Self {
        ParseOutcome {
            consumed,
            value: None,
            error: Some(RuleError {
                offset,
                message: message.into(),
            }),
        }
    }

    pub fn with_error(mut self, offset: usize, message: impl Into<String>) -> Self {
        self.error = Some(RuleError {
            offset,
            message: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Positional parse rule failure; `offset` is absolute in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleError {
    pub offset: usize,
    pub message: String,
}

/// Context transition carried by a delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRole {
    pub context: String,
    pub start: bool,
    pub end: bool,
    /// Closing through this delimiter is reported as a lexical error.
    pub error: Option<String>,
}

/// Operator metadata carried by a delimiter.
#[derive(Debug, Clone)]
pub struct OperatorDef {
    /// Lower binds tighter.
    pub precedence: u32,
    /// Name of the operator context the folded entry belongs to.
    pub context: String,
    pub syntax: SyntaxFn,
    pub resolve: ResolveFn,
}

#[derive(Debug, Clone)]
pub enum DelimRole {
    Plain,
    Context(ContextRole),
    Operator(OperatorDef),
}

#[derive(Debug, Clone)]
pub struct Delim {
    pub text: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub parse_rule: Option<ParseRule>,
    pub extra: Option<Predicate>,
    /// Non-printable delimiters render as empty text.
    pub printable: bool,
    pub role: DelimRole,
}

impl Delim {
    pub fn plain(text: impl Into<String>) -> Self {
        Delim {
            text: text.into(),
            name: None,
            description: None,
            parse_rule: None,
            extra: None,
            printable: true,
            role: DelimRole::Plain,
        }
    }

    fn with_context(text: impl Into<String>, context: &str, start: bool, end: bool) -> Self {
        Delim {
            role: DelimRole::Context(ContextRole {
                context: context.to_owned(),
                start,
                end,
                error: None,
            }),
            ..Delim::plain(text)
        }
    }

    /// Opens a new entry of `context`.
    pub fn opens(text: impl Into<String>, context: &str) -> Self {
        Self::with_context(text, context, true, false)
    }

    /// Closes the innermost open entry of `context`.
    pub fn closes(text: impl Into<String>, context: &str) -> Self {
        Self::with_context(text, context, false, true)
    }

    /// Closes `context` but reports `message` at the delimiter, e.g. a line
    /// break inside a string literal.
    pub fn closes_with_error(text: impl Into<String>, context: &str, message: &str) -> Self {
        let mut delim = Self::closes(text, context);
        if let DelimRole::Context(role) = &mut delim.role {
            role.error = Some(message.to_owned());
        }
        delim
    }

    /// Closes `context` when it is current, opens it otherwise (quotes).
    pub fn toggles(text: impl Into<String>, context: &str) -> Self {
        Self::with_context(text, context, true, true)
    }

    /// Names a context without transitioning (number literals).
    pub fn within(text: impl Into<String>, context: &str) -> Self {
        Self::with_context(text, context, false, false)
    }

    pub fn operator(text: impl Into<String>, def: OperatorDef) -> Self {
        Delim {
            role: DelimRole::Operator(def),
            ..Delim::plain(text)
        }
    }

    pub fn with_rule(mut self, rule: ParseRule) -> Self {
        self.parse_rule = Some(rule);
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.extra = Some(predicate);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.printable = false;
        self
    }

    pub fn first_char(&self) -> Option<char> {
        self.text.chars().next()
    }

    pub fn context_role(&self) -> Option<&ContextRole> {
        match &self.role {
            DelimRole::Context(role) => Some(role),
            _ => None,
        }
    }

    pub fn operator_def(&self) -> Option<&OperatorDef> {
        match &self.role {
            DelimRole::Operator(def) => Some(def),
            _ => None,
        }
    }

    /// Name of the context this delimiter refers to, if any.
    pub fn target_name(&self) -> Option<&str> {
        match &self.role {
            DelimRole::Plain => None,
            DelimRole::Context(role) => Some(&role.context),
            DelimRole::Operator(def) => Some(&def.context),
        }
    }

    /// Whether the delimiter matches `text` at byte offset `index`.
    pub fn is_at(&self, text: &str, index: usize) -> bool {
        match text.get(index..) {
            Some(rest) if rest.starts_with(&self.text) => {}
            _ => return false,
        }
        match self.extra {
            Some(predicate) => predicate(text, index),
            None => true,
        }
    }

    /// Display text; empty for non-printable delimiters.
    pub fn display_text(&self) -> &str {
        if self.printable {
            &self.text
        } else {
            ""
        }
    }

    /// Lookup order: first char, longer text first, then lexicographic,
    /// then delimiters with an extra predicate before those without.
    pub fn lookup_order(&self, other: &Delim) -> Ordering {
        self.first_char()
            .cmp(&other.first_char())
            .then_with(|| other.text.len().cmp(&self.text.len()))
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| other.extra.is_some().cmp(&self.extra.is_some()))
    }
}

impl From<&str> for Delim {
    fn from(text: &str) -> Self {
        Delim::plain(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_is_digit(text: &str, index: usize) -> bool {
        text.as_bytes()
            .get(index + 1)
            .is_some_and(|b| b.is_ascii_digit())
    }

    #[test]
    fn is_at_checks_text_then_predicate() {
        let d = Delim::plain("-").with_predicate(next_is_digit);
        assert!(d.is_at("a -1", 2));
        assert!(!d.is_at("a - 1", 2));
        assert!(!d.is_at("a", 5));
    }

    #[test]
    fn lookup_order_prefers_longer_then_predicate() {
        let mut delims = vec![
            Delim::plain("-"),
            Delim::plain("->"),
            Delim::plain("-").with_predicate(next_is_digit),
            Delim::plain("+"),
            Delim::plain("--"),
        ];
        delims.sort_by(|a, b| a.lookup_order(b));
        let texts: Vec<&str> = delims.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["+", "--", "->", "-", "-"]);
        assert!(delims[3].extra.is_some());
        assert!(delims[4].extra.is_none());
    }

    #[test]
    fn hidden_delimiters_render_empty() {
        let d = Delim::closes("\n", "//").hidden();
        assert_eq!(d.display_text(), "");
        assert_eq!(d.target_name(), Some("//"));
    }
}
