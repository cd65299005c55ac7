//! Value resolution over a folded token forest.
//!
//! Raw tokens resolve to their text, substitutions to their value, string
//! and char entries to their decoded text, operator entries through their
//! resolve callback, and any other entry to the simplified list of its
//! terms. Identifiers may be looked up in a [`Scope`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::config::ParseConfig;
use crate::context::ContextKind;
use crate::diagnostics::{default_sink, Diagnostics};
use crate::error::ParseError;
use crate::grammar::Grammar;
use crate::operators::OperatorResolver;
use crate::token::{EntryId, SeqRef, Token, TokenForest, TokenTag};
use crate::tokenizer::Tokenizer;
use crate::value::Value;
use crate::wildcard;

/// Named values available to expressions.
pub trait Scope {
    fn get(&self, name: &str) -> Option<Value>;

    /// Every name, in the order wildcard lookups should try them.
    fn names(&self) -> Vec<String>;
}

impl Scope for BTreeMap<String, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        BTreeMap::get(self, name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

impl Scope for HashMap<String, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        HashMap::get(self, name).cloned()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.keys().cloned().collect();
        names.sort();
        names
    }
}

pub struct Resolver<'a> {
    forest: &'a TokenForest,
    grammar: &'a Grammar,
    scope: Option<&'a dyn Scope>,
    config: ParseConfig,
    diagnostics: &'a dyn Diagnostics,
    errors: Vec<ParseError>,
    depth: usize,
    fold_depth: usize,
    // set once a depth limit is hit; nothing more is resolved or reported
    halted: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(forest: &'a TokenForest, grammar: &'a Grammar) -> Self {
        Resolver {
            forest,
            grammar,
            scope: None,
            config: ParseConfig::default(),
            diagnostics: default_sink(),
            errors: Vec::new(),
            depth: 0,
            fold_depth: 0,
            halted: false,
        }
    }

    pub fn with_scope(mut self, scope: &'a dyn Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_optional_scope(mut self, scope: Option<&'a dyn Scope>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_config(mut self, config: ParseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: &'a dyn Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn forest(&self) -> &'a TokenForest {
        self.forest
    }

    pub fn grammar(&self) -> &'a Grammar {
        self.grammar
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    pub fn error_at(&mut self, offset: usize, message: impl Into<String>) {
        if self.halted {
            return;
        }
        let error = self.forest.error_at(offset, message);
        self.diagnostics.error(&error.to_string());
        self.errors.push(error);
    }

    /// Report an error at the operator token of a folded entry.
    pub fn error_at_operator(&mut self, id: EntryId, message: impl Into<String>) {
        let seq = SeqRef::Entry(id);
        let entry = self.forest.entry(id);
        let offset = entry
            .tokens
            .iter()
            .find(|t| self.forest.is_marker(seq, t))
            .map_or(entry.start(), |t| t.start);
        self.error_at(offset, message);
    }

    /// Look `name` up in the scope, exactly or by wildcard.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let scope = self.scope?;
        if !wildcard::is_wildcard(name, self.config.wildcard) {
            return scope.get(name);
        }
        let names = scope.names();
        let index = wildcard::find_index(&names, name, false, self.config.wildcard)?;
        scope.get(&names[index])
    }

    pub fn resolve_token(&mut self, token: &Token) -> Value {
        match &token.tag {
            TokenTag::Raw => {
                let text = self.forest.token_text(token);
                if self.scope.is_none() {
                    return Value::from(text);
                }
                match self.lookup(text) {
                    Some(value) => value,
                    None => {
                        self.diagnostics
                            .warn(&format!("\"{}\" is not defined in scope", text));
                        Value::from(text)
                    }
                }
            }
            TokenTag::Delim(d) => Value::from(self.grammar.delim(*d).display_text()),
            TokenTag::Sub(value) => value.clone(),
            TokenTag::Entry(id) => self.resolve_entry(*id),
        }
    }

    /// Resolve an entry. Bracketed nesting counts against `max_depth` and
    /// chained operator results against `max_fold_depth`; hitting either
    /// reports once and stops the resolver.
    pub fn resolve_entry(&mut self, id: EntryId) -> Value {
        if self.halted {
            return Value::Null;
        }
        let entry = self.forest.entry(id);
        let folded = entry.kind == ContextKind::Operator;
        let (depth, limit, message) = if folded {
            (self.fold_depth, self.config.max_fold_depth, "expression too deep")
        } else {
            (self.depth, self.config.max_depth, "nesting too deep")
        };
        if depth >= limit {
            self.error_at(entry.start(), message);
            self.halted = true;
            return Value::Null;
        }
        if folded {
            self.fold_depth += 1;
        } else {
            self.depth += 1;
        }
        let value = if let Some(def) = entry.op.and_then(|d| self.grammar.operator(d)) {
            (def.resolve)(self, id)
        } else if let Some(resolver) = self.grammar.context(entry.context).resolver() {
            resolver(self, id)
        } else {
            match entry.kind {
                ContextKind::Text => Value::Str(self.forest.literal_text(id)),
                ContextKind::Comment => Value::Null,
                _ => self.resolve_seq(SeqRef::Entry(id)),
            }
        };
        if folded {
            self.fold_depth -= 1;
        } else {
            self.depth -= 1;
        }
        value
    }

    /// Resolve each term of a sequence. Comments, delimiters, and the
    /// operator marker of a folded entry are not terms.
    pub fn resolve_terms(&mut self, seq: SeqRef) -> Vec<Value> {
        let forest = self.forest;
        let mut values = Vec::new();
        for token in forest.interior(seq) {
            match token.tag {
                TokenTag::Delim(_) => continue,
                TokenTag::Entry(id)
                    if forest.is_marker(seq, token) || forest.entry(id).is_comment() =>
                {
                    continue
                }
                _ => values.push(self.resolve_token(token)),
            }
        }
        values
    }

    /// Terms of a sequence, simplified: none is null, one is itself, more
    /// become a list.
    pub fn resolve_seq(&mut self, seq: SeqRef) -> Value {
        let mut values = self.resolve_terms(seq);
        match values.len() {
            0 => Value::Null,
            1 => values.remove(0),
            _ => Value::List(values),
        }
    }

    /// Value of the token at `index` inside an operator entry.
    pub fn operand(&mut self, id: EntryId, index: usize) -> Value {
        let forest = self.forest;
        match forest.entry(id).tokens.get(index) {
            Some(token) => self.resolve_token(token),
            None => Value::Null,
        }
    }
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

/// A tokenized and operator-folded expression, ready to be resolved any
/// number of times against different scopes. The config and diagnostics
/// it was parsed with also govern resolution.
#[derive(Clone)]
pub struct Expression<'g> {
    grammar: &'g Grammar,
    forest: TokenForest,
    errors: Vec<ParseError>,
    config: ParseConfig,
    diagnostics: &'g dyn Diagnostics,
}

impl fmt::Debug for Expression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("forest", &self.forest)
            .field("errors", &self.errors)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'g> Expression<'g> {
    pub fn parse(grammar: &'g Grammar, text: &str) -> Self {
        Self::parse_with(grammar, text, ParseConfig::default(), default_sink())
    }

    pub fn parse_with(
        grammar: &'g Grammar,
        text: &str,
        config: ParseConfig,
        diagnostics: &'g dyn Diagnostics,
    ) -> Self {
        let tokenized = Tokenizer::new(grammar)
            .with_config(config)
            .with_diagnostics(diagnostics)
            .tokenize(text);
        let mut forest = tokenized.forest;
        let mut errors = tokenized.errors;
        errors.extend(
            OperatorResolver::new(grammar)
                .with_diagnostics(diagnostics)
                .resolve(&mut forest),
        );
        Expression {
            grammar,
            forest,
            errors,
            config,
            diagnostics,
        }
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Lexical and structural errors found while parsing.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn forest(&self) -> &TokenForest {
        &self.forest
    }

    /// Resolve every top-level term.
    pub fn resolve(&self, scope: Option<&dyn Scope>) -> (Vec<Value>, Vec<ParseError>) {
        let mut resolver = self.resolver(scope);
        let values = resolver.resolve_terms(SeqRef::Root);
        (values, resolver.into_errors())
    }

    /// Resolve to a single value: null, the only term, or a list of terms.
    pub fn value(&self, scope: Option<&dyn Scope>) -> (Value, Vec<ParseError>) {
        let mut resolver = self.resolver(scope);
        let value = resolver.resolve_seq(SeqRef::Root);
        (value, resolver.into_errors())
    }

    fn resolver<'s>(&'s self, scope: Option<&'s dyn Scope>) -> Resolver<'s> {
        Resolver::new(&self.forest, self.grammar)
            .with_config(self.config)
            .with_diagnostics(self.diagnostics)
            .with_optional_scope(scope)
    }
}

impl fmt::Display for Expression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.forest.render())
    }
}

/// Parse and resolve `text` in one step. Parse errors come first.
pub fn resolve_expression(
    grammar: &Grammar,
    text: &str,
    scope: Option<&dyn Scope>,
) -> (Value, Vec<ParseError>) {
    let expression = Expression::parse(grammar, text);
    let (value, resolve_errors) = expression.value(scope);
    let mut errors = expression.errors;
    errors.extend(resolve_errors);
    (value, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str) -> Value {
        let (value, errors) = resolve_expression(Grammar::standard(), text, None);
        assert!(errors.is_empty(), "{}: {:?}", text, errors);
        value
    }

    #[test]
    fn simplified_terms() {
        assert_eq!(eval(""), Value::Null);
        assert_eq!(eval("42"), Value::Int(42));
        assert_eq!(
            eval("a, 1"),
            Value::List(vec![Value::from("a"), Value::Int(1)])
        );
    }

    #[test]
    fn comments_are_not_terms() {
        assert_eq!(eval("/* c */ 7 // trailing"), Value::Int(7));
    }

    #[test]
    fn string_literals_decode() {
        assert_eq!(eval(r#""a\"b""#), Value::from("a\"b"));
    }

    #[test]
    fn scope_lookup_exact_and_wildcard() {
        let mut scope = BTreeMap::new();
        scope.insert("width".to_owned(), Value::Int(4));
        scope.insert("height".to_owned(), Value::Int(3));
        let g = Grammar::standard();
        let (v, errors) = resolve_expression(g, "width * height", Some(&scope));
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(v, Value::Float(12.0));
        let (v, _) = resolve_expression(g, "wid¤ + 1", Some(&scope));
        assert_eq!(v, Value::Float(5.0));
    }

    #[test]
    fn scope_miss_keeps_identifier_text() {
        let scope: HashMap<String, Value> = HashMap::new();
        let (v, errors) = resolve_expression(Grammar::standard(), "who + 1", Some(&scope));
        assert!(errors.is_empty());
        assert_eq!(v, Value::from("who1"));
    }

    #[test]
    fn expression_resolves_repeatedly() {
        let g = Grammar::standard();
        let e = Expression::parse(g, "x + 1");
        assert!(e.errors().is_empty());
        let mut scope = BTreeMap::new();
        scope.insert("x".to_owned(), Value::Int(1));
        assert_eq!(e.value(Some(&scope)).0, Value::Float(2.0));
        scope.insert("x".to_owned(), Value::Int(10));
        assert_eq!(e.value(Some(&scope)).0, Value::Float(11.0));
        assert_eq!(e.to_string(), "x + 1");
    }
}
