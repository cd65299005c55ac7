//! The schema binder: walks a folded token forest with a [`Cursor`] and
//! fills destination values as their [`Descriptor`]s direct.
//!
//! Input problems are recorded as [`ParseError`]s and abort the object
//! being bound; the caller receives whatever errors accumulated together
//! with the value, if one could be produced.

use delimit_core::diagnostics::default_sink;
use delimit_core::{
    resolve_operators, ContextKind, Cursor, Diagnostics, EntryId, Grammar, ParseConfig,
    ParseError, Resolver, Scope, SeqRef, Token, TokenForest, TokenTag, Tokenizer, Value,
};

use crate::convert::short_type_name;
use crate::schema::{Convert, Descriptor, RecordSchema, Schema, SubtypeMatch};

/// Marker returned when binding of the current object was abandoned. The
/// reason is already recorded in the binder's errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abort;

/// A bound value and every error met while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound<T> {
    pub value: Option<T>,
    pub errors: Vec<ParseError>,
}

impl<T> Bound<T> {
    /// A value was produced and nothing went wrong on the way.
    pub fn success(&self) -> bool {
        self.value.is_some() && self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<T, Vec<ParseError>> {
        match self.value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

/// Tokenize, fold operators and bind `text` as a `T`.
pub fn bind_str<T: Schema>(grammar: &Grammar, text: &str) -> Bound<T> {
    bind_str_with(grammar, text, None, ParseConfig::default())
}

pub fn bind_str_with<T: Schema>(
    grammar: &Grammar,
    text: &str,
    scope: Option<&dyn Scope>,
    config: ParseConfig,
) -> Bound<T> {
    let tokenized = Tokenizer::new(grammar).with_config(config).tokenize(text);
    let mut forest = tokenized.forest;
    let mut errors = tokenized.errors;
    errors.extend(resolve_operators(grammar, &mut forest));
    let bound = Binder::new(&forest, grammar)
        .with_optional_scope(scope)
        .with_config(config)
        .bind::<T>();
    errors.extend(bound.errors);
    Bound {
        value: bound.value,
        errors,
    }
}

fn is_separator(text: &str) -> bool {
    matches!(text, "=" | ":" | "," | ";")
}

pub struct Binder<'a> {
    forest: &'a TokenForest,
    grammar: &'a Grammar,
    cursor: Cursor<'a>,
    scope: Option<&'a dyn Scope>,
    config: ParseConfig,
    diagnostics: &'a dyn Diagnostics,
    errors: Vec<ParseError>,
    depth: usize,
    // the next container must sit in brackets (set for member values)
    expect_nested: bool,
}

impl<'a> Binder<'a> {
    pub fn new(forest: &'a TokenForest, grammar: &'a Grammar) -> Self {
        Self::over(forest, grammar, SeqRef::Root)
    }

    /// Bind from the interior of `seq` instead of the root.
    pub fn over(forest: &'a TokenForest, grammar: &'a Grammar, seq: SeqRef) -> Self {
        Binder {
            forest,
            grammar,
            cursor: Cursor::over(forest, seq),
            scope: None,
            config: ParseConfig::default(),
            diagnostics: default_sink(),
            errors: Vec::new(),
            depth: 0,
            expect_nested: false,
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

    pub fn cursor(&mut self) -> &mut Cursor<'a> {
        &mut self.cursor
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Bind the whole stream as a `T`.
    pub fn bind<T: Schema>(mut self) -> Bound<T> {
        let value = self.top::<T>().ok();
        Bound {
            value,
            errors: self.errors,
        }
    }

    /// Bind members into an existing record; members not present in the
    /// input keep their current values.
    pub fn fill<T: Schema>(mut self, target: &mut T) -> Bound<()> {
        let result = match T::descriptor() {
            Descriptor::Record(schema) => self.fill_top(&schema, target),
            _ => Err(self.fail(format!("{} is not a record type", short_type_name::<T>()))),
        };
        Bound {
            value: result.ok(),
            errors: self.errors,
        }
    }

    fn top<T: Schema>(&mut self) -> Result<T, Abort> {
        let value = match T::descriptor() {
            Descriptor::Primitive(convert) => self.primitive(convert, short_type_name::<T>())?,
            Descriptor::Record(schema) => self.bind_record(&schema, false)?,
            Descriptor::List(drive) | Descriptor::Map(drive) => drive(self)?,
        };
        self.expect_end()?;
        Ok(value)
    }

    fn fill_top<T>(&mut self, schema: &RecordSchema<T>, target: &mut T) -> Result<(), Abort> {
        self.descend()?;
        let entered = self.enter_enclosure(false);
        self.fill_members(schema, target)?;
        if entered {
            self.leave_enclosure();
        }
        self.ascend();
        self.expect_end()
    }

    // ──────────────────────────────────────────
    // Errors and bookkeeping
    // ──────────────────────────────────────────

    /// Record an error at the current token and abort.
    pub fn fail(&mut self, message: impl Into<String>) -> Abort {
        let offset = self.cursor.offset();
        self.fail_at(offset, message, Vec::new())
    }

    fn fail_at(&mut self, offset: usize, message: impl Into<String>, candidates: Vec<String>) -> Abort {
        let error = self
            .forest
            .error_at(offset, message)
            .with_candidates(candidates);
        self.diagnostics.error(&error.to_string());
        self.errors.push(error);
        Abort
    }

    fn descend(&mut self) -> Result<(), Abort> {
        if self.depth >= self.config.max_depth {
            return Err(self.fail("nesting too deep"));
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn expect_end(&mut self) -> Result<(), Abort> {
        self.skip_insignificant();
        match self.cursor.peek() {
            None => Ok(()),
            Some(token) => {
                let text = self.forest.token_text(token).to_owned();
                Err(self.fail_at(token.start, format!("unexpected \"{}\" after value", text), Vec::new()))
            }
        }
    }

    // ──────────────────────────────────────────
    // Token stream helpers
    // ──────────────────────────────────────────

    fn is_separator_token(&self, token: &Token) -> bool {
        match token.tag {
            TokenTag::Delim(d) => is_separator(&self.grammar.delim(d).text),
            _ => false,
        }
    }

    /// Skip comments and separator delimiters.
    fn skip_insignificant(&mut self) {
        loop {
            self.cursor.skip_comments();
            match self.cursor.peek() {
                Some(token) if self.is_separator_token(token) => self.cursor.advance(),
                _ => break,
            }
        }
    }

    fn nesting_entry(&self, token: &Token) -> Option<EntryId> {
        token.entry().filter(|id| self.forest.entry(*id).is_nesting())
    }

    /// Step into the bracketed entry at the cursor. Nested values always
    /// sit in brackets; at the top level the brackets are optional, so they
    /// are only entered when they hold everything that is left.
    fn enter_enclosure(&mut self, nested: bool) -> bool {
        self.cursor.skip_comments();
        let Some(id) = self.cursor.peek().and_then(|t| self.nesting_entry(t)) else {
            return false;
        };
        let sole = self.cursor.rest()[1..].iter().all(|t| {
            t.entry()
                .is_some_and(|e| self.forest.entry(e).kind == ContextKind::Comment)
        });
        if !nested && !sole {
            return false;
        }
        self.cursor.enter_nested(id);
        true
    }

    fn leave_enclosure(&mut self) {
        self.cursor.exit_nested();
        self.cursor.advance();
    }

    fn expect_enclosure(&mut self, what: &str) -> Result<(), Abort> {
        match self.cursor.peek() {
            Some(token) if self.nesting_entry(token).is_some() => Ok(()),
            Some(token) => {
                let text = self.forest.token_text(token).to_owned();
                Err(self.fail_at(
                    token.start,
                    format!("expected a nested {}, found \"{}\"", what, text),
                    Vec::new(),
                ))
            }
            None => Err(self.fail(format!("missing value for {}", what))),
        }
    }

    fn resolve(&mut self, token: &Token) -> Result<Value, Abort> {
        let mut resolver = Resolver::new(self.forest, self.grammar)
            .with_optional_scope(self.scope)
            .with_config(self.config)
            .with_diagnostics(self.diagnostics);
        let value = resolver.resolve_token(token);
        let errors = resolver.into_errors();
        if errors.is_empty() {
            return Ok(value);
        }
        self.errors.extend(errors);
        Err(Abort)
    }

    /// The scalar value of a single token: a bare word, a literal, or a
    /// resolved expression. Structures and delimiters are errors.
    fn scalar(&mut self, token: &'a Token) -> Result<Value, Abort> {
        match &token.tag {
            TokenTag::Raw => Ok(Value::from(self.forest.token_text(token))),
            TokenTag::Delim(d) => {
                let text = &self.grammar.delim(*d).text;
                let message = format!("unexpected delimiter \"{}\"", text);
                Err(self.fail_at(token.start, message, Vec::new()))
            }
            TokenTag::Entry(id) if self.forest.entry(*id).kind == ContextKind::Enclosure => {
                let name = self.grammar.context_name(self.forest.entry(*id).context);
                let message = format!("unexpected beginning of {}", name);
                Err(self.fail_at(token.start, message, Vec::new()))
            }
            _ => self.resolve(token),
        }
    }

    // ──────────────────────────────────────────
    // Values
    // ──────────────────────────────────────────

    /// Bind the next value as a `V`. Records, lists and maps must be
    /// bracketed.
    pub fn value<V: Schema>(&mut self) -> Result<V, Abort> {
        self.skip_insignificant();
        match V::descriptor() {
            Descriptor::Primitive(convert) => self.primitive(convert, short_type_name::<V>()),
            Descriptor::Record(schema) => self.bind_record(&schema, true),
            Descriptor::List(drive) | Descriptor::Map(drive) => {
                self.expect_enclosure(short_type_name::<V>())?;
                self.expect_nested = true;
                drive(self)
            }
        }
    }

    fn primitive<V>(&mut self, convert: Convert<V>, type_name: &str) -> Result<V, Abort> {
        self.skip_insignificant();
        let Some(token) = self.cursor.peek() else {
            return Err(self.fail(format!("missing value for {}", type_name)));
        };
        let value = self.scalar(token)?;
        match convert(&value, self.config.wildcard) {
            Ok(converted) => {
                self.cursor.advance();
                Ok(converted)
            }
            Err(e) => {
                let candidates = e.candidates();
                Err(self.fail_at(token.start, e.to_string(), candidates))
            }
        }
    }

    /// Bind a record type directly, e.g. from a subtype registration.
    pub fn record<V: Schema>(&mut self) -> Result<V, Abort> {
        let nested = std::mem::take(&mut self.expect_nested);
        match V::descriptor() {
            Descriptor::Record(schema) => self.bind_record(&schema, nested),
            _ => Err(self.fail(format!("{} is not a record type", short_type_name::<V>()))),
        }
    }

    /// Bind a sequence of `E`, bracketed or (at the top level) bare.
    pub fn list<E: Schema>(&mut self) -> Result<Vec<E>, Abort> {
        let nested = std::mem::take(&mut self.expect_nested);
        self.descend()?;
        let entered = self.enter_enclosure(nested);
        let mut items = Vec::new();
        loop {
            self.skip_insignificant();
            if self.cursor.at_end() {
                break;
            }
            items.push(self.value::<E>()?);
        }
        if entered {
            self.leave_enclosure();
        }
        self.ascend();
        Ok(items)
    }

    /// Bind `key value` pairs. Keys must have a primitive schema.
    pub fn map_entries<K: Schema, V: Schema>(&mut self) -> Result<Vec<(K, V)>, Abort> {
        let nested = std::mem::take(&mut self.expect_nested);
        let Descriptor::Primitive(convert_key) = K::descriptor() else {
            return Err(self.fail(format!("map keys of type {} must be primitive", short_type_name::<K>())));
        };
        self.descend()?;
        let entered = self.enter_enclosure(nested);
        let mut entries = Vec::new();
        loop {
            self.skip_insignificant();
            let Some(token) = self.cursor.peek() else {
                break;
            };
            // keys are runtime values, so bare words go through the scope
            let raw_key = match token.tag {
                TokenTag::Raw => self.resolve(token)?,
                _ => self.scalar(token)?,
            };
            let key = match convert_key(&raw_key, self.config.wildcard) {
                Ok(key) => key,
                Err(e) => return Err(self.fail_at(token.start, e.to_string(), e.candidates())),
            };
            self.cursor.advance();
            let value = self.value::<V>()?;
            entries.push((key, value));
        }
        if entered {
            self.leave_enclosure();
        }
        self.ascend();
        Ok(entries)
    }

    // ──────────────────────────────────────────
    // Records
    // ──────────────────────────────────────────

    fn bind_record<T>(&mut self, schema: &RecordSchema<T>, nested: bool) -> Result<T, Abort> {
        self.descend()?;
        let result = match self.subtype_tag(nested) {
            Some((tag, offset)) => self.bind_subtype(schema, &tag, offset, nested),
            None => {
                let entered = self.enter_enclosure(nested);
                if nested && !entered {
                    Err(self.fail(format!("expected a nested {}", schema.type_name())))
                } else {
                    let value = self.record_body(schema);
                    if entered && value.is_ok() {
                        self.leave_enclosure();
                    }
                    value
                }
            }
        };
        self.ascend();
        result
    }

    /// A subtype tag: `= Name` or `: Name`, or, for a nested value, a bare
    /// name directly followed by the bracketed body.
    fn subtype_tag(&mut self, nested: bool) -> Option<(String, usize)> {
        self.cursor.skip_comments();
        let first = self.cursor.peek()?;
        let next = self.cursor.peek_nth(1);
        match first.tag {
            TokenTag::Delim(d) if matches!(self.grammar.delim(d).text.as_str(), "=" | ":") => {
                let name = next.filter(|t| t.is_raw())?;
                self.cursor.advance();
                self.cursor.advance();
                Some((self.forest.token_text(name).to_owned(), name.start))
            }
            TokenTag::Raw if nested && next.and_then(|t| self.nesting_entry(t)).is_some() => {
                self.cursor.advance();
                Some((self.forest.token_text(first).to_owned(), first.start))
            }
            _ => None,
        }
    }

    fn bind_subtype<T>(
        &mut self,
        schema: &RecordSchema<T>,
        tag: &str,
        offset: usize,
        nested: bool,
    ) -> Result<T, Abort> {
        match schema.find_subtype(tag, self.config.wildcard) {
            SubtypeMatch::Found(subtype) => {
                self.diagnostics
                    .log(&format!("{} bound as {}", schema.type_name(), subtype.name));
                self.expect_nested = nested;
                (subtype.bind)(self)
            }
            SubtypeMatch::Ambiguous(names) => Err(self.fail_at(
                offset,
                format!("ambiguous type {}", tag),
                names.iter().map(|n| n.to_string()).collect(),
            )),
            SubtypeMatch::Missing if tag == schema.type_name() && !schema.is_abstract() => {
                let entered = self.enter_enclosure(nested);
                let value = self.record_body(schema);
                if entered && value.is_ok() {
                    self.leave_enclosure();
                }
                value
            }
            SubtypeMatch::Missing => Err(self.fail_at(
                offset,
                format!("unknown type {}", tag),
                schema.subtype_names().iter().map(|n| n.to_string()).collect(),
            )),
        }
    }

    fn record_body<T>(&mut self, schema: &RecordSchema<T>) -> Result<T, Abort> {
        if let Some((tag, offset)) = self.subtype_tag(false) {
            return self.bind_subtype(schema, &tag, offset, false);
        }
        let Some(construct) = schema.construct() else {
            let message = format!(
                "{} needs a more specific type, eg: {}",
                schema.type_name(),
                schema.subtype_names().join(", ")
            );
            return Err(self.fail(message));
        };
        let mut value = construct();
        self.fill_members(schema, &mut value)?;
        Ok(value)
    }

    fn fill_members<T>(&mut self, schema: &RecordSchema<T>, target: &mut T) -> Result<(), Abort> {
        loop {
            self.skip_insignificant();
            let Some(token) = self.cursor.peek() else {
                return Ok(());
            };
            let name = match &token.tag {
                TokenTag::Raw => self.forest.token_text(token).to_owned(),
                TokenTag::Entry(id) if self.forest.entry(*id).is_text() => {
                    self.forest.literal_text(*id)
                }
                TokenTag::Delim(d) => {
                    let message = format!("unexpected delimiter \"{}\"", self.grammar.delim(*d).text);
                    return Err(self.fail_at(token.start, message, Vec::new()));
                }
                _ => {
                    let message = format!(
                        "expected a member of {}, found \"{}\"",
                        schema.type_name(),
                        self.forest.token_text(token)
                    );
                    return Err(self.fail_at(token.start, message, Vec::new()));
                }
            };
            let Some(member) = schema.find_member(&name, self.config.wildcard) else {
                let message = format!("could not find member \"{}\" in {}", name, schema.type_name());
                let candidates = schema.member_names().iter().map(|n| n.to_string()).collect();
                return Err(self.fail_at(token.start, message, candidates));
            };
            self.cursor.advance();
            self.diagnostics
                .log(&format!("{}.{}", schema.type_name(), member.name));
            (member.bind)(target, self)?;
        }
    }
}
