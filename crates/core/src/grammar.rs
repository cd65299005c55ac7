//! The context/delimiter registry.
//!
//! Contexts are registered by name in order; a delimiter may only refer to
//! a context that is already registered when the delimiter is added. Every
//! context keeps its own copy of its delimiters, so a [`DelimId`] identifies
//! both the delimiter and the context it was matched in.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::context::{Context, ContextKind};
use crate::delim::{Delim, DelimId, DelimRole, OperatorDef, ResolveFn};
use crate::error::GrammarError;

/// Index of a context inside its [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub(crate) u32);

impl ContextId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct Grammar {
    contexts: Vec<Context>,
    delims: Vec<Delim>,
    // resolved target context per delimiter, parallel to `delims`
    targets: Vec<Option<ContextId>>,
    by_name: HashMap<String, ContextId>,
    default: ContextId,
}

static STANDARD: Lazy<Grammar> = Lazy::new(|| crate::standard::standard_builder().build());

impl Grammar {
    /// The shared standard grammar, built on first use.
    pub fn standard() -> &'static Grammar {
        &STANDARD
    }

    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn context(&self, id: ContextId) -> &Context {
        &self.contexts[id.index()]
    }

    pub fn context_named(&self, name: &str) -> Option<ContextId> {
        self.by_name.get(name).copied()
    }

    pub fn context_name(&self, id: ContextId) -> &str {
        self.contexts[id.index()].name()
    }

    pub fn default_context(&self) -> ContextId {
        self.default
    }

    pub fn delim(&self, id: DelimId) -> &Delim {
        &self.delims[id.index()]
    }

    pub fn delims(&self) -> &[Delim] {
        &self.delims
    }

    /// The context a delimiter transitions to or folds into.
    pub fn target(&self, id: DelimId) -> Option<ContextId> {
        self.targets[id.index()]
    }

    pub fn operator(&self, id: DelimId) -> Option<&OperatorDef> {
        self.delims[id.index()].operator_def()
    }

    pub fn delimiter_at(&self, context: ContextId, text: &str, index: usize) -> Option<DelimId> {
        self.context(context).delimiter_at(&self.delims, text, index)
    }
}

// ──────────────────────────────────────────────
// Builder
// ──────────────────────────────────────────────

/// Collects contexts and delimiters. The first configuration mistake is
/// kept and reported by [`GrammarBuilder::try_build`]; [`GrammarBuilder::build`]
/// panics on it.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    contexts: Vec<Context>,
    delims: Vec<Delim>,
    targets: Vec<Option<ContextId>>,
    by_name: HashMap<String, ContextId>,
    default: Option<ContextId>,
    error: Option<GrammarError>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context. The first context registered is the default one
    /// unless [`GrammarBuilder::default_context`] says otherwise.
    pub fn context(&mut self, name: &str, kind: ContextKind) -> ContextId {
        if let Some(&existing) = self.by_name.get(name) {
            self.fail(GrammarError::DuplicateContext(name.to_owned()));
            return existing;
        }
        let id = ContextId(self.contexts.len() as u32);
        self.contexts.push(Context::new(id, name, kind));
        self.by_name.insert(name.to_owned(), id);
        if self.default.is_none() {
            self.default = Some(id);
        }
        id
    }

    pub fn context_named(&self, name: &str) -> Option<ContextId> {
        self.by_name.get(name).copied()
    }

    pub fn default_context(&mut self, id: ContextId) -> &mut Self {
        self.default = Some(id);
        self
    }

    pub fn whitespace(&mut self, context: ContextId, whitespace: &[char]) -> &mut Self {
        self.contexts[context.index()].set_whitespace(whitespace);
        self
    }

    pub fn resolver(&mut self, context: ContextId, resolver: ResolveFn) -> &mut Self {
        self.contexts[context.index()].set_resolver(resolver);
        self
    }

    pub fn delimiter(&mut self, context: ContextId, delim: Delim) -> &mut Self {
        if delim.text.is_empty() {
            let name = self.contexts[context.index()].name().to_owned();
            self.fail(GrammarError::EmptyDelimiter { context: name });
            return self;
        }
        let target = match delim.target_name() {
            None => None,
            Some(name) => match self.by_name.get(name) {
                Some(&id) => Some(id),
                None => {
                    self.fail(GrammarError::UnknownContext(name.to_owned()));
                    return self;
                }
            },
        };
        if let (DelimRole::Operator(def), Some(target)) = (&delim.role, target) {
            if self.contexts[target.index()].kind() != ContextKind::Operator {
                self.fail(GrammarError::NotAnOperatorContext {
                    text: delim.text.clone(),
                    target: def.context.clone(),
                });
                return self;
            }
        }
        let id = DelimId(self.delims.len() as u32);
        self.delims.push(delim);
        self.targets.push(target);
        self.contexts[context.index()].push_delimiter(id);
        self
    }

    pub fn delimiters<I>(&mut self, context: ContextId, delims: I) -> &mut Self
    where
        I: IntoIterator<Item = Delim>,
    {
        for delim in delims {
            self.delimiter(context, delim);
        }
        self
    }

    fn fail(&mut self, error: GrammarError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn try_build(mut self) -> Result<Grammar, GrammarError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let Some(default) = self.default else {
            return Err(GrammarError::UnknownContext("default".to_owned()));
        };
        for context in &mut self.contexts {
            context.index(&self.delims);
        }
        Ok(Grammar {
            contexts: self.contexts,
            delims: self.delims,
            targets: self.targets,
            by_name: self.by_name,
            default,
        })
    }

    /// Build, panicking on a configuration mistake.
    pub fn build(self) -> Grammar {
        match self.try_build() {
            Ok(grammar) => grammar,
            Err(e) => panic!("invalid grammar: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_before_context_is_rejected() {
        let mut b = GrammarBuilder::new();
        let default = b.context("default", ContextKind::Default);
        b.delimiter(default, Delim::opens("(", "()"));
        b.context("()", ContextKind::Group);
        assert_eq!(
            b.try_build().unwrap_err(),
            GrammarError::UnknownContext("()".into())
        );
    }

    #[test]
    fn duplicate_context_is_rejected() {
        let mut b = GrammarBuilder::new();
        b.context("a", ContextKind::Default);
        b.context("a", ContextKind::Default);
        assert_eq!(
            b.try_build().unwrap_err(),
            GrammarError::DuplicateContext("a".into())
        );
    }

    #[test]
    #[should_panic(expected = "invalid grammar")]
    fn build_panics_on_error() {
        let mut b = GrammarBuilder::new();
        let d = b.context("default", ContextKind::Default);
        b.delimiter(d, Delim::plain(""));
        b.build();
    }

    #[test]
    fn targets_resolve_per_delimiter() {
        let mut b = GrammarBuilder::new();
        let default = b.context("default", ContextKind::Default);
        let paren = b.context("()", ContextKind::Group);
        b.delimiters(default, [Delim::opens("(", "()"), Delim::plain(",")]);
        b.delimiter(paren, Delim::closes(")", "()"));
        let g = b.build();
        let open = g.delimiter_at(default, "(x", 0).unwrap();
        assert_eq!(g.target(open), Some(paren));
        let comma = g.delimiter_at(default, ",", 0).unwrap();
        assert_eq!(g.target(comma), None);
        // ')' is only known inside the paren context
        assert!(g.delimiter_at(default, ")", 0).is_none());
        assert!(g.delimiter_at(paren, ")", 0).is_some());
        assert_eq!(g.default_context(), default);
    }

    #[test]
    fn standard_grammar_is_shared() {
        let a = Grammar::standard() as *const Grammar;
        let b = Grammar::standard() as *const Grammar;
        assert_eq!(a, b);
        assert!(Grammar::standard().context_named("string").is_some());
    }
}
