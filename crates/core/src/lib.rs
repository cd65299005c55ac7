//! delimit-core: delimiter-defined grammars, a context-sensitive tokenizer,
//! operator-precedence folding, and value resolution.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`Grammar`] / [`GrammarBuilder`] -- contexts and delimiters;
//!   [`Grammar::standard()`] is the shared standard grammar
//! - [`tokenize()`] / [`Tokenizer`] -- text to [`TokenForest`]
//! - [`resolve_operators()`] -- fold operator tokens by precedence
//! - [`Resolver`], [`Expression`], [`resolve_expression()`] -- token trees
//!   to [`Value`]s, with an optional [`Scope`]
//! - [`Cursor`] -- frame-stack walker used by schema binders
//! - [`ParseError`] -- positioned input error

pub mod config;
pub mod context;
pub mod cursor;
pub mod delim;
pub mod diagnostics;
pub mod error;
pub mod grammar;
pub mod operators;
pub mod ops;
pub mod resolve;
pub mod rules;
pub mod standard;
pub mod token;
pub mod tokenizer;
pub mod value;
pub mod wildcard;

// ── Convenience re-exports: model ────────────────────────────────────

pub use config::ParseConfig;
pub use context::{Context, ContextKind};
pub use delim::{Delim, DelimId, DelimRole, OperatorDef, ParseOutcome, RuleError};
pub use error::{ConfigError, GrammarError, LineIndex, ParseError};
pub use grammar::{ContextId, Grammar, GrammarBuilder};
pub use token::{Entry, EntryId, SeqRef, Token, TokenForest, TokenTag};
pub use value::Value;

// ── Convenience re-exports: passes ───────────────────────────────────

pub use cursor::Cursor;
pub use diagnostics::{Diagnostics, Level, Recorder, Silent, TracingDiagnostics};
pub use operators::{resolve_operators, OperatorResolver};
pub use resolve::{resolve_expression, Expression, Resolver, Scope};
pub use tokenizer::{tokenize, Tokenized, Tokenizer};
