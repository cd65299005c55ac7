//! delimit-bind: fill typed Rust values from delimit token forests.
//!
//! # Public API
//!
//! - [`Schema`] / [`Descriptor`] -- how a type is bound: primitive
//!   conversion, record members and subtypes, lists or maps
//! - [`record_schema!`], [`enum_schema!`], [`subtype_schema!`] -- schema
//!   impls for plain structs and enums
//! - [`Binder`] -- walks a folded forest and drives descriptors
//! - [`bind_str()`] -- tokenize, fold operators and bind in one call

pub mod binder;
pub mod convert;
mod macros;
pub mod schema;

// ── Convenience re-exports ───────────────────────────────────────────

pub use binder::{bind_str, bind_str_with, Abort, Binder, Bound};
pub use convert::ConvertError;
pub use schema::{Descriptor, Member, RecordSchema, Schema, Subtype, SubtypeMatch};
