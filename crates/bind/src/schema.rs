//! Schema descriptors: how a destination type is filled from a token tree.
//!
//! A type describes itself once through [`Schema::descriptor`]. Records
//! carry a sorted member table and a closed registry of concrete subtypes;
//! primitives carry a conversion from a resolved [`Value`].

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use delimit_core::{wildcard, Value};

use crate::binder::{Abort, Binder};
use crate::convert::{self, ConvertError};

pub type Convert<T> = fn(&Value, char) -> Result<T, ConvertError>;

/// Drives the binder to produce a whole value.
pub type Drive<T> = fn(&mut Binder<'_>) -> Result<T, Abort>;

/// Binds one member value into a record under construction.
pub type MemberBind<T> = fn(&mut T, &mut Binder<'_>) -> Result<(), Abort>;

pub trait Schema: Sized {
    fn descriptor() -> Descriptor<Self>;
}

pub enum Descriptor<T> {
    Primitive(Convert<T>),
    Record(RecordSchema<T>),
    List(Drive<T>),
    Map(Drive<T>),
}

pub struct Member<T> {
    pub name: &'static str,
    pub bind: MemberBind<T>,
}

pub struct Subtype<T> {
    pub name: &'static str,
    pub bind: Drive<T>,
}

/// Outcome of a subtype tag lookup.
pub enum SubtypeMatch<'s, T> {
    Found(&'s Subtype<T>),
    Ambiguous(Vec<&'static str>),
    Missing,
}

pub struct RecordSchema<T> {
    type_name: &'static str,
    construct: Option<fn() -> T>,
    members: Vec<Member<T>>,
    subtypes: Vec<Subtype<T>>,
}

impl<T> RecordSchema<T> {
    /// A concrete record built from `construct` and then filled member by
    /// member.
    pub fn new(type_name: &'static str, construct: fn() -> T) -> Self {
        RecordSchema {
            type_name,
            construct: Some(construct),
            members: Vec::new(),
            subtypes: Vec::new(),
        }
    }

    /// A record that can only be bound through one of its subtypes.
    pub fn abstract_type(type_name: &'static str) -> Self {
        RecordSchema {
            type_name,
            construct: None,
            members: Vec::new(),
            subtypes: Vec::new(),
        }
    }

    pub fn member(mut self, name: &'static str, bind: MemberBind<T>) -> Self {
        let at = self.members.partition_point(|m| m.name < name);
        self.members.insert(at, Member { name, bind });
        self
    }

    pub fn subtype(mut self, name: &'static str, bind: Drive<T>) -> Self {
        self.subtypes.push(Subtype { name, bind });
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn construct(&self) -> Option<fn() -> T> {
        self.construct
    }

    pub fn is_abstract(&self) -> bool {
        self.construct.is_none()
    }

    pub fn member_names(&self) -> Vec<&'static str> {
        self.members.iter().map(|m| m.name).collect()
    }

    pub fn subtype_names(&self) -> Vec<&'static str> {
        self.subtypes.iter().map(|s| s.name).collect()
    }

    /// Exact names use a binary search; wildcard patterns take the first
    /// match in sorted order.
    pub fn find_member(&self, pattern: &str, wildcard_char: char) -> Option<&Member<T>> {
        let names = self.member_names();
        wildcard::find_index(&names, pattern, true, wildcard_char).map(|i| &self.members[i])
    }

    /// Subtype tags match exactly, else by suffix (`¤` + tag), so a short
    /// tag can name a qualified subtype. A suffix hitting more than one
    /// subtype is ambiguous.
    pub fn find_subtype(&self, tag: &str, wildcard_char: char) -> SubtypeMatch<'_, T> {
        if let Some(found) = self.subtypes.iter().find(|s| s.name == tag) {
            return SubtypeMatch::Found(found);
        }
        let pattern = if wildcard::is_wildcard(tag, wildcard_char) {
            tag.to_owned()
        } else {
            format!("{}{}", wildcard_char, tag)
        };
        let names = self.subtype_names();
        let hits = wildcard::find_all(&names, &pattern, wildcard_char);
        match hits.as_slice() {
            [] => SubtypeMatch::Missing,
            [one] => SubtypeMatch::Found(&self.subtypes[*one]),
            many => SubtypeMatch::Ambiguous(many.iter().map(|i| names[*i]).collect()),
        }
    }
}

// ──────────────────────────────────────────────
// Primitive and container impls
// ──────────────────────────────────────────────

macro_rules! integer_schema {
    ($($t:ty),*) => {
        $(
            impl Schema for $t {
                fn descriptor() -> Descriptor<Self> {
                    Descriptor::Primitive(convert::to_integer::<$t>)
                }
            }
        )*
    };
}

integer_schema!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Schema for bool {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::Primitive(convert::to_bool)
    }
}

impl Schema for char {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::Primitive(convert::to_char)
    }
}

impl Schema for f32 {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::Primitive(convert::to_f32)
    }
}

impl Schema for f64 {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::Primitive(convert::to_f64)
    }
}

impl Schema for String {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::Primitive(convert::to_string)
    }
}

/// Any resolved value, unconverted.
impl Schema for Value {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::Primitive(|value, _| Ok(value.clone()))
    }
}

impl<T: Schema> Schema for Vec<T> {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::List(|binder| binder.list::<T>())
    }
}

impl<T: Schema, const N: usize> Schema for [T; N] {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::List(|binder| {
            let items = binder.list::<T>()?;
            let found = items.len();
            items.try_into().map_err(|_| {
                binder.fail(format!("expected {} elements, found {}", N, found))
            })
        })
    }
}

impl<K: Schema + Ord, V: Schema> Schema for BTreeMap<K, V> {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::Map(|binder| Ok(binder.map_entries::<K, V>()?.into_iter().collect()))
    }
}

impl<K: Schema + Eq + Hash, V: Schema> Schema for HashMap<K, V> {
    fn descriptor() -> Descriptor<Self> {
        Descriptor::Map(|binder| Ok(binder.map_entries::<K, V>()?.into_iter().collect()))
    }
}
