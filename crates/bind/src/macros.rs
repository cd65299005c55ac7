//! Declarative schema impls for plain structs and enums.

/// Implement [`Schema`](crate::Schema) for a struct with a `Default` impl.
/// Each listed field becomes a member bound with its own schema.
///
/// ```ignore
/// record_schema!(Server { host: String, port: u16 });
/// ```
#[macro_export]
macro_rules! record_schema {
    ($ty:ident { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::Schema for $ty {
            fn descriptor() -> $crate::Descriptor<Self> {
                $crate::Descriptor::Record(
                    $crate::RecordSchema::new(
                        stringify!($ty),
                        <$ty as ::core::default::Default>::default,
                    )
                    $(.member(stringify!($field), |target, binder| {
                        target.$field = binder.value::<$fty>()?;
                        Ok(())
                    }))*
                )
            }
        }
    };
}

/// Implement [`Schema`](crate::Schema) for a fieldless `Clone` enum, bound
/// from a variant name.
#[macro_export]
macro_rules! enum_schema {
    ($ty:ident { $($variant:ident),* $(,)? }) => {
        impl $crate::Schema for $ty {
            fn descriptor() -> $crate::Descriptor<Self> {
                $crate::Descriptor::Primitive(|value, wildcard| {
                    $crate::convert::to_variant(
                        value,
                        wildcard,
                        stringify!($ty),
                        &[$((stringify!($variant), $ty::$variant)),*],
                    )
                })
            }
        }
    };
}

/// Implement [`Schema`](crate::Schema) for an enum whose variants each wrap
/// one record type. The input picks a variant with a type tag, e.g.
/// `= Circle { radius = 2 }`.
#[macro_export]
macro_rules! subtype_schema {
    ($ty:ident { $($variant:ident ( $inner:ty )),* $(,)? }) => {
        impl $crate::Schema for $ty {
            fn descriptor() -> $crate::Descriptor<Self> {
                $crate::Descriptor::Record(
                    $crate::RecordSchema::abstract_type(stringify!($ty))
                    $(.subtype(stringify!($variant), |binder| {
                        binder.record::<$inner>().map($ty::$variant)
                    }))*
                )
            }
        }
    };
}
