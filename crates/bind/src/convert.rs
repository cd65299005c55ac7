//! Conversion of resolved values into primitive destination types.

use std::str::FromStr;

use delimit_core::wildcard;
use delimit_core::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("unable to convert ({value}) to type '{target}'")]
    Incompatible { value: String, target: &'static str },

    #[error("{value} is out of range for type '{target}'")]
    OutOfRange { value: String, target: &'static str },

    #[error("\"{name}\" is not a variant of {target}")]
    UnknownVariant {
        name: String,
        target: &'static str,
        variants: Vec<String>,
    },
}

impl ConvertError {
    fn incompatible(value: &Value, target: &'static str) -> Self {
        ConvertError::Incompatible {
            value: value.to_string(),
            target,
        }
    }

    /// Valid alternatives, when the failure was a name lookup.
    pub fn candidates(&self) -> Vec<String> {
        match self {
            ConvertError::UnknownVariant { variants, .. } => variants.clone(),
            _ => Vec::new(),
        }
    }
}

/// Last path segment of a type name: `alloc::string::String` -> `String`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}

pub fn to_bool(value: &Value, _wildcard: char) -> Result<bool, ConvertError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(n) => Ok(*n != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::Str(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::Str(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ConvertError::incompatible(value, "bool")),
    }
}

/// Integers accept ints, integral floats, bools, chars and numeric text.
pub fn to_integer<N>(value: &Value, _wildcard: char) -> Result<N, ConvertError>
where
    N: TryFrom<i64> + FromStr,
{
    let target = short_type_name::<N>();
    let out_of_range = || ConvertError::OutOfRange {
        value: value.to_string(),
        target,
    };
    let wide = match value {
        Value::Int(n) => *n,
        Value::Bool(b) => i64::from(*b),
        Value::Char(c) => i64::from(u32::from(*c)),
        Value::Float(f) => {
            if f.fract() != 0.0 || !f.is_finite() {
                return Err(ConvertError::incompatible(value, target));
            }
            if *f < i64::MIN as f64 || *f > i64::MAX as f64 {
                return Err(out_of_range());
            }
            *f as i64
        }
        Value::Str(s) => {
            return s
                .trim()
                .parse::<N>()
                .map_err(|_| ConvertError::incompatible(value, target));
        }
        Value::Null | Value::List(_) => return Err(ConvertError::incompatible(value, target)),
    };
    N::try_from(wide).map_err(|_| out_of_range())
}

pub fn to_f64(value: &Value, _wildcard: char) -> Result<f64, ConvertError> {
    match value {
        Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => value
            .as_f64()
            .ok_or_else(|| ConvertError::incompatible(value, "f64")),
        _ => Err(ConvertError::incompatible(value, "f64")),
    }
}

pub fn to_f32(value: &Value, wildcard: char) -> Result<f32, ConvertError> {
    to_f64(value, wildcard)
        .map(|f| f as f32)
        .map_err(|_| ConvertError::incompatible(value, "f32"))
}

pub fn to_char(value: &Value, _wildcard: char) -> Result<char, ConvertError> {
    match value {
        Value::Char(c) => Ok(*c),
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(ConvertError::incompatible(value, "char")),
            }
        }
        Value::Int(n) => u32::try_from(*n)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| ConvertError::OutOfRange {
                value: value.to_string(),
                target: "char",
            }),
        _ => Err(ConvertError::incompatible(value, "char")),
    }
}

pub fn to_string(value: &Value, _wildcard: char) -> Result<String, ConvertError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        Value::Null | Value::List(_) => Err(ConvertError::incompatible(value, "String")),
        other => Ok(other.to_string()),
    }
}

/// Pick a fieldless enum variant by name. Exact names win; a wildcard
/// pattern takes the first matching variant in declaration order.
pub fn to_variant<T: Clone>(
    value: &Value,
    wildcard_char: char,
    target: &'static str,
    variants: &[(&'static str, T)],
) -> Result<T, ConvertError> {
    let name = match value {
        Value::Str(s) => s.clone(),
        Value::Char(c) => c.to_string(),
        _ => return Err(ConvertError::incompatible(value, target)),
    };
    let names: Vec<&str> = variants.iter().map(|(n, _)| *n).collect();
    match wildcard::find_index(&names, &name, false, wildcard_char) {
        Some(i) => Ok(variants[i].1.clone()),
        None => Err(ConvertError::UnknownVariant {
            name,
            target,
            variants: names.iter().map(|n| n.to_string()).collect(),
        }),
    }
}
