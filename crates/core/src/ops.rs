//! Resolve callbacks for the standard operators and literal contexts.
//!
//! Arithmetic coerces numbers to `f64`. Text takes part in `+`
//! (concatenation) and `*` (repetition) only. Comparisons need both sides
//! in one ordered family. Logical operators evaluate both sides.

use std::cmp::Ordering;

use crate::resolve::Resolver;
use crate::token::EntryId;
use crate::value::Value;

fn is_textual(value: &Value) -> bool {
    matches!(value, Value::Str(_) | Value::Char(_))
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => value.as_f64(),
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    format!("({}){}", value.type_name(), value)
}

fn binary(r: &mut Resolver<'_>, id: EntryId) -> (Value, Value) {
    (r.operand(id, 0), r.operand(id, 2))
}

fn numbers(
    r: &mut Resolver<'_>,
    id: EntryId,
    verb: &str,
    left: &Value,
    right: &Value,
) -> Option<(f64, f64)> {
    match (number(left), number(right)) {
        (Some(l), Some(rv)) => Some((l, rv)),
        _ => {
            r.error_at_operator(
                id,
                format!("unable to {} {} and {}", verb, describe(left), describe(right)),
            );
            None
        }
    }
}

fn arithmetic(r: &mut Resolver<'_>, id: EntryId, verb: &str, f: fn(f64, f64) -> f64) -> Value {
    let (left, right) = binary(r, id);
    match numbers(r, id, verb, &left, &right) {
        Some((l, rv)) => Value::Float(f(l, rv)),
        None => Value::Null,
    }
}

pub fn sum(r: &mut Resolver<'_>, id: EntryId) -> Value {
    let (left, right) = binary(r, id);
    if is_textual(&left) || is_textual(&right) {
        return Value::Str(format!("{}{}", left, right));
    }
    match numbers(r, id, "add", &left, &right) {
        Some((l, rv)) => Value::Float(l + rv),
        None => Value::Null,
    }
}

pub fn difference(r: &mut Resolver<'_>, id: EntryId) -> Value {
    arithmetic(r, id, "subtract", |l, rv| l - rv)
}

/// `floor(count)` copies followed by a prefix covering the fraction, or
/// `None` when the result would be longer than `limit` bytes.
fn repeat(text: &str, count: f64, limit: usize) -> Option<String> {
    if !count.is_finite() || count < 0.0 {
        return None;
    }
    let whole = count.floor();
    if whole > limit as f64 {
        return if text.is_empty() { Some(String::new()) } else { None };
    }
    let whole = whole as usize;
    let chars: Vec<char> = text.chars().collect();
    let extra = ((count - whole as f64) * chars.len() as f64).round() as usize;
    let prefix: usize = chars.iter().take(extra).map(|c| c.len_utf8()).sum();
    let len = text.len().checked_mul(whole)?.checked_add(prefix)?;
    if len > limit {
        return None;
    }
    let mut out = String::with_capacity(len);
    for _ in 0..whole {
        out.push_str(text);
    }
    out.extend(chars.iter().take(extra));
    Some(out)
}

pub fn product(r: &mut Resolver<'_>, id: EntryId) -> Value {
    let (left, right) = binary(r, id);
    let repeated = match (&left, &right) {
        (text, count) | (count, text) if is_textual(text) && number(count).is_some() => {
            Some((text.to_string(), number(count).unwrap_or(0.0)))
        }
        _ => None,
    };
    if let Some((text, count)) = repeated {
        return match repeat(&text, count, r.config().max_text_len) {
            Some(out) => Value::Str(out),
            None => {
                r.error_at_operator(
                    id,
                    format!("unable to repeat {} {} times", describe(&left), count),
                );
                Value::Null
            }
        };
    }
    match numbers(r, id, "multiply", &left, &right) {
        Some((l, rv)) => Value::Float(l * rv),
        None => Value::Null,
    }
}

fn divide(r: &mut Resolver<'_>, id: EntryId, verb: &str, f: fn(f64, f64) -> f64) -> Value {
    let (left, right) = binary(r, id);
    let Some((l, rv)) = numbers(r, id, verb, &left, &right) else {
        return Value::Null;
    };
    if rv == 0.0 {
        r.error_at_operator(id, format!("unable to {} {} by zero", verb, describe(&left)));
        return Value::Null;
    }
    Value::Float(f(l, rv))
}

pub fn quotient(r: &mut Resolver<'_>, id: EntryId) -> Value {
    divide(r, id, "divide", |l, rv| l / rv)
}

pub fn modulus(r: &mut Resolver<'_>, id: EntryId) -> Value {
    divide(r, id, "modulo", |l, rv| l % rv)
}

pub fn power(r: &mut Resolver<'_>, id: EntryId) -> Value {
    arithmetic(r, id, "exponentiate", f64::powf)
}

fn compare(r: &mut Resolver<'_>, id: EntryId, symbol: &str, test: fn(Ordering) -> bool) -> Value {
    let (left, right) = binary(r, id);
    match left.compare(&right) {
        Some(ordering) => Value::Bool(test(ordering)),
        None => {
            r.error_at_operator(
                id,
                format!("can't compare {} {} {}", describe(&left), symbol, describe(&right)),
            );
            Value::Null
        }
    }
}

pub fn less(r: &mut Resolver<'_>, id: EntryId) -> Value {
    compare(r, id, "<", Ordering::is_lt)
}

pub fn greater(r: &mut Resolver<'_>, id: EntryId) -> Value {
    compare(r, id, ">", Ordering::is_gt)
}

pub fn less_equal(r: &mut Resolver<'_>, id: EntryId) -> Value {
    compare(r, id, "<=", Ordering::is_le)
}

pub fn greater_equal(r: &mut Resolver<'_>, id: EntryId) -> Value {
    compare(r, id, ">=", Ordering::is_ge)
}

pub fn equal(r: &mut Resolver<'_>, id: EntryId) -> Value {
    compare(r, id, "==", Ordering::is_eq)
}

pub fn not_equal(r: &mut Resolver<'_>, id: EntryId) -> Value {
    compare(r, id, "!=", Ordering::is_ne)
}

pub fn and(r: &mut Resolver<'_>, id: EntryId) -> Value {
    let (left, right) = binary(r, id);
    Value::Bool(left.truthy() && right.truthy())
}

pub fn or(r: &mut Resolver<'_>, id: EntryId) -> Value {
    let (left, right) = binary(r, id);
    Value::Bool(left.truthy() || right.truthy())
}

pub fn not(r: &mut Resolver<'_>, id: EntryId) -> Value {
    Value::Bool(!r.operand(id, 1).truthy())
}

/// Context resolver for char literals: exactly one decoded character.
pub fn char_literal(r: &mut Resolver<'_>, id: EntryId) -> Value {
    let forest = r.forest();
    let text = forest.literal_text(id);
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Value::Char(c),
        _ => {
            r.error_at(
                forest.entry(id).start(),
                "char literal must hold exactly one character",
            );
            Value::Str(text)
        }
    }
}
