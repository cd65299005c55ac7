//! Standard literal sub-parsers (escapes, numbers) and the predicates that
//! decide whether a number delimiter really starts a number.

use crate::delim::ParseOutcome;
use crate::value::Value;

// ──────────────────────────────────────────────
// Predicates
// ──────────────────────────────────────────────

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn follows_identifier(text: &str, index: usize) -> bool {
    text.get(..index)
        .and_then(|before| before.chars().next_back())
        .is_some_and(is_identifier_char)
}

fn byte_at(text: &str, index: usize) -> Option<u8> {
    text.as_bytes().get(index).copied()
}

/// Digits and `0x` start a number unless glued to an identifier.
pub fn starts_number(text: &str, index: usize) -> bool {
    !follows_identifier(text, index)
}

/// `-` starts a number when followed by a digit or a decimal point.
pub fn starts_signed_number(text: &str, index: usize) -> bool {
    starts_number(text, index)
        && byte_at(text, index + 1).is_some_and(|b| b.is_ascii_digit() || b == b'.')
}

/// `.` starts a number when followed by a digit.
pub fn starts_fraction(text: &str, index: usize) -> bool {
    starts_number(text, index) && byte_at(text, index + 1).is_some_and(|b| b.is_ascii_digit())
}

// ──────────────────────────────────────────────
// Numbers
// ──────────────────────────────────────────────

fn digit_value(b: u8) -> u32 {
    match b {
        b'0'..=b'9' => (b - b'0') as u32,
        b'a'..=b'z' => (b - b'a') as u32 + 10,
        b'A'..=b'Z' => (b - b'A') as u32 + 10,
        _ => u32::MAX,
    }
}

fn count_digits(text: &str, from: usize, base: u32) -> usize {
    text.as_bytes()[from..]
        .iter()
        .take_while(|b| digit_value(**b) < base)
        .count()
}

/// Parse a number starting at `start`: optional `-`, digits in `base`, and
/// with `allow_fraction` a `.` followed by more digits. `consumed` counts
/// from `start`.
pub fn parse_number(text: &str, start: usize, base: u32, allow_fraction: bool) -> ParseOutcome {
    let mut i = start;
    let negative = byte_at(text, i) == Some(b'-');
    if negative {
        i += 1;
    }
    let int_start = i;
    i += count_digits(text, i, base);
    let int_end = i;

    if allow_fraction && byte_at(text, i) == Some(b'.') {
        let frac_start = i + 1;
        let frac_len = count_digits(text, frac_start, base);
        if frac_len == 0 {
            return ParseOutcome::failed(
                frac_start - start,
                frac_start,
                "decimal point with no subsequent digits",
            );
        }
        let end = frac_start + frac_len;
        let value = if base == 10 {
            text[start..end].parse::<f64>().ok()
        } else {
            Some(fraction_in_base(text, int_start, int_end, end, base, negative))
        };
        return match value {
            Some(v) => ParseOutcome::new(end - start, Value::Float(v)),
            None => ParseOutcome::failed(end - start, start, "unable to parse number"),
        };
    }

    if int_end == int_start {
        return ParseOutcome::failed(
            int_end - start,
            int_end,
            format!("expected base{} digits", base),
        );
    }
    let mut value: i64 = 0;
    for b in text[int_start..int_end].bytes() {
        let next = value
            .checked_mul(base as i64)
            .and_then(|v| v.checked_add(digit_value(b) as i64));
        match next {
            Some(v) => value = v,
            None => {
                return ParseOutcome::failed(int_end - start, start, "number out of range");
            }
        }
    }
    if negative {
        value = -value;
    }
    ParseOutcome::new(int_end - start, Value::Int(value))
}

fn fraction_in_base(
    text: &str,
    int_start: usize,
    int_end: usize,
    end: usize,
    base: u32,
    negative: bool,
) -> f64 {
    let base = base as f64;
    let mut value = 0.0;
    for b in text[int_start..int_end].bytes() {
        value = value * base + digit_value(b) as f64;
    }
    let mut scale = 1.0 / base;
    for b in text[int_end + 1..end].bytes() {
        value += digit_value(b) as f64 * scale;
        scale /= base;
    }
    if negative {
        -value
    } else {
        value
    }
}

/// Base 10 literal, optionally signed and fractional.
pub fn decimal(text: &str, index: usize) -> ParseOutcome {
    parse_number(text, index, 10, true)
}

/// `0x` prefixed base 16 integer.
pub fn hexadecimal(text: &str, index: usize) -> ParseOutcome {
    let mut outcome = parse_number(text, index + 2, 16, false);
    outcome.consumed += 2;
    outcome
}

// ──────────────────────────────────────────────
// Escapes
// ──────────────────────────────────────────────

fn char_escape(text: &str, index: usize, digits: usize) -> ParseOutcome {
    let first = index + 2;
    let mut code: u32 = 0;
    for n in 0..digits {
        match byte_at(text, first + n).map(digit_value) {
            Some(d) if d < 16 => code = code * 16 + d,
            _ => {
                return ParseOutcome::failed(
                    2 + n,
                    first + n,
                    format!("expected base16 value #{}", n + 1),
                );
            }
        }
    }
    match char::from_u32(code) {
        Some(c) => ParseOutcome::new(2 + digits, Value::Str(c.to_string())),
        None => ParseOutcome::failed(2 + digits, index, "invalid character code"),
    }
}

fn octal_escape(text: &str, index: usize) -> ParseOutcome {
    let first = index + 1;
    let len = text.as_bytes()[first..]
        .iter()
        .take(3)
        .take_while(|b| (b'0'..=b'7').contains(*b))
        .count();
    let code = text[first..first + len]
        .bytes()
        .fold(0u32, |acc, b| acc * 8 + (b - b'0') as u32);
    match char::from_u32(code) {
        Some(c) => ParseOutcome::new(1 + len, Value::Str(c.to_string())),
        None => ParseOutcome::failed(1 + len, index, "invalid character code"),
    }
}

/// Backslash escape inside string and char literals. The produced value is
/// the decoded text; line continuations decode to nothing.
pub fn unescape(text: &str, index: usize) -> ParseOutcome {
    let Some(c) = text.get(index + 1..).and_then(|rest| rest.chars().next()) else {
        return ParseOutcome::failed(1, index, "unable to parse escape sequence at end of input");
    };
    let simple = |decoded: char| ParseOutcome::new(2, Value::Str(decoded.to_string()));
    match c {
        '\n' => ParseOutcome::new(2, Value::Str(String::new())),
        '\r' => {
            if byte_at(text, index + 2) == Some(b'\n') {
                ParseOutcome::new(3, Value::Str(String::new()))
            } else {
                ParseOutcome::new(2, Value::Str(String::new()))
                    .with_error(index + 2, "expected windows line ending")
            }
        }
        'a' => simple('\u{7}'),
        'b' => simple('\u{8}'),
        'e' => simple('\u{1b}'),
        'f' => simple('\u{c}'),
        'n' => simple('\n'),
        'r' => simple('\r'),
        't' => simple('\t'),
        'v' => simple('\u{b}'),
        '\\' | '\'' | '"' | '?' => simple(c),
        'x' => char_escape(text, index, 2),
        'u' => char_escape(text, index, 4),
        'U' => char_escape(text, index, 8),
        '0'..='7' => octal_escape(text, index),
        other => ParseOutcome::failed(1 + other.len_utf8(), index, "unknown escape sequence"),
    }
}

/// Backslash inside a line comment: only a line continuation is special.
pub fn comment_escape(text: &str, index: usize) -> ParseOutcome {
    match byte_at(text, index + 1) {
        Some(b'\n') => ParseOutcome::new(2, Value::Null),
        Some(b'\r') if byte_at(text, index + 2) == Some(b'\n') => {
            ParseOutcome::new(3, Value::Null)
        }
        Some(b'\r') => ParseOutcome::new(2, Value::Null),
        _ => ParseOutcome {
            consumed: 1,
            value: None,
            error: None,
        },
    }
}
