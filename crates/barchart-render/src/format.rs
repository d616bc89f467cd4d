//! Number parsing and display rules for captions and tooltips.
//!
//! Captions follow the dashboard conventions the charts are embedded in: values are parsed
//! leniently (leading numeric prefix), rounded with fixed-point formatting that breaks exact
//! ties away from zero, and unrounded numbers use the shortest round-trippable form.

use crate::record::value_text;
use serde_json::Value;

/// Shortest round-trippable decimal form (`1`, `0.5`, `1e+21`, `NaN`).
pub fn js_number_string(v: f64) -> String {
    let mut buf = ryu_js::Buffer::new();
    buf.format(v).to_string()
}

/// Parses the longest numeric prefix of `s` after leading whitespace, `parseFloat`-style.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0usize;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    if s[i..].starts_with("Infinity") {
        return Some(if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            i = j;
        }
    }
    if digits == 0 {
        return None;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    s[..i].parse::<f64>().ok()
}

/// Fixed-point formatting with `digits` decimals.
///
/// Exact binary ties round away from zero; values at or above `1e21` fall back to
/// [`js_number_string`].
pub fn to_fixed(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if !value.is_finite() || value.abs() >= 1e21 {
        return js_number_string(value);
    }

    let negative = value < 0.0;
    let abs = value.abs();
    let body = tie_rounded_up(abs, digits).unwrap_or_else(|| format!("{abs:.digits$}"));
    if negative { format!("-{body}") } else { body }
}

/// When `abs × 10^digits` lies exactly halfway between two integers, returns `abs` rounded up
/// to `digits` decimals.
///
/// `{:.N}` formatting breaks such ties to even, which disagrees with the away-from-zero rule
/// for e.g. `2.5` or `0.125`; everything that is not an exact tie already matches.
fn tie_rounded_up(abs: f64, digits: usize) -> Option<String> {
    if abs == 0.0 {
        return None;
    }
    let bits = abs.to_bits();
    let exp_bits = ((bits >> 52) & 0x7ff) as i64;
    let frac = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if exp_bits == 0 {
        (frac, -1074i64)
    } else {
        (frac | (1u64 << 52), exp_bits - 1075)
    };

    // abs × 10^d = mantissa × 5^d / 2^(k − d) with k = −exp fractional bits. 5^d is odd, so the
    // remainder is exactly one half iff the mantissa's lowest set bit sits at k − d − 1.
    let shift = -exp - digits as i64;
    if shift < 1 || i64::from(mantissa.trailing_zeros()) != shift - 1 {
        return None;
    }

    // A tie has exactly `digits + 1` decimals, the last one a 5, so this formatting is exact.
    let exact = format!("{abs:.prec$}", prec = digits + 1);
    let kept = exact.strip_suffix('5')?.trim_end_matches('.');
    Some(increment_last_digit(kept))
}

fn increment_last_digit(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    for c in chars.iter_mut().rev() {
        match *c {
            '.' => {}
            '9' => *c = '0',
            d => {
                *c = char::from(d as u8 + 1);
                return chars.into_iter().collect();
            }
        }
    }
    std::iter::once('1').chain(chars).collect()
}

/// Caption text for a field value.
///
/// Numeric values (including numeric-prefixed strings) are rounded to `round_to` decimals when
/// set; anything else is displayed unchanged.
pub fn round_value(value: &Value, round_to: Option<u32>) -> String {
    let Some(digits) = round_to else {
        return value_text(value);
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    };
    match parsed {
        Some(f) => to_fixed(f, digits as usize),
        None => value_text(value),
    }
}

/// `round_value` for an already numeric value.
pub fn round_number(value: f64, round_to: Option<u32>) -> String {
    match round_to {
        Some(digits) => to_fixed(value, digits as usize),
        None => js_number_string(value),
    }
}

/// Axis tick label for a linear scale whose ticks are `step` apart: fixed precision derived
/// from the step, thousands grouped with commas.
pub fn tick_label(value: f64, step: f64) -> String {
    let precision = if step.is_finite() && step > 0.0 {
        (-step.log10().floor()).max(0.0) as usize
    } else {
        0
    };
    let fixed = to_fixed(value, precision);
    group_thousands(&fixed)
}

fn group_thousands(fixed: &str) -> String {
    let (sign, rest) = match fixed.strip_prefix('-') {
        Some(r) => ("-", r),
        None => ("", fixed),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    if !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return fixed.to_string();
    }

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
