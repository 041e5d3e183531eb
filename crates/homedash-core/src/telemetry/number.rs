//! Lenient number parsing and fixed-precision formatting for display values.

use core::fmt::Write;

use heapless::String;

pub const VALUE_TEXT_BYTES: usize = 24;
pub const PLACEHOLDER: &str = "--";

/// Parses the longest numeric prefix of `text` after skipping leading
/// characters that are neither a digit nor `-`.
///
/// `" 63.4 °C"` parses as `63.4`; `"abc"` and `"-"` yield `None`.
pub fn parse_lenient(text: &str) -> Option<f32> {
    let bytes = text.as_bytes();
    let start = bytes
        .iter()
        .position(|byte| byte.is_ascii_digit() || *byte == b'-')?;

    let mut end = start;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut digits_end = start;

    if bytes[end] == b'-' {
        end += 1;
    }
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
                digits_end = end;
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }

    if !seen_digit {
        return None;
    }

    text[start..digits_end].parse::<f32>().ok()
}

/// Parses a whole field as a number, surrounding whitespace allowed.
pub fn parse_field(text: &str) -> Option<f32> {
    let value = text.trim().parse::<f32>().ok()?;
    value.is_finite().then_some(value)
}

/// Formats `value` with `decimals` fraction digits followed by `unit`.
///
/// A missing value, or one too wide for the text buffer, renders as the
/// placeholder with the unit kept, so the layout keeps its shape.
pub fn format_value(value: Option<f32>, decimals: usize, unit: &str) -> String<VALUE_TEXT_BYTES> {
    let mut out = String::new();
    if let Some(value) = value.filter(|value| value.is_finite())
        && write!(out, "{:.*}{}", decimals, value, unit).is_ok()
    {
        return out;
    }

    out.clear();
    let _ = write!(out, "{}{}", PLACEHOLDER, unit);
    out
}
