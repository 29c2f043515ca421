//! Per-type conversion between caller text and fixed-width field bytes
//!
//! | Type | Accepted input | Stored as |
//! |---|---|---|
//! | Logical | `T`, `F`, `?` | the single byte |
//! | Date | eight ASCII digits | the eight bytes |
//! | Character | any representable text | code-page bytes, left-justified, space-padded, cut to width |
//! | Number / Float | integer or decimal literal | right-justified, decimals padded to the field's places |
//!
//! An empty input clears the slot. A cleared slot is written as spaces.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::encoding::CodePage;
use crate::errors::{DbfError, DbfResult};
use crate::schema::{FieldDescriptor, FieldType};

/// Filler for unused bytes of a field
pub const PADDING: u8 = b' ';

fn numeric_literal() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([+-]?)([0-9]*)(?:\.([0-9]*))?$").expect("numeric literal pattern is valid")
    })
}

/// Encode caller text into the stored bytes for `field`.
///
/// Returns an empty buffer for empty input (unset slot); otherwise the
/// buffer is exactly `field.length()` bytes.
///
/// # Errors
///
/// - `DBF_VALUE_ENCODING_ERROR` if the text does not fit the type grammar
/// - `DBF_UNSUPPORTED_CHARACTER` if Character text has no code-page mapping
pub fn encode_value(
    field: &FieldDescriptor,
    value: &str,
    code_page: &CodePage,
) -> DbfResult<Vec<u8>> {
    if value.is_empty() {
        return Ok(Vec::new());
    }

    match field.field_type() {
        FieldType::Logical => encode_logical(field, value),
        FieldType::Date => encode_date(field, value),
        FieldType::Character => encode_character(field, value, code_page),
        FieldType::Number | FieldType::Float => encode_numeric(field, value),
    }
}

fn encode_logical(field: &FieldDescriptor, value: &str) -> DbfResult<Vec<u8>> {
    match value {
        "T" | "F" | "?" => Ok(value.as_bytes().to_vec()),
        _ => Err(DbfError::value_encoding(
            field.name(),
            value,
            "logical values are T, F, ? or empty",
        )),
    }
}

fn encode_date(field: &FieldDescriptor, value: &str) -> DbfResult<Vec<u8>> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DbfError::value_encoding(
            field.name(),
            value,
            "dates are eight digits, YYYYMMDD",
        ));
    }
    Ok(value.as_bytes().to_vec())
}

fn encode_character(
    field: &FieldDescriptor,
    value: &str,
    code_page: &CodePage,
) -> DbfResult<Vec<u8>> {
    let width = usize::from(field.length());
    let mut bytes = code_page.fit(value, width)?;
    bytes.resize(width, PADDING);
    Ok(bytes)
}

fn encode_numeric(field: &FieldDescriptor, value: &str) -> DbfResult<Vec<u8>> {
    let literal = value.trim();
    let caps = numeric_literal().captures(literal).ok_or_else(|| {
        DbfError::value_encoding(field.name(), value, "not a decimal literal")
    })?;

    let negative = caps.get(1).map_or("", |m| m.as_str()) == "-";
    let integer = caps.get(2).map_or("", |m| m.as_str());
    let fraction = caps.get(3).map_or("", |m| m.as_str());
    if integer.is_empty() && fraction.is_empty() {
        return Err(DbfError::value_encoding(field.name(), value, "no digits"));
    }

    let places = usize::from(field.decimal_places());
    if fraction.len() > places {
        return Err(DbfError::value_encoding(
            field.name(),
            value,
            format!(
                "{} fractional digits, field allows {}",
                fraction.len(),
                places
            ),
        ));
    }

    let integer = match integer.trim_start_matches('0') {
        "" => "0",
        digits => digits,
    };
    let is_zero = integer == "0" && fraction.bytes().all(|b| b == b'0');

    let mut text = String::with_capacity(usize::from(field.length()));
    if negative && !is_zero {
        text.push('-');
    }
    text.push_str(integer);
    if places > 0 {
        text.push('.');
        text.push_str(fraction);
        for _ in fraction.len()..places {
            text.push('0');
        }
    }

    let width = usize::from(field.length());
    if text.len() > width {
        return Err(DbfError::value_encoding(
            field.name(),
            value,
            format!("needs {} bytes, field is {} wide", text.len(), width),
        ));
    }
    Ok(format!("{:>width$}", text, width = width).into_bytes())
}

/// Turn stored bytes back into caller text, trimming padding.
///
/// Character fields keep leading spaces; every other type is trimmed on
/// both sides. NUL bytes count as padding, as some writers use them.
pub fn decode_value(
    field: &FieldDescriptor,
    raw: &[u8],
    code_page: &CodePage,
) -> DbfResult<String> {
    let is_padding = |b: &u8| *b == PADDING || *b == 0;
    let end = raw.iter().rposition(|b| !is_padding(b)).map_or(0, |i| i + 1);
    let start = match field.field_type() {
        FieldType::Character => 0,
        _ => raw[..end].iter().position(|b| !is_padding(b)).unwrap_or(end),
    };
    let trimmed = &raw[start..end];

    code_page.decode(trimmed).ok_or_else(|| {
        DbfError::value_parse(
            field.name(),
            &String::from_utf8_lossy(trimmed),
            &format!("{} text", code_page.name()),
        )
    })
}

/// Numeric parsing is defined for Number and Float fields only
fn require_decimal(field: &FieldDescriptor, text: &str, target: &str) -> DbfResult<()> {
    if field.field_type().is_decimal() {
        return Ok(());
    }
    Err(DbfError::value_parse(field.name(), text, target).with_details(format!(
        "field type is {:?}, not Number or Float",
        field.field_type()
    )))
}

/// Parse decoded text as a signed integer. A fractional part is accepted
/// only when every fractional digit is zero.
pub fn parse_int64(field: &FieldDescriptor, text: &str) -> DbfResult<i64> {
    let text = text.trim();
    require_decimal(field, text, "integer")?;
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (text, ""),
    };
    if !fraction.bytes().all(|b| b == b'0') {
        return Err(DbfError::value_parse(field.name(), text, "integer"));
    }
    integer
        .parse::<i64>()
        .map_err(|_| DbfError::value_parse(field.name(), text, "integer"))
}

/// Parse decoded text as a finite decimal number
pub fn parse_float64(field: &FieldDescriptor, text: &str) -> DbfResult<f64> {
    let text = text.trim();
    require_decimal(field, text, "decimal number")?;
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DbfError::value_parse(field.name(), text, "decimal number")),
    }
}

/// Parse decoded text as a logical value; `?` and blank are unknown
pub fn parse_bool(field: &FieldDescriptor, text: &str) -> DbfResult<Option<bool>> {
    match text.trim() {
        "T" | "t" | "Y" | "y" => Ok(Some(true)),
        "F" | "f" | "N" | "n" => Ok(Some(false)),
        "?" | "" => Ok(None),
        other => Err(DbfError::value_parse(field.name(), other, "logical value")),
    }
}

/// Parse decoded `YYYYMMDD` text as a calendar date; blank is no date
pub fn parse_date(field: &FieldDescriptor, text: &str) -> DbfResult<Option<NaiveDate>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let invalid = || DbfError::value_parse(field.name(), text, "YYYYMMDD date");
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = text[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = text[4..6].parse().map_err(|_| invalid())?;
    let day: u32 = text[6..8].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or_else(invalid)
}

/// Render a date as `YYYYMMDD`
pub fn format_date(field: &FieldDescriptor, date: NaiveDate) -> DbfResult<String> {
    if !(0..=9999).contains(&date.year()) {
        return Err(DbfError::value_encoding(
            field.name(),
            &date.to_string(),
            "year must be 0000..=9999",
        ));
    }
    Ok(date.format("%Y%m%d").to_string())
}

/// Render a number with the field's decimal places
pub fn format_float(field: &FieldDescriptor, value: f64) -> DbfResult<String> {
    if !value.is_finite() {
        return Err(DbfError::value_encoding(
            field.name(),
            &value.to_string(),
            "value is not finite",
        ));
    }
    Ok(format!(
        "{:.*}",
        usize::from(field.decimal_places()),
        value
    ))
}

/// Render a logical value
pub fn format_bool(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "T",
        Some(false) => "F",
        None => "?",
    }
}
