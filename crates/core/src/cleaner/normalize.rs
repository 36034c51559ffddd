//! Row extraction, key normalization and value coercion.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::constants::RECORD_DECIMAL_PRECISION;
use crate::errors::StructuralError;
use crate::records::types::FETCH_TIMESTAMP_FORMAT;
use crate::records::DatasetKind;

/// Known spellings mapped onto canonical column names, after lowercasing.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("price", "current_price"),
    ("currentprice", "current_price"),
    ("marketcap", "market_cap"),
    ("volume", "total_volume"),
    ("totalvolume", "total_volume"),
    ("published_at", "publishedat"),
    ("published", "publishedat"),
    ("headline", "title"),
    ("body", "content"),
];

pub(super) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Finds the row objects of a payload.
///
/// Market payloads are an array of rows or a single row object. News payloads are
/// `{"articles": [...]}`, a bare array, or a single article object.
pub(super) fn extract_rows(
    kind: DatasetKind,
    payload: &Value,
) -> Result<Vec<&Map<String, Value>>, StructuralError> {
    let rows: Vec<&Value> = match (kind, payload) {
        (_, Value::Array(rows)) => rows.iter().collect(),
        (DatasetKind::News, Value::Object(map)) if map.contains_key("articles") => {
            match map.get("articles") {
                Some(Value::Array(rows)) => rows.iter().collect(),
                Some(other) => {
                    return Err(StructuralError::UnexpectedShape {
                        kind: kind.to_string(),
                        expected: "an 'articles' array",
                        found: json_type(other),
                    })
                }
                None => Vec::new(),
            }
        }
        (_, Value::Object(_)) => vec![payload],
        (_, other) => {
            return Err(StructuralError::UnexpectedShape {
                kind: kind.to_string(),
                expected: "an array or object",
                found: json_type(other),
            })
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| match row {
            Value::Object(map) => Ok(map),
            other => Err(StructuralError::NonObjectRow {
                kind: kind.to_string(),
                index,
                found: json_type(other),
            }),
        })
        .collect()
}

/// Lowercases, maps spaces and hyphens to `_`, then applies known aliases.
pub(super) fn normalize_key(key: &str) -> String {
    let key: String = key
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect();

    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(key)
}

/// Normalizes every key of a row and flattens a nested news `source` object.
///
/// When two keys normalize to the same name the later one wins.
pub(super) fn normalize_row(row: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in row {
        let key = normalize_key(key);
        if key == "source" {
            match value {
                Value::Object(source) => {
                    out.insert(
                        "source_id".to_string(),
                        source.get("id").cloned().unwrap_or(Value::Null),
                    );
                    out.insert(
                        "source_name".to_string(),
                        source.get("name").cloned().unwrap_or(Value::Null),
                    );
                }
                other => {
                    out.insert("source_name".to_string(), other.clone());
                }
            }
            continue;
        }
        out.insert(key, value.clone());
    }
    out
}

/// Coerces a numeric cell. `None` means the value is not a number.
///
/// Missing, null and blank cells are zero.
pub(super) fn coerce_decimal(value: Option<&Value>) -> Option<Decimal> {
    let parsed = match value {
        None | Some(Value::Null) => Some(Decimal::ZERO),
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) if s.trim().is_empty() => Some(Decimal::ZERO),
        Some(Value::String(s)) => parse_decimal(&s.trim().replace(',', "")),
        Some(_) => None,
    };
    parsed.map(|d| d.round_dp(RECORD_DECIMAL_PRECISION).normalize())
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Coerces a text cell: nulls become empty, scalars their text form.
pub(super) fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => clean_text(s),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => clean_text(&other.to_string()),
    }
}

/// Trims, drops newlines and collapses runs of whitespace to one space.
pub(super) fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical ISO-8601 UTC text for a timestamp cell, empty if unparseable.
pub(super) fn coerce_published(value: Option<&Value>) -> String {
    let text = match value {
        Some(Value::String(s)) => s.trim(),
        _ => return String::new(),
    };
    if text.is_empty() {
        return String::new();
    }

    let parsed = DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|naive| naive.and_utc())
        });

    parsed
        .map(|dt| dt.format(FETCH_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}
