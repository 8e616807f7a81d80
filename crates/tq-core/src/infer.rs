//! Column type inference
//!
//! The backend's type tags are coarse (a CSV column often arrives as plain
//! text), so the session re-derives a UI-relevant [`ColumnType`] from one
//! representative sample per column. The heuristic favors String over a
//! false positive on short numeric-looking values.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::model::{Column, ColumnType};

/// 2- or 4-digit year, 2-digit month, 2-digit day, with `-`/`.`/`/` or
/// CJK date marker separators
static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}|\d{4})[-年./]*(\d{2})[-./月]*(\d{2})日*$").unwrap());

static INT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

static FLOAT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[.0-9%]+$").unwrap());

/// Leading numeric prefix, the portion a lenient float parse would consume
static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+\.?[0-9]*|\.[0-9]+)").unwrap());

/// Threshold above which an Int64 sample is classified via its string form,
/// so ids wider than 32 bits never read as Int
const INT32_MAX: f64 = 2_147_483_647.0;

/// Infer the semantic type of a column from the backend type tag and one
/// sample value
///
/// Pure and total: ambiguous or missing samples come back as
/// [`ColumnType::String`].
pub fn infer(datatype: &str, sample: &Value) -> ColumnType {
    if datatype == "Int64" {
        if let Some(v) = sample.as_f64() {
            if v > INT32_MAX {
                return infer_text(&sample.to_string());
            }
        }
    }

    match sample {
        Value::String(text) => infer_text(text),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v.fract() == 0.0 => ColumnType::Int,
            Some(_) => ColumnType::Float,
            None => ColumnType::String,
        },
        _ => ColumnType::String,
    }
}

/// Classify a textual sample
fn infer_text(text: &str) -> ColumnType {
    let text = text.trim();

    if text.chars().count() >= 8 && DATE_PATTERN.is_match(text) {
        return ColumnType::Date;
    }
    // Long values are opaque strings; never risk reading them as numbers
    if text.chars().count() > 9 {
        return ColumnType::String;
    }
    if INT_PATTERN.is_match(text) && text.parse::<i64>().is_ok() {
        return ColumnType::Int;
    }
    if FLOAT_PATTERN.is_match(text) && parse_float_prefix(text).is_some() {
        return ColumnType::Float;
    }
    ColumnType::String
}

/// Parse the leading numeric portion of a value like `12.5%`
fn parse_float_prefix(text: &str) -> Option<f64> {
    FLOAT_PREFIX
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Infer types for every backend-reported column, preserving source order
///
/// Columns with no sample values default to String.
pub fn infer_columns(columns: &[Column]) -> IndexMap<String, ColumnType> {
    columns
        .iter()
        .map(|column| {
            let dtype = column
                .values
                .first()
                .map_or(ColumnType::String, |sample| infer(&column.datatype, sample));
            (column.name.clone(), dtype)
        })
        .collect()
}
