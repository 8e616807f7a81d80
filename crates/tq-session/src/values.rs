//! Filter value cache
//!
//! Once a configuration is confirmed, every filter field gets the
//! backend's distinct-value list so pickers can offer concrete choices.
//! The cache is rebuilt wholesale on each confirm, never merged.

use std::sync::Arc;

use chrono::DateTime;
use futures::future::try_join_all;
use indexmap::IndexMap;
use serde_json::Value;

use tq_core::{Engine, Filter, UniqueValues};

use crate::SessionError;

const MS_PER_DAY: i64 = 86_400_000;

/// Selectable values per filter field, in filter order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterValues {
    values: IndexMap<String, Vec<String>>,
}

impl FilterValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values for one filter field, if cached
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Cached fields and their values, in filter order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

/// Fetch distinct values for every filter field
///
/// The per-field fetches are read-only and independently keyed, so they
/// run concurrently; the result preserves filter order.
pub(crate) async fn populate(
    engine: &Arc<dyn Engine>,
    filters: &[Filter],
) -> Result<FilterValues, SessionError> {
    let fetches = filters.iter().map(|filter| {
        let engine = Arc::clone(engine);
        let name = filter.index.clone();
        async move {
            let unique = engine.unique(&name).await?;
            Ok::<_, anyhow::Error>((name, render_values(&unique)))
        }
    });

    let pairs = try_join_all(fetches).await?;
    Ok(FilterValues {
        values: pairs.into_iter().collect(),
    })
}

/// Render a distinct-value list for display
///
/// Date columns arrive as integer day counts and become `YYYY-MM-DD`;
/// everything else is stringified as-is.
fn render_values(unique: &UniqueValues) -> Vec<String> {
    unique
        .values
        .iter()
        .map(|value| {
            if unique.datatype == "Date" {
                if let Some(days) = value.as_i64() {
                    return format_day(days);
                }
            }
            render_scalar(value)
        })
        .collect()
}

/// Calendar date string for an epoch day count
fn format_day(days: i64) -> String {
    match DateTime::from_timestamp_millis(days * MS_PER_DAY) {
        Some(moment) => moment.date_naive().format("%Y-%m-%d").to_string(),
        None => days.to_string(),
    }
}

/// String form of a scalar value, without JSON quoting for strings
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
