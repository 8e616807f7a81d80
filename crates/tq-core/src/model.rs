//! Query configuration data model
//!
//! These types travel between the UI collaborator, the session and the
//! backend engine. The enums use the backend's integer wire codes, so
//! serialization is written by hand rather than derived.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Semantic type assigned to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String = 0,
    Int = 1,
    Float = 2,
    Date = 3,
}

impl Serialize for ColumnType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i32(*self as i32)
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i32::deserialize(deserializer)?;
        Ok(match value {
            1 => ColumnType::Int,
            2 => ColumnType::Float,
            3 => ColumnType::Date,
            _ => ColumnType::String,
        })
    }
}

/// Column as reported by the backend after a load
///
/// Transient: the sample values seed type inference and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name, in source order
    pub name: String,
    /// Backend type tag (e.g. "Int64", "String")
    pub datatype: String,
    /// Representative sample values, possibly empty
    pub values: Vec<serde_json::Value>,
}

/// Row/column axis fields grouping a query's output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// Row axis column names
    pub rows: Vec<String>,
    /// Column axis column names
    pub columns: Vec<String>,
}

/// Aggregation requested for a metric column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricMode {
    Sum = 0,
    Count = 1,
    Max = 2,
    Min = 3,
    Avg = 4,
    Rate = 5,
}

impl Serialize for MetricMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i32(*self as i32)
    }
}

impl<'de> Deserialize<'de> for MetricMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i32::deserialize(deserializer)?;
        Ok(match value {
            0 => MetricMode::Sum,
            2 => MetricMode::Max,
            3 => MetricMode::Min,
            4 => MetricMode::Avg,
            5 => MetricMode::Rate,
            _ => MetricMode::Count,
        })
    }
}

/// Numeric aggregation for one column, keyed by column name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Column name
    pub index: String,
    /// Aggregation mode
    pub mode: MetricMode,
}

/// How a filter field is queried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Single = 0,
    Multi = 1,
    MatchPrefix = 2,
    DateRange = 3,
    DigitalRange = 4,
}

impl Serialize for FilterMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i32(*self as i32)
    }
}

impl<'de> Deserialize<'de> for FilterMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i32::deserialize(deserializer)?;
        Ok(match value {
            0 => FilterMode::Single,
            1 => FilterMode::Multi,
            3 => FilterMode::DateRange,
            4 => FilterMode::DigitalRange,
            _ => FilterMode::MatchPrefix,
        })
    }
}

/// Declared, reusable query field and its interaction mode
///
/// Carries no value; a concrete value supplied during narrowing is a
/// [`SearchItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Column name
    pub index: String,
    /// Query mode
    pub mode: FilterMode,
}

/// Computed-column expression, passed through to the backend unmodified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub calc: String,
}

/// Ad-hoc value supplied for a filter field during result narrowing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    /// Filter field name
    pub index: String,
    /// Query mode snapshot taken from the filter
    pub mode: FilterMode,
    /// User-entered values
    pub value: Vec<String>,
}

/// The full, confirmable query configuration
///
/// Created fresh on every successful load and replaced wholesale; the
/// pure transitions in [`crate::setting`] produce updated copies.
/// `active` flips to true only after a successful confirm round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    /// Column name -> semantic type; insertion order is the display order
    pub columns: IndexMap<String, ColumnType>,
    /// Row/column grouping axes
    pub dimensions: Dimension,
    /// Aggregations, at most one per column name
    pub metrics: Vec<Metric>,
    /// Declared filter fields, at most one per column name
    pub filters: Vec<Filter>,
    /// Computed-column rules, opaque to the client
    pub rules: Vec<Rule>,
    /// Whether this configuration has been confirmed with the backend
    pub active: bool,
}

impl Setting {
    /// Fresh, unconfirmed configuration with no columns
    pub fn new() -> Self {
        Self::with_columns(IndexMap::new())
    }

    /// Fresh, unconfirmed configuration over the given column types
    pub fn with_columns(columns: IndexMap<String, ColumnType>) -> Self {
        Self {
            columns,
            dimensions: Dimension::default(),
            metrics: Vec::new(),
            filters: Vec::new(),
            rules: Vec::new(),
            active: false,
        }
    }

    /// Column names eligible as row/column dimensions
    ///
    /// Only String and Date typed columns group meaningfully, so only
    /// those are offered.
    pub fn dimension_candidates(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, dtype)| matches!(dtype, ColumnType::String | ColumnType::Date))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl Default for Setting {
    fn default() -> Self {
        Self::new()
    }
}
