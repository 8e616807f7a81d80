//! Backend command contract
//!
//! The data engine that parses, stores, filters and aggregates the loaded
//! file is an external collaborator. The session reaches it exclusively
//! through this trait, one method per backend command. A `false` return
//! and an `Err` both count as command failure; no command is retried.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{Column, ColumnType, Dimension, Filter, Metric, Rule, SearchItem};

/// One result row, as raw JSON from the backend
pub type Row = serde_json::Value;

/// Distinct values of one column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueValues {
    /// Backend type tag of the column; date columns report "Date" and
    /// return integer day counts
    pub datatype: String,
    pub values: Vec<serde_json::Value>,
}

/// Full query payload: the confirmed configuration plus ad-hoc narrowing
/// values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub dimensions: Dimension,
    pub metrics: Vec<Metric>,
    pub filters: Vec<Filter>,
    pub rules: Vec<Rule>,
    /// Empty for a full reset; one entry per actively narrowed field
    pub search: Vec<SearchItem>,
}

/// Response to a full or narrowed search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Column layout of the result set
    pub columns: Vec<String>,
    pub records: Vec<Row>,
}

/// Asynchronous command interface to the backend data engine
///
/// Pagination context lives server-side: `search` establishes the query
/// and `search_more` pages through it by start offset alone.
#[async_trait::async_trait]
pub trait Engine: Send + Sync {
    /// Load a file as the active dataset, resetting server-side query state
    async fn load(&self, path: &Path) -> anyhow::Result<bool>;

    /// Row count of the loaded dataset
    async fn count(&self) -> anyhow::Result<usize>;

    /// Source columns with type tags and sample values, in source order
    async fn columns(&self) -> anyhow::Result<Vec<Column>>;

    /// First `count` raw rows
    async fn preview(&self, count: usize) -> anyhow::Result<Vec<Row>>;

    /// Distinct values for one column
    async fn unique(&self, name: &str) -> anyhow::Result<UniqueValues>;

    /// Commit column type overrides; only the type map of the Setting is
    /// sent
    async fn apply_setting(&self, columns: &IndexMap<String, ColumnType>) -> anyhow::Result<bool>;

    /// Run a full query
    async fn search(&self, query: Query) -> anyhow::Result<SearchResult>;

    /// Next page of the prior query, starting at row `start`
    async fn search_more(&self, start: usize) -> anyhow::Result<Vec<Row>>;

    /// Persist the last query result to a file
    async fn save(&self, path: &Path) -> anyhow::Result<bool>;
}
