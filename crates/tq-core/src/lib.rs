//! Core functionality for the table query engine
//!
//! This crate provides the query configuration model, the column type
//! inference heuristic, the backend command contract and the session
//! event bus. Orchestration on top of these lives in `tq-session`.

pub mod engine;
pub mod events;
pub mod infer;
pub mod model;
pub mod setting;

// Re-export commonly used types
pub use engine::{Engine, Query, Row, SearchResult, UniqueValues};
pub use events::{EventBus, SessionEvent, SessionSubscriber};
pub use infer::{infer, infer_columns};
pub use model::{
    Column, ColumnType, Dimension, Filter, FilterMode, Metric, MetricMode, Rule, SearchItem,
    Setting,
};
pub use setting::SettingAction;
