//! Dataset session and query orchestration
//!
//! This crate drives the backend engine on behalf of the UI: it owns the
//! loaded dataset, the in-flight configuration, the ad-hoc narrowing
//! values and the filter value cache, and it enforces the session
//! lifecycle (no overlapping loads, no overlapping searches, stale page
//! responses discarded).

pub mod session;
pub mod values;

use thiserror::Error;

// Re-exports
pub use session::{Dataset, Session};
pub use values::FilterValues;

/// Errors surfaced by session operations
///
/// Stale or empty incremental pages are not errors; they are discarded
/// silently. Nothing here is retried automatically.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("operation already in flight: {0}")]
    Busy(&'static str),

    #[error("no dataset loaded")]
    NoDataset,

    #[error("a dataset is already loaded")]
    AlreadyLoaded,

    #[error("backend rejected the file")]
    LoadRejected,

    #[error("backend rejected the setting")]
    ConfirmRejected,

    #[error("setting has not been confirmed")]
    NotConfirmed,

    #[error("engine error: {0}")]
    Engine(#[from] anyhow::Error),
}
