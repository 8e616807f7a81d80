//! Dataset session state machine and query orchestration
//!
//! One `Session` owns the loaded dataset and everything derived from it.
//! All mutation goes through `&mut self`, so a session has a single
//! writer by construction; backend responses land on the same owner that
//! issued the request. Lifecycle: empty -> loading -> loaded (idle) <->
//! reading, with an explicit close back to empty.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use tq_core::{
    infer_columns, Engine, EventBus, Filter, Query, Row, SearchItem, SessionEvent, Setting,
    SettingAction,
};

use crate::values::{self, FilterValues};
use crate::SessionError;

/// Raw rows requested for the initial preview
const PREVIEW_ROWS: usize = 100;

/// The loaded file and its in-memory record buffer
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Path of the loaded file; `None` while the session is empty
    pub path: Option<PathBuf>,
    /// True while the load pipeline is running
    pub loading: bool,
    /// True while a search is running
    pub reading: bool,
    /// Source column names, in source order
    pub columns: Vec<String>,
    /// Current record buffer: preview rows after a load, query results
    /// after a search, extended by accepted pages
    pub records: Vec<Row>,
}

/// Client-side session over one backend engine
pub struct Session {
    engine: Arc<dyn Engine>,
    events: Arc<EventBus>,
    dataset: Dataset,
    setting: Setting,
    search: Vec<SearchItem>,
    values: FilterValues,
    /// Column layout of the current record buffer; searches replace it
    layout: Vec<String>,
}

impl Session {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            events: Arc::new(EventBus::new()),
            dataset: Dataset::default(),
            setting: Setting::new(),
            search: Vec::new(),
            values: FilterValues::new(),
            layout: Vec::new(),
        }
    }

    /// Event bus this session publishes lifecycle events on
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn setting(&self) -> &Setting {
        &self.setting
    }

    /// Ad-hoc narrowing values currently held
    pub fn search_items(&self) -> &[SearchItem] {
        &self.search
    }

    /// Distinct values per filter field, populated on confirm
    pub fn filter_values(&self) -> &FilterValues {
        &self.values
    }

    /// Column layout of the current record buffer
    pub fn layout(&self) -> &[String] {
        &self.layout
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.path.is_some()
    }

    /// Load a file as the active dataset
    ///
    /// Only valid while the session is empty. On success the record
    /// buffer holds the preview, the column layout is the source order
    /// and a fresh inferred Setting replaces the old one wholesale. Any
    /// failure in the pipeline resets the session to empty.
    pub async fn open(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        if self.dataset.loading {
            return Err(SessionError::Busy("load"));
        }
        if self.dataset.reading {
            return Err(SessionError::Busy("search"));
        }
        if self.dataset.path.is_some() {
            return Err(SessionError::AlreadyLoaded);
        }

        let path = path.as_ref().to_path_buf();
        self.dataset.loading = true;
        match self.run_load(&path).await {
            Ok(()) => {
                self.dataset.loading = false;
                Ok(())
            }
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    async fn run_load(&mut self, path: &Path) -> Result<(), SessionError> {
        let loaded = self.engine.load(path).await?;
        if !loaded {
            return Err(SessionError::LoadRejected);
        }

        let columns = self.engine.columns().await?;
        let records = self.engine.preview(PREVIEW_ROWS).await?;
        if let Ok(rows) = self.engine.count().await {
            debug!(rows, path = %path.display(), "dataset row count");
        }

        self.dataset.path = Some(path.to_path_buf());
        self.dataset.columns = columns.iter().map(|column| column.name.clone()).collect();
        self.dataset.records = records;
        self.layout = self.dataset.columns.clone();
        self.setting = Setting::with_columns(infer_columns(&columns));
        self.search.clear();
        self.values = FilterValues::new();

        info!(
            path = %path.display(),
            columns = self.dataset.columns.len(),
            "dataset loaded"
        );
        self.events.publish(&SessionEvent::DatasetLoaded {
            path: path.to_path_buf(),
            rows: self.dataset.records.len(),
            columns: self.dataset.columns.len(),
        });
        Ok(())
    }

    /// Return the session to the empty state
    ///
    /// Only valid when loaded and idle.
    pub fn close(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.reset();
        info!("dataset closed");
        self.events.publish(&SessionEvent::DatasetClosed);
        Ok(())
    }

    /// Apply one configuration edit
    pub fn apply(&mut self, action: SettingAction) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.setting = self.setting.apply(action);
        Ok(())
    }

    /// Confirm the configuration with the backend
    ///
    /// On acceptance: full search, filter value cache rebuilt, `active`
    /// set. On rejection the Setting, cache and records are untouched and
    /// a retry starts from the same state.
    pub async fn confirm(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;

        let accepted = self.engine.apply_setting(&self.setting.columns).await?;
        if !accepted {
            return Err(SessionError::ConfirmRejected);
        }

        self.run_search(true).await?;
        self.values = values::populate(&self.engine, &self.setting.filters).await?;
        self.setting.active = true;

        info!(
            filters = self.setting.filters.len(),
            metrics = self.setting.metrics.len(),
            "setting confirmed"
        );
        self.events.publish(&SessionEvent::SettingConfirmed);
        Ok(())
    }

    /// Record the user's narrowing values for one filter field
    ///
    /// An empty value list keeps the entry; the backend skips fields with
    /// no values. Values for a field that is not a declared filter are
    /// dropped.
    pub fn set_search_value(&mut self, index: &str, value: Vec<String>) -> Result<(), SessionError> {
        self.ensure_idle()?;

        match self.setting.filters.iter().find(|f| f.index == index) {
            Some(filter) => merge_search_value(&mut self.search, filter, value),
            None => warn!(field = index, "narrowing value for unknown filter field"),
        }
        Ok(())
    }

    /// Run a query and replace the record buffer and column layout
    ///
    /// `all` ignores the held narrowing values and clears them once the
    /// response lands; a narrowed search sends them along. Either way the
    /// response restarts pagination from the top.
    pub async fn search(&mut self, all: bool) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.run_search(all).await
    }

    async fn run_search(&mut self, all: bool) -> Result<(), SessionError> {
        let query = Query {
            dimensions: self.setting.dimensions.clone(),
            metrics: self.setting.metrics.clone(),
            filters: self.setting.filters.clone(),
            rules: self.setting.rules.clone(),
            search: if all { Vec::new() } else { self.search.clone() },
        };

        self.dataset.reading = true;
        let outcome = self.engine.search(query).await;
        self.dataset.reading = false;

        let result = outcome?;
        self.dataset.records = result.records;
        self.layout = result.columns;
        if all {
            self.search.clear();
        }

        debug!(rows = self.dataset.records.len(), all, "record buffer replaced");
        self.events.publish(&SessionEvent::ResultsReplaced {
            rows: self.dataset.records.len(),
        });
        Ok(())
    }

    /// Fetch the next page, where `start` is the caller's believed row
    /// count at request time
    ///
    /// The page is appended only if `start` still equals the buffer
    /// length when the response arrives and the page is non-empty; a
    /// mismatch means the buffer was replaced while the fetch was in
    /// flight and the page is silently discarded. Returns whether rows
    /// were appended.
    pub async fn fetch_more(&mut self, start: usize) -> Result<bool, SessionError> {
        if self.dataset.loading {
            return Err(SessionError::Busy("load"));
        }
        if self.dataset.path.is_none() {
            return Err(SessionError::NoDataset);
        }

        let page = self.engine.search_more(start).await?;

        if start != self.dataset.records.len() || page.is_empty() {
            debug!(
                start,
                have = self.dataset.records.len(),
                got = page.len(),
                "discarding stale or empty page"
            );
            return Ok(false);
        }

        let rows = page.len();
        self.dataset.records.extend(page);
        self.events.publish(&SessionEvent::PageAppended { start, rows });
        Ok(true)
    }

    /// Persist the last query result through the backend
    ///
    /// Requires a confirmed setting. A `SaveCompleted` event is published
    /// whether or not the backend accepted; the returned flag is the
    /// backend's answer.
    pub async fn save(&mut self, path: impl AsRef<Path>) -> Result<bool, SessionError> {
        self.ensure_idle()?;
        if !self.setting.active {
            return Err(SessionError::NotConfirmed);
        }

        let path = path.as_ref().to_path_buf();
        match self.engine.save(&path).await {
            Ok(ok) => {
                if ok {
                    info!(path = %path.display(), "query result saved");
                } else {
                    warn!(path = %path.display(), "backend rejected save");
                }
                self.events.publish(&SessionEvent::SaveCompleted { path, ok });
                Ok(ok)
            }
            Err(err) => {
                self.events
                    .publish(&SessionEvent::SaveCompleted { path, ok: false });
                Err(err.into())
            }
        }
    }

    /// Loaded, not loading, not reading
    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.dataset.loading {
            return Err(SessionError::Busy("load"));
        }
        if self.dataset.reading {
            return Err(SessionError::Busy("search"));
        }
        if self.dataset.path.is_none() {
            return Err(SessionError::NoDataset);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.dataset = Dataset::default();
        self.setting = Setting::new();
        self.search.clear();
        self.values = FilterValues::new();
        self.layout.clear();
    }
}

/// Merge one field's narrowing values into the ad-hoc search list
///
/// The entry keyed by the filter's index is updated in place without
/// reordering; a field narrowed for the first time is appended carrying
/// the filter's current mode.
fn merge_search_value(search: &mut Vec<SearchItem>, filter: &Filter, value: Vec<String>) {
    match search.iter_mut().find(|item| item.index == filter.index) {
        Some(item) => item.value = value,
        None => search.push(SearchItem {
            index: filter.index.clone(),
            mode: filter.mode,
            value,
        }),
    }
}
