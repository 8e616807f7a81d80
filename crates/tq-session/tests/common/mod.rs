use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

use tq_core::{
    Column, ColumnType, Engine, EventBus, Query, Row, SearchResult, SessionEvent,
    SessionSubscriber, UniqueValues,
};

/// Scripted engine double
///
/// Canned responses with interior mutability so tests can change backend
/// behavior between calls; every command invocation is recorded.
pub struct MockEngine {
    pub load_ok: Mutex<bool>,
    pub setting_ok: Mutex<bool>,
    pub save_ok: Mutex<bool>,
    pub columns: Vec<Column>,
    pub preview: Vec<Row>,
    pub total_rows: usize,
    pub unique: HashMap<String, UniqueValues>,
    pub search_result: Mutex<SearchResult>,
    pub pages: Mutex<VecDeque<Vec<Row>>>,
    pub queries: Mutex<Vec<Query>>,
    pub calls: Mutex<Vec<String>>,
}

/// `n` rows of the sample dataset starting at row `start`
pub fn rows(start: usize, n: usize) -> Vec<Row> {
    (start..start + n)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("name-{i}"),
                "joined": "2023-03-01",
            })
        })
        .collect()
}

impl MockEngine {
    /// Backend holding the three-column sample dataset from the
    /// end-to-end scenario: id (Int64), name (String), joined (String
    /// holding dates)
    pub fn sample() -> Arc<Self> {
        let columns = vec![
            Column {
                name: "id".to_string(),
                datatype: "Int64".to_string(),
                values: vec![json!(5)],
            },
            Column {
                name: "name".to_string(),
                datatype: "String".to_string(),
                values: vec![json!("Alice")],
            },
            Column {
                name: "joined".to_string(),
                datatype: "String".to_string(),
                values: vec![json!("2023-03-01")],
            },
        ];

        let mut unique = HashMap::new();
        unique.insert(
            "name".to_string(),
            UniqueValues {
                datatype: "String".to_string(),
                values: vec![json!("Alice"), json!("Bob")],
            },
        );
        unique.insert(
            "joined".to_string(),
            UniqueValues {
                datatype: "Date".to_string(),
                values: vec![json!(0), json!(365)],
            },
        );

        Arc::new(Self {
            load_ok: Mutex::new(true),
            setting_ok: Mutex::new(true),
            save_ok: Mutex::new(true),
            columns,
            preview: rows(0, 100),
            total_rows: 250,
            unique,
            search_result: Mutex::new(SearchResult {
                columns: vec!["id".to_string(), "name".to_string(), "joined".to_string()],
                records: rows(0, 100),
            }),
            pages: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn push_page(&self, page: Vec<Row>) {
        self.pages.lock().push_back(page);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn last_query(&self) -> Query {
        self.queries.lock().last().cloned().expect("no search ran")
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }
}

#[async_trait::async_trait]
impl Engine for MockEngine {
    async fn load(&self, _path: &Path) -> anyhow::Result<bool> {
        self.record("load");
        Ok(*self.load_ok.lock())
    }

    async fn count(&self) -> anyhow::Result<usize> {
        self.record("count");
        Ok(self.total_rows)
    }

    async fn columns(&self) -> anyhow::Result<Vec<Column>> {
        self.record("columns");
        Ok(self.columns.clone())
    }

    async fn preview(&self, count: usize) -> anyhow::Result<Vec<Row>> {
        self.record("preview");
        Ok(self.preview.iter().take(count).cloned().collect())
    }

    async fn unique(&self, name: &str) -> anyhow::Result<UniqueValues> {
        self.record("unique");
        Ok(self
            .unique
            .get(name)
            .cloned()
            .unwrap_or_else(|| UniqueValues {
                datatype: "String".to_string(),
                values: Vec::new(),
            }))
    }

    async fn apply_setting(
        &self,
        _columns: &indexmap::IndexMap<String, ColumnType>,
    ) -> anyhow::Result<bool> {
        self.record("setting");
        Ok(*self.setting_ok.lock())
    }

    async fn search(&self, query: Query) -> anyhow::Result<SearchResult> {
        self.record("search");
        self.queries.lock().push(query);
        Ok(self.search_result.lock().clone())
    }

    async fn search_more(&self, _start: usize) -> anyhow::Result<Vec<Row>> {
        self.record("search_more");
        Ok(self.pages.lock().pop_front().unwrap_or_default())
    }

    async fn save(&self, _path: &Path) -> anyhow::Result<bool> {
        self.record("save");
        Ok(*self.save_ok.lock())
    }
}

/// Event subscriber that records everything it sees
#[derive(Default)]
pub struct Recorder {
    pub seen: Mutex<Vec<SessionEvent>>,
}

impl Recorder {
    pub fn subscribe(bus: &EventBus) -> Arc<Self> {
        let recorder = Arc::new(Self::default());
        bus.subscribe(recorder.clone());
        recorder
    }

    pub fn seen(&self) -> Vec<SessionEvent> {
        self.seen.lock().clone()
    }
}

impl SessionSubscriber for Recorder {
    fn on_session_event(&self, event: &SessionEvent) {
        self.seen.lock().push(event.clone());
    }
}
