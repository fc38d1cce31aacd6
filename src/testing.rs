//! In-memory backends for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{ColumnFilter, FactSource, HierarchyQuery, HierarchySource, LevelFilter};
use crate::error::{Error, Result};
use crate::path::{path_is_under, split_path};
use crate::row::HierarchyRow;

fn row(key: &str, level: u16, path: &str, children: &str, is_leaf: u8) -> HierarchyRow {
    let pred = split_path(path)
        .ok()
        .and_then(|nodes| nodes.len().checked_sub(2).map(|idx| nodes[idx].to_string()))
        .unwrap_or_default();
    HierarchyRow {
        result_node: key.to_string(),
        result_node_name: key.to_string(),
        pred_node: pred,
        query_node: key.to_string(),
        level,
        is_leaf,
        path: path.to_string(),
        children: children.to_string(),
    }
}

pub fn internal(key: &str, level: u16, path: &str, children: &str) -> HierarchyRow {
    row(key, level, path, children, 0)
}

pub fn leaf(key: &str, level: u16, path: &str) -> HierarchyRow {
    row(key, level, path, "", 1)
}

/// Serves a fixed set of rows and records every query it receives.
#[derive(Default)]
pub struct MockHierarchy {
    rows: Vec<HierarchyRow>,
    queries: Mutex<Vec<HierarchyQuery>>,
    fail_when: Option<fn(&LevelFilter) -> bool>,
    delay: Option<Duration>,
}

impl MockHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<HierarchyRow>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn with_leaves(self, rows: Vec<HierarchyRow>) -> Self {
        self.with_rows(rows)
    }

    pub fn failing_when(mut self, predicate: fn(&LevelFilter) -> bool) -> Self {
        self.fail_when = Some(predicate);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queries(&self) -> Vec<HierarchyQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn matches(row: &HierarchyRow, level: &LevelFilter) -> bool {
        match level {
            LevelFilter::Root => row.level == 0,
            LevelFilter::ResultNodeIn(ids) => ids.contains(&row.result_node),
            LevelFilter::PredNode(id) => &row.pred_node == id,
            LevelFilter::LeavesUnder(prefixes) => {
                row.is_leaf() && prefixes.iter().any(|prefix| path_is_under(&row.path, prefix))
            }
            LevelFilter::LeafNamesIn(names) => {
                row.is_leaf() && names.contains(&row.result_node_name)
            }
        }
    }
}

#[async_trait]
impl HierarchySource for MockHierarchy {
    async fn read(&self, query: &HierarchyQuery) -> Result<Vec<HierarchyRow>> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_when.is_some_and(|fail| fail(&query.level)) {
            return Err(Error::fetch("mock", "backend unavailable"));
        }
        Ok(self
            .rows
            .iter()
            .filter(|row| Self::matches(row, &query.level))
            .cloned()
            .collect())
    }
}

/// Returns a fixed list of column values, or fails. Records each request.
pub struct MockFacts {
    values: Result<Vec<String>>,
    requests: Mutex<Vec<(String, Vec<ColumnFilter>)>>,
}

impl MockFacts {
    pub fn new(values: &[&str]) -> Self {
        Self {
            values: Ok(values.iter().map(ToString::to_string).collect()),
            requests: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            values: Err(Error::fetch("facts", "backend unavailable")),
            requests: Mutex::default(),
        }
    }

    pub fn requests(&self) -> Vec<(String, Vec<ColumnFilter>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FactSource for MockFacts {
    async fn column_values(&self, column: &str, filters: &[ColumnFilter]) -> Result<Vec<String>> {
        self.requests
            .lock()
            .unwrap()
            .push((column.to_string(), filters.to_vec()));
        self.values.clone()
    }
}
