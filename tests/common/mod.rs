#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hierarchy_filter::{
    ColumnFilter, Error, FactSource, HierarchyColumn, HierarchyQuery, HierarchyRow,
    HierarchySource, LevelFilter, Result, SessionConfig, path_is_under,
};

pub fn row(key: &str, pred: &str, level: u16, path: &str, children: &str, is_leaf: u8) -> HierarchyRow {
    HierarchyRow {
        result_node: key.to_string(),
        result_node_name: format!("{key} name"),
        pred_node: pred.to_string(),
        query_node: key.to_string(),
        level,
        is_leaf,
        path: path.to_string(),
        children: children.to_string(),
    }
}

pub fn config() -> SessionConfig {
    SessionConfig::new(HierarchyColumn::new("COST_CENTER", "/CostCenterHierarchy"))
}

/// Backend with canned rows; records queries. Shared through `Arc` so tests
/// can inspect it after handing it to a session.
#[derive(Default)]
pub struct Fixture {
    pub rows: Vec<HierarchyRow>,
    /// Fixed answer to `LeavesUnder` queries, when set.
    pub leaves: Option<Vec<HierarchyRow>>,
    pub fail_leaf_names: bool,
    pub fail_leaves_under: bool,
    pub queries: Mutex<Vec<HierarchyQuery>>,
}

impl Fixture {
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn levels(&self) -> Vec<LevelFilter> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.level.clone())
            .collect()
    }
}

#[async_trait]
impl HierarchySource for Fixture {
    async fn read(&self, query: &HierarchyQuery) -> Result<Vec<HierarchyRow>> {
        self.queries.lock().unwrap().push(query.clone());
        let rows = match &query.level {
            LevelFilter::Root => self.rows.iter().filter(|r| r.level == 0).cloned().collect(),
            LevelFilter::PredNode(id) => {
                self.rows.iter().filter(|r| &r.pred_node == id).cloned().collect()
            }
            LevelFilter::ResultNodeIn(ids) => self
                .rows
                .iter()
                .filter(|r| ids.contains(&r.result_node))
                .cloned()
                .collect(),
            LevelFilter::LeafNamesIn(names) => {
                if self.fail_leaf_names {
                    return Err(Error::fetch("leaf names", "503 service unavailable"));
                }
                self.rows
                    .iter()
                    .filter(|r| r.is_leaf() && names.contains(&r.result_node_name))
                    .cloned()
                    .collect()
            }
            LevelFilter::LeavesUnder(prefixes) => {
                if self.fail_leaves_under {
                    return Err(Error::fetch("leaves", "503 service unavailable"));
                }
                self.leaves.clone().unwrap_or_else(|| {
                    self.rows
                        .iter()
                        .filter(|r| r.is_leaf() && prefixes.iter().any(|p| path_is_under(&r.path, p)))
                        .cloned()
                        .collect()
                })
            }
        };
        Ok(rows)
    }
}

/// Fact column values; records the column and filters of every call.
#[derive(Default)]
pub struct Facts {
    pub values: Vec<String>,
    pub calls: Mutex<Vec<(String, Vec<ColumnFilter>)>>,
}

impl Facts {
    pub fn of(values: &[&str]) -> Self {
        Self {
            values: values.iter().map(ToString::to_string).collect(),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<ColumnFilter>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FactSource for Facts {
    async fn column_values(&self, column: &str, filters: &[ColumnFilter]) -> Result<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((column.to_string(), filters.to_vec()));
        Ok(self.values.clone())
    }
}
