//! Backend boundary: the hierarchy read and the fact-column read.
//!
//! Applications implement these traits on top of their query layer. The
//! traits are runtime-agnostic and use `async_trait`; wrapping calls in a
//! timeout is done by the session.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::row::HierarchyRow;

/// Equality filter on one column (`column IN values`).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: String,
    pub values: Vec<String>,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Row restriction applied to a hierarchy read.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelFilter {
    /// `LEVEL == 0`.
    Root,
    /// `RESULT_NODE IN ids`; never issued with an empty set.
    ResultNodeIn(Vec<String>),
    /// `PRED_NODE == id`.
    PredNode(String),
    /// `PATH` lies under any of the prefixes AND `IS_LEAF == 1`.
    ///
    /// Prefixes are full node paths; match them at a segment boundary so
    /// `N1` does not pick up leaves of a sibling `N10` (see
    /// [`path_is_under`](crate::path_is_under)).
    LeavesUnder(Vec<String>),
    /// `RESULT_NODE_NAME IN names` AND `IS_LEAF == 1`.
    LeafNamesIn(Vec<String>),
}

/// One request against the hierarchy entity.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyQuery {
    /// Backend entity (collection path) holding the hierarchy rows.
    pub entity: String,
    /// Extra filters the application attaches to every hierarchy read.
    pub filters: Vec<ColumnFilter>,
    pub level: LevelFilter,
}

/// Read access to hierarchy rows.
#[async_trait]
pub trait HierarchySource: Send + Sync {
    /// Returns all rows matching `query`.
    ///
    /// Failures should be reported as [`Error::Fetch`](crate::Error::Fetch).
    async fn read(&self, query: &HierarchyQuery) -> Result<Vec<HierarchyRow>>;
}

/// Read access to the fact dataset being filtered.
#[async_trait]
pub trait FactSource: Send + Sync {
    /// Raw values of `column` over the fact rows visible under `filters`.
    async fn column_values(&self, column: &str, filters: &[ColumnFilter]) -> Result<Vec<String>>;
}

#[async_trait]
impl<T: HierarchySource + ?Sized> HierarchySource for std::sync::Arc<T> {
    async fn read(&self, query: &HierarchyQuery) -> Result<Vec<HierarchyRow>> {
        (**self).read(query).await
    }
}

#[async_trait]
impl<T: FactSource + ?Sized> FactSource for std::sync::Arc<T> {
    async fn column_values(&self, column: &str, filters: &[ColumnFilter]) -> Result<Vec<String>> {
        (**self).column_values(column, filters).await
    }
}

/// Runs a backend future under `timeout`, mapping expiry to [`Error::Timeout`].
pub(crate) async fn bounded<T, F>(timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(timeout_ms = millis, "backend request timed out");
            Err(Error::Timeout(millis))
        }
    }
}
