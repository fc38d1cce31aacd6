use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::backend::ColumnFilter;

/// Metadata of the hierarchy-typed column being filtered.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HierarchyColumn {
    /// Fact-table column holding hierarchy leaf names.
    pub column: String,
    /// Backend entity that serves the hierarchy rows.
    pub entity: String,
    /// Filters attached to every hierarchy read (e.g. hierarchy id, validity date).
    pub filters: Vec<ColumnFilter>,
}

impl HierarchyColumn {
    pub fn new(column: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            entity: entity.into(),
            filters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ColumnFilter) -> Self {
        self.filters.push(filter);
        self
    }
}

/// Settings of one filter dialog session.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub hierarchy: HierarchyColumn,
    /// Upper bound for every backend request issued by the session.
    pub request_timeout: Duration,
    /// Build the dependent index on open (disable to always fetch whole levels).
    pub use_dependent_index: bool,
}

impl SessionConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub const fn new(hierarchy: HierarchyColumn) -> Self {
        Self {
            hierarchy,
            request_timeout: Self::DEFAULT_TIMEOUT,
            use_dependent_index: true,
        }
    }

    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn use_dependent_index(mut self, enabled: bool) -> Self {
        self.use_dependent_index = enabled;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(HierarchyColumn::default())
    }
}
