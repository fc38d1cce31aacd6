#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::{child_count, split_path};

/// Raw row returned by the hierarchy backend.
///
/// With the `serde` feature the field names follow the backend's upper-case
/// column names (`RESULT_NODE`, `IS_LEAF`, ...).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE", default))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HierarchyRow {
    pub result_node: String,
    pub result_node_name: String,
    pub pred_node: String,
    pub query_node: String,
    pub level: u16,
    /// `1` for leaves, `0` otherwise.
    pub is_leaf: u8,
    pub path: String,
    /// Bracket-group encoding of the node's children, e.g. `[a],[b]`.
    pub children: String,
}

impl HierarchyRow {
    #[inline]
    pub const fn is_leaf(&self) -> bool {
        self.is_leaf == 1
    }

    /// Rows without a node key carry nothing usable.
    pub fn is_blank(&self) -> bool {
        self.result_node.is_empty()
    }

    /// Validates the path and decodes the announced child count.
    pub(crate) fn decode(&self) -> Result<DecodedRow> {
        let tag = |err: Error| err.for_node(&self.result_node);
        split_path(&self.path).map_err(tag)?;
        let expected = if self.is_leaf() {
            0
        } else {
            child_count(&self.children).map_err(tag)?
        };
        Ok(DecodedRow { expected })
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct DecodedRow {
    pub(crate) expected: usize,
}
