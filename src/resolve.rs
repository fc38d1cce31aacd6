//! Turning a tri-state selection into leaf-level filter tokens.
//!
//! Selected leaves that are materialized produce tokens directly. A
//! selected internal node whose children were never fetched is batched by
//! path, and all such subtrees are resolved with a single leaf query.

use rustc_hash::{FxBuildHasher, FxHashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::backend::{HierarchyQuery, HierarchySource, LevelFilter};
use crate::config::HierarchyColumn;
use crate::error::Result;
use crate::model::TreeModel;
use crate::node::CheckState;
use crate::store::NodeStore;

/// One confirmed leaf, handed to the filter bar.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SelectionToken {
    pub text: String,
    pub path: String,
}

/// Result of walking the store without touching the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectedSelection {
    /// Tokens for selected leaves present in the store.
    pub tokens: Vec<SelectionToken>,
    /// Paths of selected internal nodes whose children are not loaded, or
    /// whose loaded level lost rows to malformed data.
    pub missing_paths: Vec<String>,
}

/// Depth-first walk collecting selected leaves and unresolved subtrees.
pub fn collect(store: &NodeStore) -> CollectedSelection {
    let mut out = CollectedSelection::default();
    let mut stack: Vec<_> = store.roots().iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        let Some(node) = store.get(id) else {
            continue;
        };
        if node.state == CheckState::Unchecked {
            continue;
        }
        if node.is_leaf {
            out.tokens.push(SelectionToken {
                text: node.result_node_name.clone(),
                path: node.path.clone(),
            });
        } else if node.is_loaded() {
            match node.dropped_children() {
                // Fully selected: one batch path covers the rejected rows as well.
                Some(dropped) if node.state == CheckState::Checked && dropped.state.is_selected() => {
                    out.missing_paths.push(node.path.clone());
                    continue;
                }
                Some(dropped) if dropped.state.is_selected() => {
                    out.missing_paths.extend(dropped.paths.iter().cloned());
                }
                _ => {}
            }
            stack.extend(node.children().ids().iter().rev().copied());
        } else {
            out.missing_paths.push(node.path.clone());
        }
    }
    out
}

/// Resolves a selection to tokens, querying leaves of unloaded subtrees.
pub struct SelectionResolver<'a, S: ?Sized> {
    source: &'a S,
    hierarchy: &'a HierarchyColumn,
}

impl<'a, S: HierarchySource + ?Sized> SelectionResolver<'a, S> {
    pub const fn new(source: &'a S, hierarchy: &'a HierarchyColumn) -> Self {
        Self { source, hierarchy }
    }

    /// Returns every selected leaf. Fails as a whole if the batch query fails.
    pub async fn resolve(&self, store: &NodeStore) -> Result<Vec<SelectionToken>> {
        let CollectedSelection {
            mut tokens,
            missing_paths,
        } = collect(store);
        let direct = tokens.len();

        if !missing_paths.is_empty() {
            let batched = missing_paths.len();
            let query = HierarchyQuery {
                entity: self.hierarchy.entity.clone(),
                filters: self.hierarchy.filters.clone(),
                level: LevelFilter::LeavesUnder(missing_paths),
            };
            let rows = self.source.read(&query).await?;
            tracing::debug!(batched, leaves = rows.len(), "resolved unloaded subtrees");
            tokens.extend(rows.into_iter().filter(|row| row.is_leaf()).map(|row| {
                SelectionToken {
                    text: row.result_node_name,
                    path: row.path,
                }
            }));
        }

        let mut seen = FxHashSet::with_capacity_and_hasher(tokens.len(), FxBuildHasher);
        tokens.retain(|token| seen.insert(token.clone()));
        tracing::info!(direct, total = tokens.len(), "selection resolved");
        Ok(tokens)
    }
}
