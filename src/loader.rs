//! Fetching one hierarchy level at a time.

use crate::backend::{HierarchyQuery, HierarchySource, LevelFilter};
use crate::config::HierarchyColumn;
use crate::error::Result;
use crate::index::DependentIndex;
use crate::model::TreeModel;
use crate::node::{HierarchyNode, NodeId};
use crate::row::HierarchyRow;
use crate::store::NodeStore;

/// Which placeholder a level fetch fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelTarget {
    Root,
    Children(NodeId),
}

/// Builds level queries and applies their rows to a [`NodeStore`].
#[derive(Clone, Copy, Debug)]
pub struct LevelLoader<'a> {
    hierarchy: &'a HierarchyColumn,
    index: Option<&'a DependentIndex>,
}

impl<'a> LevelLoader<'a> {
    /// `index` is `None` when the dependent index is disabled or failed to build.
    pub const fn new(hierarchy: &'a HierarchyColumn, index: Option<&'a DependentIndex>) -> Self {
        Self { hierarchy, index }
    }

    /// Row restriction for the children of `node`.
    ///
    /// Uses the reachable children recorded in the dependent index for
    /// `(node.level, node.query_node)`; without entries, all children of
    /// `node.result_node` are requested.
    pub fn child_filter(&self, node: &HierarchyNode) -> LevelFilter {
        self.index
            .and_then(|index| index.candidates(node.level, &node.query_node))
            .map_or_else(
                || LevelFilter::PredNode(node.result_node.clone()),
                |children| LevelFilter::ResultNodeIn(children.to_vec()),
            )
    }

    /// Query for `target`, resolving the node through `store`.
    pub fn query(&self, store: &NodeStore, target: LevelTarget) -> Result<HierarchyQuery> {
        let level = match target {
            LevelTarget::Root => LevelFilter::Root,
            LevelTarget::Children(id) => self.child_filter(store.node(id)?),
        };
        Ok(HierarchyQuery {
            entity: self.hierarchy.entity.clone(),
            filters: self.hierarchy.filters.clone(),
            level,
        })
    }

    /// Installs fetched rows under `target` and returns the ids now in that level.
    ///
    /// Already loaded targets are left unchanged.
    pub fn apply(
        store: &mut NodeStore,
        target: LevelTarget,
        rows: Vec<HierarchyRow>,
    ) -> Result<Vec<NodeId>> {
        let received = rows.len();
        let dropped = match target {
            LevelTarget::Root => store.set_roots(rows),
            LevelTarget::Children(id) => store.attach_children(id, rows)?,
        };
        let ids = match target {
            LevelTarget::Root => store.roots().to_vec(),
            LevelTarget::Children(id) => store.children(id).to_vec(),
        };
        tracing::debug!(fetch = ?target, received, dropped, loaded = ids.len(), "level applied");
        Ok(ids)
    }

    /// Fetches and installs one level. Does nothing if the target is already loaded.
    ///
    /// On failure the store is not modified and the call may be repeated.
    pub async fn load<S: HierarchySource + ?Sized>(
        &self,
        source: &S,
        store: &mut NodeStore,
        target: LevelTarget,
    ) -> Result<Vec<NodeId>> {
        if is_loaded(store, target)? {
            return Ok(Vec::new());
        }
        let query = self.query(store, target)?;
        let rows = source.read(&query).await?;
        Self::apply(store, target, rows)
    }
}

/// Returns `true` if `target` no longer has a placeholder.
pub fn is_loaded(store: &NodeStore, target: LevelTarget) -> Result<bool> {
    match target {
        LevelTarget::Root => Ok(store.roots_loaded()),
        LevelTarget::Children(id) => Ok(store.node(id)?.is_loaded()),
    }
}
