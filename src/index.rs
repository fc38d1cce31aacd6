//! Dependent node index.
//!
//! The fact rows visible under the other active filters name a set of
//! hierarchy leaves. Decomposing each leaf's path into `(level, node, child)`
//! steps tells a level fetch which children of a node are reachable from
//! that data, so expanding a node can request only those children.

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::backend::{HierarchyQuery, HierarchySource, LevelFilter};
use crate::config::HierarchyColumn;
use crate::error::{Error, Result};
use crate::path::split_path;
use crate::row::HierarchyRow;

/// One step from an ancestor toward a visible leaf.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DependentIndexEntry {
    pub level: u16,
    pub node: String,
    pub child: String,
}

impl DependentIndexEntry {
    pub fn new(level: u16, node: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            level,
            node: node.into(),
            child: child.into(),
        }
    }
}

/// Decomposes a leaf row's path into index entries.
///
/// The child of step `i` is `nodes[min(i + 1, level)]`, and the node at the
/// row's own level is replaced by `RESULT_NODE`. A path that lists only the
/// ancestors (one segment short) gets the row's own key appended.
pub fn decompose(row: &HierarchyRow) -> Result<SmallVec<[DependentIndexEntry; 8]>> {
    let segments = split_path(&row.path).map_err(|err| err.for_node(&row.result_node))?;
    let leaf_level = usize::from(row.level);
    let mut nodes: SmallVec<[&str; 8]> = segments;
    if nodes.len() == leaf_level {
        nodes.push(row.result_node.as_str());
    }
    if nodes.len() <= leaf_level {
        return Err(Error::malformed(
            &row.result_node,
            format!("path {:?} is shorter than level {}", row.path, row.level),
        ));
    }
    nodes[leaf_level] = row.result_node.as_str();

    let mut entries = SmallVec::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        let child_idx = (i + 1).min(leaf_level);
        let level = u16::try_from(i).map_err(|_| {
            Error::malformed(&row.result_node, format!("path {:?} is too deep", row.path))
        })?;
        entries.push(DependentIndexEntry::new(level, *node, nodes[child_idx]));
    }
    Ok(entries)
}

/// Lookup of reachable children by `(level, node)`.
#[derive(Clone, Debug, Default)]
pub struct DependentIndex {
    entries: Vec<DependentIndexEntry>,
    children: FxHashMap<u16, FxHashMap<String, Vec<String>>>,
}

impl DependentIndex {
    /// Builds the lookup; duplicate children of the same key are collapsed.
    pub fn from_entries(entries: Vec<DependentIndexEntry>) -> Self {
        let mut children: FxHashMap<u16, FxHashMap<String, Vec<String>>> = FxHashMap::default();
        let mut seen: FxHashSet<(u16, &str, &str)> =
            FxHashSet::with_capacity_and_hasher(entries.len(), FxBuildHasher);
        for entry in &entries {
            if seen.insert((entry.level, entry.node.as_str(), entry.child.as_str())) {
                children
                    .entry(entry.level)
                    .or_default()
                    .entry(entry.node.clone())
                    .or_default()
                    .push(entry.child.clone());
            }
        }
        Self { entries, children }
    }

    /// Raw entries in build order (duplicates included).
    pub fn entries(&self) -> &[DependentIndexEntry] {
        &self.entries
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct reachable children of `node` at `level`, if the index knows the node.
    pub fn candidates(&self, level: u16, node: &str) -> Option<&[String]> {
        self.children
            .get(&level)
            .and_then(|nodes| nodes.get(node))
            .map(Vec::as_slice)
            .filter(|children| !children.is_empty())
    }
}

/// Builds a [`DependentIndex`] from the hierarchy backend.
pub struct DependentIndexBuilder<'a, S: ?Sized> {
    source: &'a S,
    hierarchy: &'a HierarchyColumn,
}

impl<'a, S: HierarchySource + ?Sized> DependentIndexBuilder<'a, S> {
    pub const fn new(source: &'a S, hierarchy: &'a HierarchyColumn) -> Self {
        Self { source, hierarchy }
    }

    /// Resolves the leaf rows named by `leaf_values` and indexes their paths.
    ///
    /// Rows whose path cannot be decomposed are skipped.
    pub async fn build(&self, leaf_values: &[String]) -> Result<DependentIndex> {
        let mut seen = FxHashSet::with_capacity_and_hasher(leaf_values.len(), FxBuildHasher);
        let names: Vec<String> = leaf_values
            .iter()
            .filter(|value| !value.is_empty() && seen.insert(value.as_str()))
            .cloned()
            .collect();
        if names.is_empty() {
            return Ok(DependentIndex::default());
        }

        let query = HierarchyQuery {
            entity: self.hierarchy.entity.clone(),
            filters: self.hierarchy.filters.clone(),
            level: LevelFilter::LeafNamesIn(names),
        };
        let rows = self.source.read(&query).await?;

        let mut entries = Vec::with_capacity(rows.len() * 4);
        for row in rows.iter().filter(|row| row.is_leaf()) {
            match decompose(row) {
                Ok(steps) => entries.extend(steps),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping leaf row in dependent index");
                }
            }
        }
        tracing::debug!(
            leaves = rows.len(),
            entries = entries.len(),
            "built dependent index"
        );
        Ok(DependentIndex::from_entries(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockHierarchy, leaf};

    fn triples(entries: &[DependentIndexEntry]) -> Vec<(u16, &str, &str)> {
        entries
            .iter()
            .map(|e| (e.level, e.node.as_str(), e.child.as_str()))
            .collect()
    }

    #[test]
    fn decomposes_slash_path() {
        let entries = decompose(&leaf("C", 2, "A/B/C")).unwrap();
        assert_eq!(
            triples(&entries),
            vec![(0, "A", "B"), (1, "B", "C"), (2, "C", "C")]
        );
    }

    #[test]
    fn bracket_path_yields_same_triples() {
        let slash = decompose(&leaf("C", 2, "A/B/C")).unwrap();
        let bracket = decompose(&leaf("C", 2, "[A]/[B].[C]")).unwrap();
        assert_eq!(slash, bracket);
    }

    #[test]
    fn terminal_step_uses_result_node() {
        let entries = decompose(&leaf("LEAF_KEY", 2, "A/B/leaf-name")).unwrap();
        assert_eq!(
            triples(&entries),
            vec![(0, "A", "B"), (1, "B", "LEAF_KEY"), (2, "LEAF_KEY", "LEAF_KEY")]
        );
    }

    #[test]
    fn ancestor_only_path_gets_leaf_appended() {
        let entries = decompose(&leaf("C", 2, "A/B")).unwrap();
        assert_eq!(
            triples(&entries),
            vec![(0, "A", "B"), (1, "B", "C"), (2, "C", "C")]
        );
    }

    #[test]
    fn root_level_leaf_points_at_itself() {
        let entries = decompose(&leaf("R", 0, "R")).unwrap();
        assert_eq!(triples(&entries), vec![(0, "R", "R")]);
    }

    #[test]
    fn too_short_path_is_malformed() {
        assert!(decompose(&leaf("D", 3, "A")).is_err());
    }

    #[test]
    fn candidates_are_deduplicated() {
        let index = DependentIndex::from_entries(vec![
            DependentIndexEntry::new(0, "A", "B"),
            DependentIndexEntry::new(0, "A", "B"),
            DependentIndexEntry::new(0, "A", "C"),
            DependentIndexEntry::new(1, "B", "D"),
        ]);
        assert_eq!(index.candidates(0, "A").unwrap(), ["B", "C"]);
        assert_eq!(index.candidates(1, "B").unwrap(), ["D"]);
        assert!(index.candidates(1, "A").is_none());
        assert_eq!(index.entries().len(), 4);
    }

    #[tokio::test]
    async fn build_queries_leaf_names_once() {
        let source = MockHierarchy::new()
            .with_leaves(vec![leaf("B1", 2, "A/B/B1"), leaf("C1", 2, "A/C/C1")]);
        let hierarchy = HierarchyColumn::new("COST_CENTER", "/Hierarchy");
        let values = vec!["B1".to_string(), "C1".to_string(), "B1".to_string()];

        let index = DependentIndexBuilder::new(&source, &hierarchy)
            .build(&values)
            .await
            .unwrap();

        assert_eq!(index.candidates(0, "A").unwrap(), ["B", "C"]);
        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(
            queries[0].level,
            LevelFilter::LeafNamesIn(vec!["B1".to_string(), "C1".to_string()])
        );
    }

    #[tokio::test]
    async fn build_without_values_skips_backend() {
        let source = MockHierarchy::new();
        let hierarchy = HierarchyColumn::new("COST_CENTER", "/Hierarchy");

        let index = DependentIndexBuilder::new(&source, &hierarchy)
            .build(&[])
            .await
            .unwrap();

        assert!(index.is_empty());
        assert!(source.queries().is_empty());
    }
}
