use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::model::TreeModel;
use crate::node::{CheckState, ChildSlots, DroppedChildren, HierarchyNode, NodeId};
use crate::row::HierarchyRow;

/// Arena holding the currently materialized hierarchy of one dialog session.
///
/// Nodes are never removed; a new store is created for every dialog open.
#[derive(Clone, Debug, Default)]
pub struct NodeStore {
    nodes: Vec<HierarchyNode>,
    roots: Vec<NodeId>,
    roots_loaded: bool,
}

impl NodeStore {
    /// Creates an empty store with no root level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with preallocated capacity for the given number of nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            roots: Vec::new(),
            roots_loaded: false,
        }
    }

    /// Number of materialized nodes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` once the root level has been fetched.
    #[inline]
    pub const fn roots_loaded(&self) -> bool {
        self.roots_loaded
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&HierarchyNode> {
        self.nodes.get(id.index())
    }

    /// Returns the node or [`Error::UnknownNode`].
    pub fn node(&self, id: NodeId) -> Result<&HierarchyNode> {
        self.get(id).ok_or(Error::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut HierarchyNode> {
        self.nodes.get_mut(id.index()).ok_or(Error::UnknownNode(id))
    }

    /// Iterates all nodes with their ids, in materialization order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &HierarchyNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (Self::id_at(idx), node))
    }

    /// Finds the first materialized node with the given backend key.
    pub fn find(&self, result_node: &str) -> Option<NodeId> {
        self.iter()
            .find(|(_, node)| node.result_node == result_node)
            .map(|(id, _)| id)
    }

    /// Installs the root level. Calling it again once roots are loaded is a no-op.
    ///
    /// Returns the number of rows dropped as blank or malformed.
    pub fn set_roots(&mut self, rows: Vec<HierarchyRow>) -> usize {
        if self.roots_loaded {
            return 0;
        }
        let total = rows.len();
        for row in rows {
            if let Materialized::Node(id) = self.materialize(row, None, CheckState::Unchecked) {
                self.roots.push(id);
            }
        }
        self.roots_loaded = true;
        total - self.roots.len()
    }

    /// Replaces the placeholder of `parent` with nodes built from `rows`.
    ///
    /// New children inherit the parent's current state. Malformed rows are
    /// recorded on the parent (see [`HierarchyNode::dropped_children`]) so a
    /// selection still covers them. Calling this on an already loaded node
    /// leaves it untouched. Returns the number of rows dropped as blank or
    /// malformed.
    pub fn attach_children(&mut self, parent: NodeId, rows: Vec<HierarchyRow>) -> Result<usize> {
        let node = self.node(parent)?;
        if node.is_loaded() {
            return Ok(0);
        }
        let inherited = node.state;
        let total = rows.len();
        let mut ids = SmallVec::<[NodeId; 8]>::with_capacity(total);
        let mut rejected = Vec::new();
        for row in rows {
            match self.materialize(row, Some(parent), inherited) {
                Materialized::Node(id) => ids.push(id),
                Materialized::Rejected(path) => rejected.push(path),
                Materialized::Blank => {}
            }
        }
        let dropped = total - ids.len();
        let node = self.node_mut(parent)?;
        node.children = ChildSlots::Loaded(ids);
        if !rejected.is_empty() {
            node.dropped = Some(DroppedChildren {
                paths: rejected,
                state: inherited,
            });
        }
        Ok(dropped)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get(id).and_then(HierarchyNode::parent), |current| {
            self.get(*current).and_then(HierarchyNode::parent)
        })
    }

    /// Pre-order walk of the loaded subtree rooted at `id` (including `id`).
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.ids().iter().rev().copied());
        }
        out
    }

    fn materialize(
        &mut self,
        row: HierarchyRow,
        parent: Option<NodeId>,
        state: CheckState,
    ) -> Materialized {
        if row.is_blank() {
            tracing::warn!(parent_id = ?parent, "dropping blank hierarchy row");
            return Materialized::Blank;
        }
        let decoded = match row.decode() {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(parent_id = ?parent, error = %err, "dropping malformed hierarchy row");
                return Materialized::Rejected(row.path);
            }
        };
        let children = if row.is_leaf() {
            ChildSlots::Loaded(SmallVec::new())
        } else {
            ChildSlots::Pending {
                expected: decoded.expected,
            }
        };
        let id = Self::id_at(self.nodes.len());
        self.nodes.push(HierarchyNode {
            is_leaf: row.is_leaf(),
            result_node: row.result_node,
            result_node_name: row.result_node_name,
            pred_node: row.pred_node,
            query_node: row.query_node,
            level: row.level,
            path: row.path,
            state,
            parent,
            children,
            dropped: None,
        });
        Materialized::Node(id)
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    const fn id_at(index: usize) -> NodeId {
        NodeId::new(index as u32)
    }
}

enum Materialized {
    Node(NodeId),
    Blank,
    /// Malformed row, with its raw path.
    Rejected(String),
}

impl TreeModel for NodeStore {
    type Id = NodeId;

    fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |node| node.children.ids())
    }

    fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    fn has_pending_children(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|node| !node.is_loaded())
    }

    fn size_hint(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{internal, leaf};

    #[test]
    fn root_rows_become_collapsed_unloaded_nodes() {
        let mut store = NodeStore::new();
        let dropped = store.set_roots(vec![internal("N1", 0, "N1", "[a],[b]")]);

        assert_eq!(dropped, 0);
        assert_eq!(store.roots().len(), 1);
        let n1 = store.node(store.roots()[0]).unwrap();
        assert_eq!(n1.state, CheckState::Unchecked);
        assert!(n1.is_collapsed_unloaded());
        assert_eq!(n1.children(), &ChildSlots::Pending { expected: 2 });
        assert!(store.has_pending_children(store.roots()[0]));
    }

    #[test]
    fn children_inherit_parent_state() {
        let mut store = NodeStore::new();
        store.set_roots(vec![internal("N1", 0, "N1", "[a],[b]")]);
        let n1 = store.roots()[0];
        store.node_mut(n1).unwrap().state = CheckState::Checked;

        store
            .attach_children(n1, vec![leaf("C1", 1, "N1/C1"), leaf("C2", 1, "N1/C2")])
            .unwrap();

        let states: Vec<_> = store
            .children(n1)
            .iter()
            .map(|id| store.node(*id).unwrap().state)
            .collect();
        assert_eq!(states, vec![CheckState::Checked, CheckState::Checked]);
        assert_eq!(store.node(store.children(n1)[0]).unwrap().parent(), Some(n1));
    }

    #[test]
    fn attaching_twice_is_a_no_op() {
        let mut store = NodeStore::new();
        store.set_roots(vec![internal("N1", 0, "N1", "[a]")]);
        let n1 = store.roots()[0];
        store.attach_children(n1, vec![leaf("C1", 1, "N1/C1")]).unwrap();
        let before = store.children(n1).to_vec();

        store.attach_children(n1, vec![leaf("C9", 1, "N1/C9")]).unwrap();

        assert_eq!(store.children(n1), before.as_slice());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn blank_and_malformed_rows_are_dropped() {
        let mut store = NodeStore::new();
        store.set_roots(vec![internal("N1", 0, "N1", "[a],[b],[c]")]);
        let n1 = store.roots()[0];

        let dropped = store
            .attach_children(
                n1,
                vec![
                    leaf("C1", 1, "N1/C1"),
                    HierarchyRow::default(),
                    internal("C3", 1, "[N1]/[C3", "[x]"),
                    internal("C4", 1, "N1/C4", "[x"),
                ],
            )
            .unwrap();

        assert_eq!(dropped, 3);
        assert_eq!(store.children(n1).len(), 1);
        let node = store.node(n1).unwrap();
        assert!(node.is_loaded());
        assert_eq!(
            node.dropped_children(),
            Some(&DroppedChildren {
                paths: vec!["[N1]/[C3".to_string(), "N1/C4".to_string()],
                state: CheckState::Unchecked,
            })
        );
    }

    #[test]
    fn ancestors_walk_to_root() {
        let mut store = NodeStore::new();
        store.set_roots(vec![internal("A", 0, "A", "[b]")]);
        let a = store.roots()[0];
        store.attach_children(a, vec![internal("B", 1, "A/B", "[c]")]).unwrap();
        let b = store.children(a)[0];
        store.attach_children(b, vec![leaf("C", 2, "A/B/C")]).unwrap();
        let c = store.children(b)[0];

        assert_eq!(store.ancestors(c).collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(store.subtree(a), vec![a, b, c]);
        assert_eq!(store.find("B"), Some(b));
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut store = NodeStore::new();
        let missing = NodeId::new(7);
        assert_eq!(store.node(missing).unwrap_err(), Error::UnknownNode(missing));
        assert!(store.attach_children(missing, Vec::new()).is_err());
        assert!(!store.contains(missing));
    }
}
