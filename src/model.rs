use std::hash::Hash;

/// Minimal read-only tree contract used by traversals and tree views.
///
/// A proper forest is expected (not a DAG):
/// - no cycles (DFS traversal is used directly);
/// - each node has at most one parent;
/// - identifiers are stable for the lifetime of the model.
pub trait TreeModel {
    /// Node identifier type.
    type Id: Copy + Eq + Hash;

    /// Returns the root-level nodes in a deterministic order.
    fn roots(&self) -> &[Self::Id];
    /// Returns the node's loaded children in a deterministic order.
    fn children(&self, id: Self::Id) -> &[Self::Id];
    /// Returns `true` if the node exists in the model.
    fn contains(&self, id: Self::Id) -> bool;
    /// Returns `true` if the node may have children that are not loaded yet.
    fn has_pending_children(&self, _id: Self::Id) -> bool {
        false
    }
    /// Returns an approximate size hint (not required to be exact).
    fn size_hint(&self) -> usize {
        0
    }
}
