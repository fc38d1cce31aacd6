use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable handle of a node inside a [`NodeStore`](crate::NodeStore).
///
/// Handles are arena indices; they stay valid until the owning store is dropped.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Tri-state checkbox value of a node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CheckState {
    #[default]
    Unchecked,
    Checked,
    /// Some, but not all, loaded descendants are checked.
    Mixed,
}

impl CheckState {
    /// State a checkbox moves to when the user clicks it.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Checked => Self::Unchecked,
            Self::Unchecked | Self::Mixed => Self::Checked,
        }
    }

    /// Counts toward the "checked" tally of a parent (Checked or Mixed).
    #[inline]
    pub const fn is_selected(self) -> bool {
        matches!(self, Self::Checked | Self::Mixed)
    }

    /// Counts toward the "unchecked" tally of a parent (Unchecked or Mixed).
    #[inline]
    pub const fn has_unselected(self) -> bool {
        matches!(self, Self::Unchecked | Self::Mixed)
    }
}

/// Children of a node: either a not-yet-fetched placeholder or the loaded ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChildSlots {
    /// Children exist on the backend but were never fetched.
    Pending {
        /// Child count decoded from the row's `CHILDREN` field.
        expected: usize,
    },
    Loaded(SmallVec<[NodeId; 8]>),
}

impl ChildSlots {
    #[inline]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Loaded children, or an empty slice for a placeholder.
    pub fn ids(&self) -> &[NodeId] {
        match self {
            Self::Loaded(ids) => ids,
            Self::Pending { .. } => &[],
        }
    }
}

/// One materialized hierarchy node.
#[derive(Clone, Debug)]
pub struct HierarchyNode {
    pub result_node: String,
    pub result_node_name: String,
    /// Parent key as reported by the backend row.
    pub pred_node: String,
    /// Key used as the parent filter when this node's own children are fetched.
    pub query_node: String,
    pub level: u16,
    pub is_leaf: bool,
    pub path: String,
    pub state: CheckState,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: ChildSlots,
    /// Children rows rejected at load time; they keep selection state as one group.
    pub(crate) dropped: Option<DroppedChildren>,
}

/// Child rows of a loaded node that could not be materialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedChildren {
    /// Raw `PATH` of every rejected non-blank row.
    pub paths: Vec<String>,
    /// Selection state the rejected rows carry; follows subtree changes of the parent.
    pub state: CheckState,
}

impl HierarchyNode {
    /// Tree parent, `None` for root-level nodes.
    #[inline]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub const fn children(&self) -> &ChildSlots {
        &self.children
    }

    /// Returns `true` once the level fetch for this node has completed.
    #[inline]
    pub const fn is_loaded(&self) -> bool {
        self.children.is_loaded()
    }

    /// Rejected child rows, if the level fetch dropped any.
    #[inline]
    pub const fn dropped_children(&self) -> Option<&DroppedChildren> {
        self.dropped.as_ref()
    }

    /// Children are known to exist but have not been fetched yet.
    pub const fn is_collapsed_unloaded(&self) -> bool {
        matches!(self.children, ChildSlots::Pending { expected } if expected > 0)
    }
}
