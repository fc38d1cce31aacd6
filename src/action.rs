use crate::error::Error;
use crate::node::{CheckState, NodeId};

/// Events the tree-selection widget forwards into a filter session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterAction {
    /// Expand the node, fetching its children on first use.
    Expand(NodeId),
    /// Collapse the node; loaded children are kept.
    Collapse(NodeId),
    /// Expand if collapsed, collapse if expanded.
    ToggleExpand(NodeId),
    /// Flip the node's checkbox.
    ToggleCheck(NodeId),
    /// Set the node's checkbox to an explicit state.
    SetState(NodeId, CheckState),
    /// Collapse every node.
    CollapseAll,
    /// Fetch the root level again after a failed open.
    RetryRoot,
}

/// Result of handling an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterEvent {
    /// The action was handled and session state was updated.
    Handled,
    /// The action was ignored (e.g., a fetch for the node is already running).
    Unhandled,
    /// The action failed; the session is unchanged and the action may be retried.
    Failed(Error),
}
