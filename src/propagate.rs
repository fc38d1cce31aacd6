//! Tri-state selection propagation.
//!
//! Checking a node pushes the new state down through its loaded subtree and
//! then re-derives every ancestor from its loaded children. Unloaded
//! children are not considered: they pick up their parent's state when they
//! are fetched. Child rows rejected at load time count as one more child
//! carrying the state they were dropped with.

use crate::error::Result;
use crate::node::{CheckState, NodeId};
use crate::store::NodeStore;

/// Derives a parent's state from its children's states.
///
/// A `Mixed` child counts as both checked and unchecked. No children yields
/// `Unchecked`.
pub fn aggregate(states: impl IntoIterator<Item = CheckState>) -> CheckState {
    let mut checked = false;
    let mut unchecked = false;
    for state in states {
        checked |= state.is_selected();
        unchecked |= state.has_unselected();
        if checked && unchecked {
            return CheckState::Mixed;
        }
    }
    if checked {
        CheckState::Checked
    } else {
        CheckState::Unchecked
    }
}

impl NodeStore {
    /// Sets `state` on `id` and on every loaded descendant.
    pub fn set_subtree(&mut self, id: NodeId, state: CheckState) -> Result<()> {
        self.node(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node_mut(current)?;
            node.state = state;
            if let Some(dropped) = &mut node.dropped {
                dropped.state = state;
            }
            stack.extend_from_slice(node.children.ids());
        }
        Ok(())
    }

    /// Re-derives the state of every ancestor of `id`, nearest first.
    pub fn recompute_ancestors(&mut self, id: NodeId) -> Result<()> {
        let ancestors: Vec<NodeId> = self.ancestors(id).collect();
        for ancestor in ancestors {
            let state = {
                let node = self.node(ancestor)?;
                aggregate(
                    node.children
                        .ids()
                        .iter()
                        .filter_map(|child| self.get(*child).map(|child| child.state))
                        .chain(node.dropped.as_ref().map(|dropped| dropped.state)),
                )
            };
            self.node_mut(ancestor)?.state = state;
        }
        Ok(())
    }

    /// Applies a checkbox change: pushes `state` down, then re-derives ancestors.
    pub fn set_state(&mut self, id: NodeId, state: CheckState) -> Result<()> {
        self.set_subtree(id, state)?;
        self.recompute_ancestors(id)
    }

    /// Flips the checkbox of `id` and returns the state it moved to.
    pub fn toggle(&mut self, id: NodeId) -> Result<CheckState> {
        let next = self.node(id)?.state.toggled();
        self.set_state(id, next)?;
        Ok(next)
    }
}
