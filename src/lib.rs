//! Hierarchical filter selection for tabular data.
//!
//! A hierarchy-typed column is filtered through a lazily loaded tree: levels
//! are fetched on expand, checkboxes follow a tri-state model, and on
//! confirmation the selection is resolved into leaf-level filter tokens,
//! including leaves of subtrees that were never expanded.
//!
//! A dependent index, built once per session from the fact rows visible
//! under the other active filters, narrows each level fetch to the children
//! that can actually appear in the filtered data.
//!
//! Feature flags:
//! - `render`: ratatui label lines (`tree_label_line`, `TreeGlyphs`) for visible rows.
//! - `serde`: serde support for rows, queries, tokens, index entries and config.

mod action;
mod backend;
mod config;
mod error;
#[cfg(feature = "render")]
mod glyphs;
mod index;
mod loader;
mod model;
mod node;
mod path;
pub mod prelude;
mod propagate;
mod resolve;
mod row;
mod session;
mod store;
#[cfg(test)]
mod testing;

pub use action::{FilterAction, FilterEvent};
pub use backend::{ColumnFilter, FactSource, HierarchyQuery, HierarchySource, LevelFilter};
pub use config::{HierarchyColumn, SessionConfig};
pub use error::{Error, Result};
#[cfg(feature = "render")]
pub use glyphs::{TreeGlyphs, TreeLineOptions, tree_label_line};
pub use index::{DependentIndex, DependentIndexBuilder, DependentIndexEntry, decompose};
pub use loader::{LevelLoader, LevelTarget};
pub use model::TreeModel;
pub use node::{CheckState, ChildSlots, DroppedChildren, HierarchyNode, NodeId};
pub use path::{PathEncoding, PathNodes, child_count, path_is_under, split_path};
pub use propagate::aggregate;
pub use resolve::{CollectedSelection, SelectionResolver, SelectionToken, collect};
pub use row::HierarchyRow;
pub use session::{FilterSession, LevelRequest, SelectionSummary, VisibleRow};
pub use store::NodeStore;
