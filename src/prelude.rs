pub use crate::{
    CheckState, ColumnFilter, DependentIndex, Error, FactSource, FilterAction, FilterEvent,
    FilterSession, HierarchyColumn, HierarchyNode, HierarchyQuery, HierarchyRow, HierarchySource,
    LevelFilter, NodeId, NodeStore, Result, SelectionToken, SessionConfig, TreeModel, VisibleRow,
};

#[cfg(feature = "render")]
pub use crate::{TreeGlyphs, TreeLineOptions, tree_label_line};
