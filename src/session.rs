//! One hierarchy filter dialog: tree, index, expansion and pending fetches.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::action::{FilterAction, FilterEvent};
use crate::backend::{ColumnFilter, FactSource, HierarchyQuery, HierarchySource, bounded};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::index::{DependentIndex, DependentIndexBuilder};
use crate::loader::{LevelLoader, LevelTarget, is_loaded};
use crate::model::TreeModel;
use crate::node::{CheckState, NodeId};
use crate::resolve::{SelectionResolver, SelectionToken};
use crate::row::HierarchyRow;
use crate::store::NodeStore;

/// A level fetch that has been started but not yet applied.
///
/// Obtained from [`FilterSession::begin_expand`] or
/// [`FilterSession::begin_root`]; hand it back to
/// [`FilterSession::complete`] together with the fetch result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelRequest {
    target: LevelTarget,
    generation: u64,
    query: HierarchyQuery,
}

impl LevelRequest {
    pub const fn target(&self) -> LevelTarget {
        self.target
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn query(&self) -> &HierarchyQuery {
        &self.query
    }
}

/// A visible row with metadata used for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibleRow {
    pub id: NodeId,
    pub level: u16,
    pub parent: Option<NodeId>,
    /// The node is internal (its children may still be unloaded).
    pub has_children: bool,
    pub is_expanded: bool,
    /// A fetch for the node's children is in flight.
    pub is_loading: bool,
    /// For each ancestor level, whether that ancestor is the last sibling.
    pub is_tail_stack: SmallVec<[bool; 8]>,
}

/// Node counts per checkbox state over the materialized tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionSummary {
    pub checked: usize,
    pub mixed: usize,
    pub unchecked: usize,
}

/// State of one open hierarchy filter dialog.
pub struct FilterSession<S> {
    source: S,
    config: SessionConfig,
    store: NodeStore,
    index: Option<DependentIndex>,
    index_error: Option<Error>,
    expanded: FxHashSet<NodeId>,
    in_flight: FxHashSet<LevelTarget>,
    // Bumped on open/close; fetches started under an older value are discarded.
    generation: u64,
}

impl<S: HierarchySource> FilterSession<S> {
    pub fn new(source: S, config: SessionConfig) -> Self {
        Self {
            source,
            config,
            store: NodeStore::new(),
            index: None,
            index_error: None,
            expanded: FxHashSet::default(),
            in_flight: FxHashSet::default(),
            generation: 0,
        }
    }

    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub const fn store(&self) -> &NodeStore {
        &self.store
    }

    /// The dependent index, if it was built for the current session.
    pub const fn index(&self) -> Option<&DependentIndex> {
        self.index.as_ref()
    }

    /// Why the dependent index is missing, if building it failed.
    pub const fn index_error(&self) -> Option<&Error> {
        self.index_error.as_ref()
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a fresh session: builds the dependent index, then loads the root level.
    ///
    /// `other_filters` are the active filters on every column except the
    /// hierarchy column. An index failure is recorded and level fetches fall
    /// back to parent filters; a root failure is returned and can be retried
    /// with [`FilterAction::RetryRoot`].
    pub async fn open<F>(&mut self, facts: &F, other_filters: &[ColumnFilter]) -> Result<()>
    where
        F: FactSource + ?Sized,
    {
        self.reset();
        tracing::debug!(
            generation = self.generation,
            column = %self.config.hierarchy.column,
            "opening hierarchy filter"
        );
        if self.config.use_dependent_index {
            match self.build_index(facts, other_filters).await {
                Ok(index) => self.index = Some(index),
                Err(err) => {
                    tracing::warn!(error = %err, "dependent index unavailable, fetching whole levels");
                    self.index_error = Some(Error::IndexBuild(Box::new(err)));
                }
            }
        }
        self.load_root().await.map(|_| ())
    }

    /// Discards the tree. Fetches still in flight will be rejected on completion.
    pub fn close(&mut self) {
        self.reset();
        tracing::debug!(generation = self.generation, "hierarchy filter closed");
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.store = NodeStore::new();
        self.index = None;
        self.index_error = None;
        self.expanded.clear();
        self.in_flight.clear();
    }

    async fn build_index<F>(&self, facts: &F, other_filters: &[ColumnFilter]) -> Result<DependentIndex>
    where
        F: FactSource + ?Sized,
    {
        let timeout = self.config.request_timeout;
        let hierarchy = &self.config.hierarchy;
        let values = bounded(timeout, facts.column_values(&hierarchy.column, other_filters)).await?;
        bounded(
            timeout,
            DependentIndexBuilder::new(&self.source, hierarchy).build(&values),
        )
        .await
    }

    /// Starts the root-level fetch. `None` if roots are loaded or already being fetched.
    pub fn begin_root(&mut self) -> Result<Option<LevelRequest>> {
        self.begin(LevelTarget::Root)
    }

    /// Starts fetching the children of `id`.
    ///
    /// Returns `None` if the children are already loaded or a fetch for the
    /// same node is in flight.
    pub fn begin_expand(&mut self, id: NodeId) -> Result<Option<LevelRequest>> {
        self.begin(LevelTarget::Children(id))
    }

    fn begin(&mut self, target: LevelTarget) -> Result<Option<LevelRequest>> {
        if is_loaded(&self.store, target)? {
            return Ok(None);
        }
        let query = LevelLoader::new(&self.config.hierarchy, self.index.as_ref())
            .query(&self.store, target)?;
        if !self.in_flight.insert(target) {
            tracing::debug!(fetch = ?target, "level fetch already in flight");
            return Ok(None);
        }
        Ok(Some(LevelRequest {
            target,
            generation: self.generation,
            query,
        }))
    }

    /// Runs the backend read for `request` under the configured timeout.
    pub async fn fetch(&self, request: &LevelRequest) -> Result<Vec<HierarchyRow>> {
        bounded(self.config.request_timeout, self.source.read(&request.query)).await
    }

    /// Applies a finished fetch. On failure the target stays unloaded and can be retried.
    pub fn complete(
        &mut self,
        request: LevelRequest,
        fetched: Result<Vec<HierarchyRow>>,
    ) -> Result<Vec<NodeId>> {
        if request.generation != self.generation {
            tracing::warn!(
                fetch = ?request.target,
                found = request.generation,
                expected = self.generation,
                "discarding level fetch from a closed session"
            );
            return Err(Error::StaleSession {
                expected: self.generation,
                found: request.generation,
            });
        }
        self.in_flight.remove(&request.target);
        let rows = fetched.inspect_err(|err| {
            tracing::warn!(fetch = ?request.target, error = %err, "level fetch failed");
        })?;
        let ids = LevelLoader::apply(&mut self.store, request.target, rows)?;
        if let LevelTarget::Children(id) = request.target {
            self.expanded.insert(id);
        }
        Ok(ids)
    }

    async fn run(&mut self, target: LevelTarget) -> Result<bool> {
        let Some(request) = self.begin(target)? else {
            return Ok(false);
        };
        let fetched = self.fetch(&request).await;
        self.complete(request, fetched)?;
        Ok(true)
    }

    /// Loads the root level if it is missing. Returns `false` if nothing was fetched.
    pub async fn load_root(&mut self) -> Result<bool> {
        self.run(LevelTarget::Root).await
    }

    /// Expands `id`, fetching its children on first use.
    ///
    /// Returns `false` if a fetch for the node is already running.
    pub async fn expand(&mut self, id: NodeId) -> Result<bool> {
        if self.store.node(id)?.is_loaded() {
            self.expanded.insert(id);
            return Ok(true);
        }
        self.run(LevelTarget::Children(id)).await
    }

    /// Collapses `id`. Returns `false` if it was not expanded.
    pub fn collapse(&mut self, id: NodeId) -> Result<bool> {
        self.store.node(id)?;
        Ok(self.expanded.remove(&id))
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn is_loading(&self, id: NodeId) -> bool {
        self.in_flight.contains(&LevelTarget::Children(id))
    }

    /// Checkbox toggle from the widget; returns the node's new state.
    pub fn toggle(&mut self, id: NodeId) -> Result<CheckState> {
        self.store.toggle(id)
    }

    pub fn set_state(&mut self, id: NodeId, state: CheckState) -> Result<()> {
        self.store.set_state(id, state)
    }

    /// Handles a widget action and returns the resulting event.
    pub async fn handle_action(&mut self, action: FilterAction) -> FilterEvent {
        let result = match action {
            FilterAction::Expand(id) => self.expand(id).await,
            FilterAction::Collapse(id) => self.collapse(id),
            FilterAction::ToggleExpand(id) => {
                if self.is_expanded(id) {
                    self.collapse(id)
                } else {
                    self.expand(id).await
                }
            }
            FilterAction::ToggleCheck(id) => self.toggle(id).map(|_| true),
            FilterAction::SetState(id, state) => self.set_state(id, state).map(|()| true),
            FilterAction::CollapseAll => {
                self.expanded.clear();
                Ok(true)
            }
            FilterAction::RetryRoot => self.load_root().await,
        };
        match result {
            Ok(true) => FilterEvent::Handled,
            Ok(false) => FilterEvent::Unhandled,
            Err(err) => FilterEvent::Failed(err),
        }
    }

    /// Resolves the current selection into leaf tokens.
    ///
    /// Unloaded selected subtrees are resolved with one backend query; if it
    /// fails, no partial token list is returned.
    pub async fn confirm(&self) -> Result<Vec<SelectionToken>> {
        let resolver = SelectionResolver::new(&self.source, &self.config.hierarchy);
        bounded(self.config.request_timeout, resolver.resolve(&self.store)).await
    }

    pub fn summary(&self) -> SelectionSummary {
        let mut summary = SelectionSummary::default();
        for (_, node) in self.store.iter() {
            match node.state {
                CheckState::Checked => summary.checked += 1,
                CheckState::Mixed => summary.mixed += 1,
                CheckState::Unchecked => summary.unchecked += 1,
            }
        }
        summary
    }

    /// Rows to render: roots plus the loaded children of expanded nodes, in DFS order.
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        let mut rows = Vec::with_capacity(self.store.size_hint().min(1024));
        let roots = self.store.roots();
        let mut is_tail_stack: SmallVec<[bool; 8]> = SmallVec::new();
        for root in roots.iter().copied() {
            self.build_visible_rows(root, 0, None, &mut is_tail_stack, &mut rows);
        }
        rows
    }

    fn build_visible_rows(
        &self,
        id: NodeId,
        level: u16,
        parent: Option<NodeId>,
        is_tail_stack: &mut SmallVec<[bool; 8]>,
        rows: &mut Vec<VisibleRow>,
    ) {
        let Some(node) = self.store.get(id) else {
            return;
        };
        let is_expanded = !node.is_leaf && node.is_loaded() && self.expanded.contains(&id);
        rows.push(VisibleRow {
            id,
            level,
            parent,
            has_children: !node.is_leaf,
            is_expanded,
            is_loading: self.is_loading(id),
            is_tail_stack: is_tail_stack.clone(),
        });
        if !is_expanded {
            return;
        }

        let children = node.children().ids();
        let last = children.len().saturating_sub(1);
        for (i, child) in children.iter().copied().enumerate() {
            is_tail_stack.push(i == last);
            self.build_visible_rows(child, level + 1, Some(id), is_tail_stack, rows);
            is_tail_stack.pop();
        }
    }

    /// Node ids currently expanded, for restoring a view.
    pub fn expanded(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.expanded.iter().copied()
    }
}
