// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The treemap facade: configuration, asynchronous and blocking computation, and results.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use voronoi_cells::{CellSolver, Polygon, PowerDiagram};

use crate::completion::Outcome;
use crate::driver::SubdivisionStats;
use crate::error::{Result, TreemapError};
use crate::listener::TreemapListener;
use crate::scheduler::{Context, SharedListener, SharedSolver, spawn_workers};
use crate::settings::Settings;
use crate::tree::{Node, Tree, TreeBuilder};
use crate::types::NodeId;

/// A weighted tree plus everything needed to lay it out.
///
/// Each [`compute`](Self::compute) builds a fresh context, so one treemap can run several
/// independent computations, concurrently or one after another.
pub struct VoronoiTreemap {
    tree: Arc<Tree>,
    settings: Settings,
    bounds: Option<Polygon>,
    solver: SharedSolver,
    listeners: Vec<SharedListener>,
}

impl core::fmt::Debug for VoronoiTreemap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VoronoiTreemap")
            .field("tree", &self.tree)
            .field("settings", &self.settings)
            .field("bounds", &self.bounds)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl VoronoiTreemap {
    /// Wrap a built tree, with default settings and the [`PowerDiagram`] solver.
    ///
    /// Uniform weights, the random seed and the seed table are tree-building inputs; use
    /// [`VoronoiTreemap::build`] to apply them from [`Settings`].
    pub fn new(tree: impl Into<Arc<Tree>>) -> Self {
        Self {
            tree: tree.into(),
            settings: Settings::default(),
            bounds: None,
            solver: Arc::new(PowerDiagram::new()),
            listeners: Vec::new(),
        }
    }

    /// Build the tree with `settings` applied, then wrap it.
    pub fn build(builder: TreeBuilder, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let tree = builder.settings(&settings).build()?;
        let mut treemap = Self::new(tree);
        treemap.settings = settings.normalized();
        Ok(treemap)
    }

    /// Replace the settings. Counts are coerced into range.
    ///
    /// The tree is already built, so uniform weights, the random seed and the seed table
    /// are ignored here; a warning is logged when any of them is set.
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        if settings.has_tree_inputs() {
            tracing::warn!(
                uniform_weights = settings.uniform_weights,
                random_seed = settings.random_seed,
                seed_table = settings.seed_table.is_some(),
                "tree-building settings have no effect on a built tree; use VoronoiTreemap::build"
            );
        }
        self.settings = settings.normalized();
        self
    }

    /// Set the bounding polygon.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Polygon) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Set a rectangular bounding polygon.
    #[must_use]
    pub fn with_rect(self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.with_bounds(Polygon::from_xywh(x, y, width, height))
    }

    /// Replace the cell solver.
    #[must_use]
    pub fn with_solver(mut self, solver: impl CellSolver + Send + Sync + 'static) -> Self {
        self.solver = Arc::new(solver);
        self
    }

    /// Register a listener for every later computation.
    pub fn add_listener(&mut self, listener: impl TreemapListener + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    /// Register a shared listener, keeping a handle for the caller.
    pub fn add_shared_listener(&mut self, listener: Arc<dyn TreemapListener>) {
        self.listeners.push(listener);
    }

    /// The tree.
    pub fn tree(&self) -> &Arc<Tree> {
        &self.tree
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The bounding polygon, if set.
    pub fn bounds(&self) -> Option<&Polygon> {
        self.bounds.as_ref()
    }

    /// Start a computation on worker threads and return immediately.
    ///
    /// Fails without starting anything when no bounds are set or the settings are invalid.
    pub fn compute(&self) -> Result<ComputeHandle> {
        let bounds = self.bounds.clone().ok_or(TreemapError::MissingBounds)?;
        self.settings.validate()?;

        let span = tracing::info_span!(
            "compute",
            nodes = self.tree.len(),
            workers = self.settings.worker_count
        );
        let _entered = span.enter();

        let ctx = Arc::new(Context::new(
            Arc::clone(&self.tree),
            self.settings.clone(),
            Arc::clone(&self.solver),
            self.listeners.clone(),
        ));
        let workers = if ctx.seed_root(bounds) {
            spawn_workers(&ctx, self.settings.worker_count)?
        } else {
            tracing::debug!("root needs no subdivision");
            Vec::new()
        };
        Ok(ComputeHandle { ctx, workers })
    }

    /// Compute and block until the layout is complete.
    pub fn compute_blocking(&self) -> Result<Layout> {
        self.compute()?.wait()
    }
}

/// A running computation.
///
/// Dropping the handle detaches the workers; they still run to completion.
#[derive(Debug)]
pub struct ComputeHandle {
    ctx: Arc<Context>,
    workers: Vec<JoinHandle<()>>,
}

impl ComputeHandle {
    /// The outcome, if the computation has finished.
    pub fn outcome(&self) -> Option<Outcome> {
        self.ctx.completion.event().get()
    }

    /// True once the outcome is known.
    pub fn is_finished(&self) -> bool {
        self.ctx.completion.is_finished() && self.outcome().is_some()
    }

    /// Nodes processed so far.
    pub fn processed(&self) -> usize {
        self.ctx.completion.processed()
    }

    /// Block until finished or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome> {
        self.ctx.completion.event().wait_timeout(timeout)
    }

    /// Snapshot of the polygons assigned so far. After an abort this is the partial layout.
    pub fn layout(&self) -> Layout {
        Layout::from_context(&self.ctx)
    }

    /// Block until finished, join the workers and return the layout.
    pub fn wait(self) -> Result<Layout> {
        let outcome = self.ctx.completion.event().wait();
        for worker in self.workers {
            if worker.join().is_err() {
                tracing::debug!("worker thread ended by panic");
            }
        }
        match outcome {
            Outcome::Completed => Ok(Layout::from_context(&self.ctx)),
            Outcome::Aborted(reason) => Err(TreemapError::Aborted(reason)),
        }
    }
}

/// Polygons and convergence reports of a computation.
#[derive(Clone, Debug)]
pub struct Layout {
    tree: Arc<Tree>,
    polygons: Vec<Option<Polygon>>,
    stats: Vec<Option<SubdivisionStats>>,
    elapsed: Duration,
}

impl Layout {
    fn from_context(ctx: &Context) -> Self {
        let ids = (0..ctx.tree.len()).map(NodeId::from_idx);
        Self {
            tree: Arc::clone(&ctx.tree),
            polygons: ids.clone().map(|id| ctx.polygon(id).cloned()).collect(),
            stats: ids.map(|id| ctx.stats(id).copied()).collect(),
            elapsed: ctx.elapsed(),
        }
    }

    /// The tree this layout belongs to.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Polygon of `id`, if assigned.
    pub fn polygon(&self, id: NodeId) -> Option<&Polygon> {
        self.polygons.get(id.idx()).and_then(Option::as_ref)
    }

    /// Convergence report of `id`'s subdivision, for nodes that ran the solver.
    pub fn stats(&self, id: NodeId) -> Option<&SubdivisionStats> {
        self.stats.get(id.idx()).and_then(Option::as_ref)
    }

    /// Wall time from start to finish.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of nodes with a polygon.
    pub fn assigned(&self) -> usize {
        self.polygons.iter().filter(|p| p.is_some()).count()
    }

    /// Nodes with polygons, in depth-first order from the root.
    pub fn iter(&self) -> impl Iterator<Item = (&Node, &Polygon)> + '_ {
        self.tree
            .depth_first()
            .filter_map(|node| self.polygon(node.id()).map(|p| (node, p)))
    }
}
