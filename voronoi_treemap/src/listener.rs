// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener trait for progress and completion notifications.

use voronoi_cells::Polygon;

use crate::completion::Outcome;
use crate::driver::SubdivisionStats;
use crate::types::NodeId;

/// A node whose children just received their polygons.
#[derive(Clone, Copy, Debug)]
pub struct NodeFinished<'a> {
    /// The parent node.
    pub node: NodeId,
    /// Depth of the parent (root = 1).
    pub depth: u32,
    /// Child ids, in adjacency order.
    pub children: &'a [NodeId],
    /// Child polygons, parallel to `children`.
    pub polygons: &'a [Polygon],
    /// Convergence report, or `None` when a single child took over the whole polygon
    /// without a solver run.
    pub stats: Option<SubdivisionStats>,
}

/// Receives notifications from worker threads.
///
/// Both methods default to doing nothing. They run on whichever worker finished the
/// work, so implementations must be cheap and thread-safe.
pub trait TreemapListener: Send + Sync {
    /// Called once per internal node after its children's polygons are committed.
    ///
    /// After an abort no new node events start; the computation's remaining nodes are
    /// never reported.
    fn on_node_finished(&self, event: &NodeFinished<'_>) {
        let _ = event;
    }

    /// Called exactly once per computation, before waiters are released.
    ///
    /// A panic here is logged and does not keep waiters from being released.
    fn on_all_finished(&self, outcome: &Outcome) {
        let _ = outcome;
    }
}
