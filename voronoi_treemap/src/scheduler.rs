// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Worker pool: a shared task queue, the per-computation context and the worker loop.
//!
//! Work is discovered while running. The root is settled up front; every worker then
//! repeatedly takes a node, subdivides it and settles each child:
//!
//! - a leaf child is done as soon as its polygon is assigned,
//! - a child with one child hands its polygon straight down, without a solver run,
//! - a child with several children is pushed back onto the queue.
//!
//! Every node's polygon has exactly one writer, the worker that settled its parent, so
//! polygons live in write-once slots and need no further locking.
//!
//! Completion is detected on quiescence: the queue is empty and no worker is mid-task.
//! Workers only report a task done after pushing its children and counting its nodes,
//! so a quiescent queue with every node counted means the layout is complete.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use voronoi_cells::{CellSolver, Polygon};

use crate::completion::{CompletionTracker, Outcome};
use crate::driver::{SubdivisionStats, subdivide};
use crate::error::{AbortReason, Result};
use crate::listener::{NodeFinished, TreemapListener};
use crate::settings::Settings;
use crate::tree::Tree;
use crate::types::NodeId;

/// Shared solver handle.
pub(crate) type SharedSolver = Arc<dyn CellSolver + Send + Sync>;
/// Shared listener handle.
pub(crate) type SharedListener = Arc<dyn TreemapListener>;

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<NodeId>,
    active: usize,
    closed: bool,
}

/// Unbounded blocking multi-producer, multi-consumer queue of nodes awaiting subdivision.
///
/// Also counts workers between [`pop`](Self::pop) and [`task_done`](Self::task_done) so
/// an empty queue is not mistaken for finished work.
#[derive(Debug, Default)]
pub(crate) struct TaskQueue {
    state: Mutex<QueueState>,
    cond: Condvar,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, id: NodeId) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.closed {
            return;
        }
        state.pending.push_back(id);
        self.cond.notify_one();
    }

    /// Block until a node is available and mark the caller active. `None` once closed.
    pub(crate) fn pop(&self) -> Option<NodeId> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if state.closed {
                return None;
            }
            if let Some(id) = state.pending.pop_front() {
                state.active += 1;
                return Some(id);
            }
            state = self.cond.wait(state).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Mark the caller idle. Returns true when this left the queue quiescent.
    pub(crate) fn task_done(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.active = state.active.saturating_sub(1);
        state.pending.is_empty() && state.active == 0 && !state.closed
    }

    /// Wake every blocked worker and refuse further work.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.closed = true;
        state.pending.clear();
        self.cond.notify_all();
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pending
            .len()
    }
}

/// Worker life cycle, logged at trace level.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum WorkerState {
    WaitingForTask,
    Subdividing,
    ReportingCompletion,
}

/// Everything one computation shares between its workers.
///
/// Built fresh by every [`VoronoiTreemap::compute`](crate::VoronoiTreemap::compute), so
/// computations over the same tree are independent.
pub(crate) struct Context {
    pub(crate) tree: Arc<Tree>,
    pub(crate) settings: Settings,
    solver: SharedSolver,
    listeners: Vec<SharedListener>,
    polygons: Vec<OnceLock<Polygon>>,
    stats: Vec<OnceLock<SubdivisionStats>>,
    queue: TaskQueue,
    pub(crate) completion: CompletionTracker,
    started: Instant,
    elapsed: OnceLock<Duration>,
}

impl core::fmt::Debug for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let assigned = self.polygons.iter().filter(|p| p.get().is_some()).count();
        f.debug_struct("Context")
            .field("nodes", &self.tree.len())
            .field("assigned", &assigned)
            .field("listeners", &self.listeners.len())
            .field("queue", &self.queue)
            .field("completion", &self.completion)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub(crate) fn new(
        tree: Arc<Tree>,
        settings: Settings,
        solver: SharedSolver,
        listeners: Vec<SharedListener>,
    ) -> Self {
        let len = tree.len();
        Self {
            polygons: (0..len).map(|_| OnceLock::new()).collect(),
            stats: (0..len).map(|_| OnceLock::new()).collect(),
            completion: CompletionTracker::new(len),
            queue: TaskQueue::new(),
            started: Instant::now(),
            elapsed: OnceLock::new(),
            tree,
            settings,
            solver,
            listeners,
        }
    }

    pub(crate) fn polygon(&self, id: NodeId) -> Option<&Polygon> {
        self.polygons.get(id.idx()).and_then(OnceLock::get)
    }

    pub(crate) fn stats(&self, id: NodeId) -> Option<&SubdivisionStats> {
        self.stats.get(id.idx()).and_then(OnceLock::get)
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.elapsed
            .get()
            .copied()
            .unwrap_or_else(|| self.started.elapsed())
    }

    fn assign(&self, id: NodeId, polygon: Polygon) {
        if self.polygons[id.idx()].set(polygon).is_err() {
            tracing::error!(node = id.get(), "polygon assigned twice; keeping the first");
        }
    }

    /// Skipped once the outcome is claimed. Only an event already being delivered when an
    /// abort lands can overlap `on_all_finished`.
    fn notify_node_finished(&self, event: &NodeFinished<'_>) {
        if self.completion.is_finished() {
            return;
        }
        for listener in &self.listeners {
            listener.on_node_finished(event);
        }
    }

    /// Walk down from `id`, whose polygon is already assigned, until reaching a leaf or a
    /// node that needs subdividing. Returns the node to enqueue, if any, and the number of
    /// nodes finished on the way.
    fn settle(&self, mut id: NodeId) -> (Option<NodeId>, usize) {
        let mut finished = 0;
        loop {
            let node = self.tree.get(id);
            match node.children() {
                [] => return (None, finished + 1),
                &[only] => {
                    let Some(polygon) = self.polygon(id).cloned() else {
                        tracing::error!(node = id.get(), "settled node has no polygon");
                        return (None, finished);
                    };
                    self.assign(only, polygon.clone());
                    finished += 1;
                    tracing::trace!(node = id.get(), child = only.get(), "single child takes the whole polygon");
                    self.notify_node_finished(&NodeFinished {
                        node: id,
                        depth: node.depth(),
                        children: node.children(),
                        polygons: core::slice::from_ref(&polygon),
                        stats: None,
                    });
                    id = only;
                }
                _ => return (Some(id), finished),
            }
        }
    }

    /// Settle the root against the bounding polygon. Returns whether it needs a worker.
    pub(crate) fn seed_root(&self, bounds: Polygon) -> bool {
        let root = self.tree.root();
        self.assign(root, bounds);
        let (next, finished) = self.settle(root);
        self.completion.mark_processed(finished);
        match next {
            Some(id) => {
                self.queue.push(id);
                true
            }
            None => {
                self.finish_if_done();
                false
            }
        }
    }

    /// Subdivide one queued node and settle its children.
    fn process(&self, id: NodeId) {
        let node = self.tree.get(id);
        let Some(polygon) = self.polygon(id) else {
            tracing::error!(node = id.get(), "queued node has no polygon");
            return;
        };
        let subdivision = match subdivide(&self.tree, id, polygon, &self.settings, &*self.solver) {
            Ok(subdivision) => subdivision,
            Err(reason) => {
                self.finish(Outcome::Aborted(reason));
                return;
            }
        };

        for (&child, cell) in node.children().iter().zip(&subdivision.cells) {
            self.assign(child, cell.clone());
        }
        let _ = self.stats[id.idx()].set(subdivision.stats);

        let mut finished = 1;
        for &child in node.children() {
            let (next, count) = self.settle(child);
            finished += count;
            if let Some(next) = next {
                self.queue.push(next);
            }
        }
        let processed = self.completion.mark_processed(finished);
        tracing::debug!(
            node = id.get(),
            iterations = subdivision.stats.iterations,
            max_error = subdivision.stats.max_error,
            processed,
            total = self.completion.total(),
            "node subdivided"
        );
        self.notify_node_finished(&NodeFinished {
            node: id,
            depth: node.depth(),
            children: node.children(),
            polygons: &subdivision.cells,
            stats: Some(subdivision.stats),
        });
    }

    /// Finish once every node is counted; a drained queue with nodes left is a stall.
    fn finish_if_done(&self) {
        if self.completion.all_processed() {
            self.finish(Outcome::Completed);
        } else {
            self.finish(Outcome::Aborted(AbortReason::Stalled {
                processed: self.completion.processed(),
                total: self.completion.total(),
            }));
        }
    }

    /// Deliver `outcome` once: stop the queue, notify listeners, then release waiters.
    ///
    /// A listener that panics is logged and skipped; waiters are released regardless.
    pub(crate) fn finish(&self, outcome: Outcome) {
        if !self.completion.try_finish() {
            return;
        }
        let elapsed = self.started.elapsed();
        let _ = self.elapsed.set(elapsed);
        self.queue.close();
        match &outcome {
            Outcome::Completed => tracing::info!(
                nodes = self.completion.total(),
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "treemap computed"
            ),
            Outcome::Aborted(reason) => tracing::error!(
                %reason,
                processed = self.completion.processed(),
                total = self.completion.total(),
                "treemap computation aborted"
            ),
        }
        for (index, listener) in self.listeners.iter().enumerate() {
            let notified = panic::catch_unwind(AssertUnwindSafe(|| {
                listener.on_all_finished(&outcome);
            }));
            if notified.is_err() {
                tracing::error!(listener = index, "listener panicked in on_all_finished");
            }
        }
        self.completion.event().fire(outcome);
    }

    /// Claim completion without notifying anyone, then stop the queue.
    pub(crate) fn cancel_silently(&self) {
        if self.completion.try_finish() {
            self.queue.close();
        }
    }
}

/// Aborts the computation if a worker unwinds mid-task.
struct PanicGuard<'a> {
    ctx: &'a Context,
    worker: usize,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.ctx.finish(Outcome::Aborted(AbortReason::WorkerPanicked {
                worker: self.worker,
            }));
        }
    }
}

fn run_worker(ctx: &Context, worker: usize) {
    let _guard = PanicGuard { ctx, worker };
    let mut state = WorkerState::WaitingForTask;
    tracing::trace!(?state, "worker started");
    while let Some(id) = ctx.queue.pop() {
        state = WorkerState::Subdividing;
        tracing::trace!(?state, node = id.get());
        ctx.process(id);

        state = WorkerState::ReportingCompletion;
        tracing::trace!(?state, node = id.get());
        if ctx.queue.task_done() {
            ctx.finish_if_done();
        }
        state = WorkerState::WaitingForTask;
    }
    tracing::trace!(?state, "worker exiting");
}

/// Spawn `count` named workers over `ctx`.
///
/// On a spawn failure the computation is cancelled, the workers already started are
/// joined and the error is returned.
pub(crate) fn spawn_workers(ctx: &Arc<Context>, count: usize) -> Result<Vec<JoinHandle<()>>> {
    let span = tracing::Span::current();
    let mut handles = Vec::with_capacity(count);
    for worker in 0..count {
        let worker_ctx = Arc::clone(ctx);
        let span = span.clone();
        let spawned = thread::Builder::new()
            .name(format!("voronoi-worker-{worker}"))
            .spawn(move || {
                let _entered = tracing::debug_span!(parent: &span, "worker", worker).entered();
                run_worker(&worker_ctx, worker);
            });
        match spawned {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                tracing::error!(worker, %err, "failed to spawn worker");
                ctx.cancel_silently();
                for handle in handles {
                    let _ = handle.join();
                }
                return Err(err.into());
            }
        }
    }
    Ok(handles)
}
