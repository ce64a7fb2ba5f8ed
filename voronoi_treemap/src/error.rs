// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for tree construction, computation and input loading.

use thiserror::Error;
use voronoi_cells::CellError;

use crate::types::NodeId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TreemapError>;

/// Structural problems found while building a [`Tree`](crate::Tree).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TreeError {
    /// The adjacency description has no rows.
    #[error("adjacency description has no rows")]
    Empty,

    /// The root id has no adjacency row.
    #[error("root id {root} has no adjacency row")]
    UnknownRoot {
        /// The requested root id.
        root: u32,
    },

    /// A row is missing its leading self id.
    #[error("adjacency row {row} is empty; it must start with its own id")]
    EmptyRow {
        /// Index of the empty row.
        row: usize,
    },

    /// Row `i` does not start with id `i`.
    #[error("adjacency row {row} starts with id {found}")]
    RowIdMismatch {
        /// Index of the row.
        row: usize,
        /// The id the row actually starts with.
        found: u32,
    },

    /// A row lists a child id that has no row of its own.
    #[error("node {parent} references unknown child id {child}")]
    UnknownChild {
        /// The node whose row lists the child.
        parent: NodeId,
        /// The unknown id.
        child: u32,
    },

    /// A node is listed as a child more than once, or the root is listed as a child.
    ///
    /// This also rejects cycles.
    #[error("node {child} is listed under both {first} and {second}")]
    MultipleParents {
        /// The node listed twice.
        child: NodeId,
        /// The first parent seen.
        first: NodeId,
        /// The second parent seen.
        second: NodeId,
    },

    /// A row is not reachable from the root.
    #[error("node {node} is not reachable from the root")]
    Unreachable {
        /// The first unreachable node.
        node: NodeId,
    },

    /// A raw weight is negative or not finite.
    #[error("node {node} has invalid weight {weight}")]
    InvalidWeight {
        /// The node carrying the weight.
        node: NodeId,
        /// The rejected weight.
        weight: f64,
    },

    /// The children of a node weigh nothing in total, so no proportional split exists.
    #[error("children of node {parent} have zero total weight")]
    ZeroWeight {
        /// The node whose children weigh nothing.
        parent: NodeId,
    },

    /// More rows than `u32` ids can address.
    #[error("tree has {rows} rows; at most u32::MAX are supported")]
    TooLarge {
        /// Number of rows supplied.
        rows: usize,
    },
}

/// Why a computation stopped before every node was laid out.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AbortReason {
    /// A subdivision stayed above the error threshold after the iteration limit,
    /// with [`ConvergencePolicy::CANCEL_ON_MAX_ITERATION`](crate::ConvergencePolicy::CANCEL_ON_MAX_ITERATION) set.
    #[error(
        "subdivision of node {node} did not converge after {iterations} iterations (max error {max_error})"
    )]
    DidNotConverge {
        /// The node being subdivided.
        node: NodeId,
        /// Iterations run.
        iterations: usize,
        /// Best maximum area error reached.
        max_error: f64,
    },

    /// The cell solver rejected a subdivision.
    #[error("cell solver failed on node {node}: {source}")]
    Solver {
        /// The node being subdivided.
        node: NodeId,
        /// The solver's error.
        #[source]
        source: CellError,
    },

    /// A worker thread panicked mid-task.
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker.
        worker: usize,
    },

    /// The queue drained with nodes still unprocessed.
    #[error("work ran out after {processed} of {total} nodes")]
    Stalled {
        /// Nodes processed when the queue drained.
        processed: usize,
        /// Nodes in the tree.
        total: usize,
    },
}

/// Top-level error for the treemap API.
#[derive(Debug, Error)]
pub enum TreemapError {
    /// `compute` was called before a bounding polygon was set.
    #[error("no bounding polygon set; call with_bounds or with_rect before compute")]
    MissingBounds,

    /// The tree failed to build.
    #[error("invalid tree: {0}")]
    Tree(#[from] TreeError),

    /// A setting is out of range.
    #[error("invalid settings: {message}")]
    InvalidSettings {
        /// What is wrong.
        message: String,
    },

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The computation stopped early.
    #[error("computation aborted: {0}")]
    Aborted(#[from] AbortReason),

    /// Input or settings JSON failed to parse.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TreemapError {
    /// Build an [`TreemapError::InvalidSettings`].
    #[must_use]
    pub fn invalid_settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            message: message.into(),
        }
    }

    /// The abort reason, if this error reports an aborted computation.
    #[must_use]
    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match self {
            Self::Aborted(reason) => Some(reason),
            _ => None,
        }
    }
}
