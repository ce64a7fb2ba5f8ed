// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Voronoi Treemap: concurrent recursive partitioning of a polygon along a weighted tree.
//!
//! Given a weighted tree and a bounding polygon, this crate splits the polygon among the
//! root's children so that each child's area matches its share of the sibling weights,
//! then recurses into every child. The result nests every node's polygon inside its
//! parent's.
//!
//! - [`TreeBuilder`] validates adjacency rows, propagates wanted fractions top-down and
//!   places seeds from a seeded generator or an explicit table.
//! - [`subdivide`] drives a [`CellSolver`](voronoi_cells::CellSolver) until the children's
//!   areas are within the error threshold, governed by a [`ConvergencePolicy`].
//! - [`VoronoiTreemap`] runs subdivisions on a pool of worker threads. Nodes are queued
//!   as their parents finish, so sibling subtrees proceed in parallel.
//! - [`TreemapListener`] receives a notification per finished node and one when the
//!   whole computation ends.
//!
//! ## Completion
//!
//! A drained queue alone does not mean the work is done; another worker may be about to
//! push children. The computation finishes when the queue is empty, no worker is
//! mid-task and every node has been counted. Exactly one worker observes this and
//! delivers the [`Outcome`]: listeners first, then every waiter on [`ComputeHandle`].
//!
//! Aborts (a solver error, a subdivision that would not converge under
//! [`ConvergencePolicy::CANCEL_ON_MAX_ITERATION`], or a panicking worker) stop the whole
//! computation and are delivered the same way, so blocked callers never hang.
//!
//! ## Determinism
//!
//! Each subdivision reads only its own polygon and its children's seeds and weights, so a
//! fixed tree, seed and settings give the same polygons regardless of worker count.
//!
//! # Example
//!
//! ```rust
//! use voronoi_treemap::{NodeId, Settings, TreeBuilder, VoronoiTreemap};
//!
//! let builder = TreeBuilder::new(vec![vec![0, 1, 2, 3], vec![1], vec![2], vec![3]], 0)
//!     .weight(1, 1.0)
//!     .weight(2, 1.0)
//!     .weight(3, 2.0);
//! let settings = Settings::new().with_worker_count(2);
//!
//! let layout = VoronoiTreemap::build(builder, settings)
//!     .unwrap()
//!     .with_rect(0.0, 0.0, 100.0, 100.0)
//!     .compute_blocking()
//!     .unwrap();
//!
//! let big = layout.polygon(NodeId::new(3)).unwrap().area_abs();
//! assert!((big - 5000.0).abs() <= 100.0);
//! ```

pub mod completion;
pub mod driver;
pub mod error;
pub mod input;
pub mod listener;
mod scheduler;
pub mod settings;
pub mod tree;
pub mod treemap;
pub mod types;

pub use completion::Outcome;
pub use driver::{Subdivision, SubdivisionStats, subdivide};
pub use error::{AbortReason, Result, TreeError, TreemapError};
pub use input::TreeData;
pub use listener::{NodeFinished, TreemapListener};
pub use settings::{ConvergencePolicy, Settings};
pub use tree::{DepthFirst, Node, ROOT_FRACTION, Tree, TreeBuilder};
pub use treemap::{ComputeHandle, Layout, VoronoiTreemap};
pub use types::{NodeAttributes, NodeId, SeedEntry};

pub use voronoi_cells::{CellSolver, Polygon, PowerDiagram};
