// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Voronoi Cells: Kurbo-native polygons and weighted partitions of a clip polygon.
//!
//! Voronoi Cells is the geometric building block behind Voronoi treemaps.
//!
//! - [`Polygon`] is a closed simple polygon that implements [`kurbo::Shape`], so cells can
//!   be handed to any Kurbo-aware renderer.
//! - [`Site`] is a weighted seed: a position, a power weight and a wanted area share.
//! - [`CellSolver`] is the contract for splitting a clip polygon among sites, returning a
//!   [`Partition`].
//! - [`PowerDiagram`] is the default solver: an additively weighted power diagram built by
//!   half-plane clipping.
//!
//! Solvers are pluggable via the trait so higher layers (like a treemap scheduler) can swap
//! the diagram construction without API churn.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Point;
//! use voronoi_cells::{CellSolver, Polygon, PowerDiagram, Site};
//!
//! let clip = Polygon::from_xywh(0.0, 0.0, 100.0, 100.0);
//! let sites = [
//!     Site::new(Point::new(25.0, 50.0), 0.0, 0.5),
//!     Site::new(Point::new(75.0, 50.0), 0.0, 0.5),
//! ];
//!
//! let partition = PowerDiagram.partition(&clip, &sites).unwrap();
//! assert_eq!(partition.len(), 2);
//! assert!((partition.total_area() - 10_000.0).abs() < 1e-9);
//! ```
//!
//! ### Float semantics
//!
//! Positions and weights must be finite; solvers reject NaN and infinities with
//! [`CellError::NonFiniteSite`].

pub mod error;
pub mod partition;
pub mod solver;
pub mod solvers;
pub mod types;

pub use error::CellError;
pub use partition::Partition;
pub use solver::CellSolver;
pub use solvers::power::PowerDiagram;
pub use types::{Polygon, PolygonPathIter, Site};

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use std::sync::Arc;

    #[test]
    fn solver_through_shared_handle() {
        let solver: Arc<dyn CellSolver + Send + Sync> = Arc::new(PowerDiagram::new());
        let clip = Polygon::from_xywh(0.0, 0.0, 10.0, 10.0);
        let sites = [
            Site::new(Point::new(2.0, 2.0), 0.0, 0.5),
            Site::new(Point::new(8.0, 8.0), 0.0, 0.5),
        ];
        let part = solver.partition(&clip, &sites).unwrap();
        assert!((part.total_area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn nested_partitions_stay_exact() {
        let clip = Polygon::from_xywh(0.0, 0.0, 100.0, 100.0);
        let sites = [
            Site::new(Point::new(20.0, 30.0), 0.0, 0.5),
            Site::new(Point::new(70.0, 60.0), 0.0, 0.5),
        ];
        let outer = PowerDiagram.partition(&clip, &sites).unwrap();
        let inner_clip = &outer.cells[0];
        let c = inner_clip.centroid().unwrap();
        let inner_sites = [
            Site::new(Point::new(c.x - 5.0, c.y), 0.0, 0.5),
            Site::new(Point::new(c.x + 5.0, c.y), 0.0, 0.5),
        ];
        let inner = PowerDiagram.partition(inner_clip, &inner_sites).unwrap();
        assert!((inner.total_area() - inner_clip.area_abs()).abs() < 1e-6);
    }
}
