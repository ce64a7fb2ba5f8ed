// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partition results returned by [`CellSolver::partition`](crate::CellSolver::partition).

use crate::types::Polygon;

/// One partition of a clip polygon into cells, one per input site.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partition {
    /// Cells, in the same order as the input sites. A cell may be empty.
    pub cells: Vec<Polygon>,
    /// The weight each cell was produced with, in the same order as the input sites.
    pub weights: Vec<f64>,
}

impl Partition {
    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if there are no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Unsigned area of each cell.
    pub fn areas(&self) -> Vec<f64> {
        self.cells.iter().map(Polygon::area_abs).collect()
    }

    /// Sum of all cell areas.
    pub fn total_area(&self) -> f64 {
        self.cells.iter().map(Polygon::area_abs).sum()
    }
}
