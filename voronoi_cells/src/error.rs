// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for partition computation.

use thiserror::Error;

/// Errors a [`CellSolver`](crate::CellSolver) reports for invalid inputs.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CellError {
    /// A partition needs at least two sites.
    #[error("at least 2 sites are required, got {0}")]
    TooFewSites(usize),

    /// The clip polygon has fewer than three vertices or no area.
    #[error("degenerate clip polygon: {vertices} vertices, area {area}")]
    DegenerateClip {
        /// Vertex count of the rejected polygon.
        vertices: usize,
        /// Unsigned area of the rejected polygon.
        area: f64,
    },

    /// A site position or weight is NaN or infinite.
    #[error("site {index} has a non-finite position or weight")]
    NonFiniteSite {
        /// Index of the offending site.
        index: usize,
    },
}
