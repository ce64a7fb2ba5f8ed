// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Power diagram solver based on half-plane clipping.

use kurbo::Vec2;

use crate::error::CellError;
use crate::partition::Partition;
use crate::solver::{CellSolver, check_inputs};
use crate::types::{Polygon, Site};

/// Additively weighted power diagram clipped to a polygon.
///
/// Each cell starts as the clip polygon and is clipped against the power bisector of
/// every other site. Results are exact when the clip polygon is convex, which holds for
/// rectangles and for every cell this solver produces, so recursive use stays exact.
///
/// Two sites at the same position cannot be separated by a bisector. The heavier one
/// (or the earlier one on equal weights) keeps the shared region and the other cell
/// is empty.
#[derive(Copy, Clone, Debug, Default)]
pub struct PowerDiagram;

impl PowerDiagram {
    /// Create the solver.
    pub const fn new() -> Self {
        Self
    }

    fn cell(clip: &Polygon, sites: &[Site], i: usize) -> Polygon {
        let si = sites[i];
        let pi = si.position.to_vec2();
        let mut cell = clip.clone();
        for (j, sj) in sites.iter().enumerate() {
            if i == j {
                continue;
            }
            let pj = sj.position.to_vec2();
            let normal: Vec2 = (pj - pi) * 2.0;
            if normal.hypot2() == 0.0 {
                if si.weight < sj.weight || (si.weight == sj.weight && i > j) {
                    return Polygon::default();
                }
                continue;
            }
            let offset = pj.hypot2() - pi.hypot2() - sj.weight + si.weight;
            cell = cell.clip_half_plane(normal, offset);
            if cell.is_empty() {
                break;
            }
        }
        cell
    }
}

impl CellSolver for PowerDiagram {
    fn partition(&self, clip: &Polygon, sites: &[Site]) -> Result<Partition, CellError> {
        check_inputs(clip, sites)?;
        let cells = (0..sites.len())
            .map(|i| Self::cell(clip, sites, i))
            .collect();
        Ok(Partition {
            cells,
            weights: sites.iter().map(|s| s.weight).collect(),
        })
    }
}
