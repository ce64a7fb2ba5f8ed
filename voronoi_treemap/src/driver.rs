// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subdivision driver: iterate a [`CellSolver`] until the children's areas match their shares.
//!
//! One subdivision splits a node's polygon among its children. Each iteration:
//!
//! 1. partitions the polygon with the current sites,
//! 2. measures the largest `|area_i / area - share_i|` over the children and remembers the
//!    best partition seen,
//! 3. moves every site to the centroid of its cell and scales its weight by
//!    `(share_i * area / area_i)^gain`, clamped per step.
//!
//! `gain` shrinks whenever the error grows, which damps oscillation. Weight gaps larger
//! than the squared distance between two sites would swallow the lighter cell, so the
//! heavier weight is pulled back after every update.
//!
//! The error is measured on the full cells. With [`Settings::shrink`] below `1.0` the
//! accepted cells are then scaled toward their centroids, so every child keeps its share
//! of the shrunken total.

use kurbo::Point;
use voronoi_cells::{CellSolver, Polygon, Site};

use crate::error::AbortReason;
use crate::settings::{ConvergencePolicy, Settings};
use crate::tree::Tree;
use crate::types::NodeId;

const MIN_RATIO: f64 = 0.25;
const MAX_RATIO: f64 = 4.0;
const GAIN_DECAY: f64 = 0.8;
const MIN_GAIN: f64 = 0.1;
const MAX_SEPARATION_STEPS: usize = 16;

/// Convergence report for one subdivision.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SubdivisionStats {
    /// Solver calls made.
    pub iterations: usize,
    /// Largest per-child share error of the accepted partition.
    pub max_error: f64,
    /// Whether `max_error` is within the error threshold.
    pub converged: bool,
}

/// Accepted partition of a node's polygon, one cell per child in child order.
#[derive(Clone, Debug, PartialEq)]
pub struct Subdivision {
    /// Child cells.
    pub cells: Vec<Polygon>,
    /// How the iteration went.
    pub stats: SubdivisionStats,
}

/// Split `polygon` among the children of `node`.
///
/// Returns an [`AbortReason`] when the solver fails, or when the partition stays above
/// the threshold and [`ConvergencePolicy::CANCEL_ON_MAX_ITERATION`] is set. Without that
/// flag the best partition found is accepted.
pub fn subdivide<S: CellSolver + ?Sized>(
    tree: &Tree,
    node: NodeId,
    polygon: &Polygon,
    settings: &Settings,
    solver: &S,
) -> Result<Subdivision, AbortReason> {
    let children = tree.children(node);
    let area = polygon.area_abs();
    let shares: Vec<f64> = children.iter().map(|&c| tree.get(c).share()).collect();

    let mut positions: Vec<Point> = children
        .iter()
        .map(|&c| polygon.relative_point(tree.get(c).seed()))
        .collect();
    separate_coincident(polygon, &mut positions);

    let weight_floor = area * 1e-9;
    let mut sites: Vec<Site> = positions
        .iter()
        .zip(&shares)
        .map(|(&p, &share)| Site::new(p, (0.5 * share * area).max(weight_floor), share))
        .collect();
    repair_overweight(&mut sites);

    let stop_on_threshold = settings
        .policy
        .contains(ConvergencePolicy::CANCEL_ON_AREA_ERROR_THRESHOLD);
    let mut best: Option<(Vec<Polygon>, f64)> = None;
    let mut previous_error = f64::INFINITY;
    let mut gain = 1.0;
    let mut iterations = 0;

    for iteration in 1..=settings.max_iterations {
        iterations = iteration;
        let partition = solver
            .partition(polygon, &sites)
            .map_err(|source| AbortReason::Solver { node, source })?;
        let mut cells = partition.cells;
        cells.resize_with(sites.len(), Polygon::default);
        let areas: Vec<f64> = cells.iter().map(Polygon::area_abs).collect();
        let error = max_share_error(&areas, &shares, area);
        tracing::trace!(node = node.get(), iteration, error, gain, "iteration");

        let improved = best.as_ref().is_none_or(|(_, e)| error < *e);
        if improved {
            best = Some((cells.clone(), error));
        }
        if stop_on_threshold && error <= settings.error_threshold {
            break;
        }
        if iteration == settings.max_iterations {
            break;
        }

        if error > previous_error {
            gain = (gain * GAIN_DECAY).max(MIN_GAIN);
        }
        previous_error = error;

        for (i, site) in sites.iter_mut().enumerate() {
            if let Some(c) = cells[i].centroid() {
                site.position = c;
            }
            let current = partition.weights.get(i).copied().unwrap_or(site.weight);
            let wanted = shares[i] * area;
            let ratio = if areas[i] > 0.0 {
                (wanted / areas[i]).powf(gain).clamp(MIN_RATIO, MAX_RATIO)
            } else {
                MAX_RATIO
            };
            site.weight = (current * ratio).max(weight_floor);
        }
        let mut moved: Vec<Point> = sites.iter().map(|s| s.position).collect();
        separate_coincident(polygon, &mut moved);
        for (site, p) in sites.iter_mut().zip(moved) {
            site.position = p;
        }
        repair_overweight(&mut sites);
    }

    let (cells, max_error) =
        best.unwrap_or_else(|| (vec![Polygon::default(); sites.len()], f64::INFINITY));
    let stats = SubdivisionStats {
        iterations,
        max_error,
        converged: max_error <= settings.error_threshold,
    };

    if !stats.converged {
        if settings
            .policy
            .contains(ConvergencePolicy::CANCEL_ON_MAX_ITERATION)
        {
            return Err(AbortReason::DidNotConverge {
                node,
                iterations,
                max_error,
            });
        }
        tracing::warn!(
            node = node.get(),
            iterations,
            max_error,
            threshold = settings.error_threshold,
            "subdivision did not converge; accepting best partition"
        );
    } else {
        tracing::debug!(node = node.get(), iterations, max_error, "subdivision converged");
    }

    let cells = if settings.shrink < 1.0 {
        cells.iter().map(|c| c.shrunk(settings.shrink)).collect()
    } else {
        cells
    };
    Ok(Subdivision { cells, stats })
}

/// Largest `|area_i / total - share_i|`.
fn max_share_error(areas: &[f64], shares: &[f64], total: f64) -> f64 {
    areas
        .iter()
        .zip(shares)
        .map(|(&a, &s)| (a / total - s).abs())
        .fold(0.0, f64::max)
}

/// Nudge sites sharing a position apart, staying inside the (convex) polygon.
fn separate_coincident(polygon: &Polygon, positions: &mut [Point]) {
    let vertices = polygon.vertices();
    if vertices.is_empty() {
        return;
    }
    let centroid = polygon.centroid().unwrap_or(vertices[0]);
    let eps2 = polygon.area_abs() * 1e-18;
    for i in 1..positions.len() {
        for step in 0..MAX_SEPARATION_STEPS {
            let p = positions[i];
            if !positions[..i].iter().any(|q| q.distance_squared(p) <= eps2) {
                break;
            }
            let toward = if p.distance_squared(centroid) <= eps2 {
                vertices[(i + step) % vertices.len()]
            } else {
                centroid
            };
            positions[i] = p.lerp(toward, 0.25);
        }
    }
}

/// Pull back weights that exceed a lighter neighbor's by more than their squared distance.
///
/// Afterwards `w_i <= w_j + d_ij²` holds for every pair, so each site lies in its own
/// cell. Lowering one weight can break a pair checked earlier, so passes repeat until
/// nothing changes; `n` passes always suffice.
fn repair_overweight(sites: &mut [Site]) {
    for _ in 0..sites.len() {
        let mut changed = false;
        for i in 0..sites.len() {
            for j in 0..sites.len() {
                if i == j {
                    continue;
                }
                let d2 = sites[i].position.distance_squared(sites[j].position);
                let limit = sites[j].weight + d2;
                if sites[i].weight > limit {
                    sites[i].weight = limit;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}
