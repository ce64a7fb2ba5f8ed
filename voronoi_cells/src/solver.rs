// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Solver trait for weighted partition implementations.

use crate::error::CellError;
use crate::partition::Partition;
use crate::types::{Polygon, Site};

/// Computes one weighted partition of a clip polygon.
///
/// Given a simple polygon and `n >= 2` weighted sites, an implementation returns `n`
/// simple polygons that are pairwise interior-disjoint and whose union equals the clip
/// polygon up to rounding, plus the weight each cell was produced with.
///
/// Raising a site's weight must grow its cell and lowering it must shrink it; callers
/// that iterate toward target areas rely on this.
pub trait CellSolver {
    /// Partition `clip` among `sites`.
    fn partition(&self, clip: &Polygon, sites: &[Site]) -> Result<Partition, CellError>;
}

impl<S: CellSolver + ?Sized> CellSolver for &S {
    fn partition(&self, clip: &Polygon, sites: &[Site]) -> Result<Partition, CellError> {
        (**self).partition(clip, sites)
    }
}

impl<S: CellSolver + ?Sized> CellSolver for std::sync::Arc<S> {
    fn partition(&self, clip: &Polygon, sites: &[Site]) -> Result<Partition, CellError> {
        (**self).partition(clip, sites)
    }
}

/// Shared input checks for solver implementations.
pub(crate) fn check_inputs(clip: &Polygon, sites: &[Site]) -> Result<(), CellError> {
    if sites.len() < 2 {
        return Err(CellError::TooFewSites(sites.len()));
    }
    let area = clip.area_abs();
    if clip.is_empty() || !area.is_finite() || area <= 0.0 {
        return Err(CellError::DegenerateClip {
            vertices: clip.len(),
            area,
        });
    }
    if let Some(index) = sites.iter().position(|s| !s.is_finite()) {
        return Err(CellError::NonFiniteSite { index });
    }
    Ok(())
}
