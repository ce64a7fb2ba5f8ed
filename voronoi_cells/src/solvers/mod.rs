// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Solver implementations.
//!
//! - `power`: power diagram by successive half-plane clipping (`O(n²)` clips per partition).
//!
//! Power bisector note
//! -------------------
//! For sites `p_i`, `p_j` with weights `w_i`, `w_j`, the cell of `i` lies on the side of
//!
//! `2 x · (p_j - p_i) <= |p_j|² - |p_i|² - w_j + w_i`
//!
//! Raising `w_i` moves the bisector away from `p_i` by `Δw / (2 |p_j - p_i|)`, so the
//! cell grows monotonically with its weight.

pub mod power;
