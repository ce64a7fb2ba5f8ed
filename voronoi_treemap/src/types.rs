// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the treemap: node identifiers and per-node input tables.

use core::fmt;

/// Identifier for a node in the tree.
///
/// Ids are dense: a tree built from `n` adjacency rows uses ids `0..n`, and row `i`
/// describes node `i`. Ids are immutable once the tree is built.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct NodeId(u32);

impl NodeId {
    /// Wrap a raw id.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub const fn get(self) -> u32 {
        self.0
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Trees are limited to u32 ids; the builder rejects larger inputs."
    )]
    pub(crate) const fn from_idx(idx: usize) -> Self {
        Self(idx as u32)
    }
}

impl From<u32> for NodeId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Optional per-node attributes supplied alongside the adjacency rows.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct NodeAttributes {
    /// Raw weight (`>= 0`). Nodes without one weigh `1.0`.
    pub weight: Option<f64>,
    /// Display name.
    pub name: Option<String>,
}

impl NodeAttributes {
    /// Attributes carrying only a weight.
    pub fn weighted(weight: f64) -> Self {
        Self {
            weight: Some(weight),
            name: None,
        }
    }

    /// Attributes carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            weight: None,
            name: Some(name.into()),
        }
    }
}

/// An explicit seed coordinate for one node, overriding the random draw.
///
/// Coordinates are normalized to `[0, 1)²`, relative to the bounding box of the
/// polygon the node's siblings share.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeedEntry {
    /// The node this seed belongs to.
    pub id: NodeId,
    /// Normalized x coordinate.
    pub x: f64,
    /// Normalized y coordinate.
    pub y: f64,
}

impl SeedEntry {
    /// Create a seed entry.
    pub const fn new(id: NodeId, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }
}
