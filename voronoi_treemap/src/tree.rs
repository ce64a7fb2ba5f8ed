// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree construction: structural validation, area fractions and seed placement.

use std::collections::BTreeMap;

use kurbo::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::TreeError;
use crate::settings::Settings;
use crate::types::{NodeAttributes, NodeId, SeedEntry};

/// Share of the bounding polygon available to the root's children.
///
/// The root's own wanted fraction is set to this value.
pub const ROOT_FRACTION: f64 = 1.0;

/// One node of a built [`Tree`].
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    weight: f64,
    share: f64,
    wanted_fraction: f64,
    seed: Point,
    depth: u32,
    name: Option<String>,
}

impl Node {
    fn new(id: NodeId, children: Vec<NodeId>) -> Self {
        Self {
            id,
            parent: None,
            children,
            weight: 1.0,
            share: 1.0,
            wanted_fraction: 0.0,
            seed: Point::ZERO,
            depth: 0,
            name: None,
        }
    }

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Parent id, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Direct children, in adjacency order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Raw weight (`1.0` under uniform weights or when none was given).
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Share of the parent's polygon this node should occupy.
    pub fn share(&self) -> f64 {
        self.share
    }

    /// Share of the whole bounding polygon this node should occupy.
    pub fn wanted_fraction(&self) -> f64 {
        self.wanted_fraction
    }

    /// Normalized seed coordinate in `[0, 1)²`.
    pub fn seed(&self) -> Point {
        self.seed
    }

    /// Depth in the tree; the root has depth 1.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Display name, if one was supplied.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// True when the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True when the node has more than one child and so needs a cell solver run.
    pub fn needs_subdivision(&self) -> bool {
        self.children.len() > 1
    }
}

/// A validated weighted tree, immutable once built.
///
/// Built with [`TreeBuilder`]. Nodes are stored densely by id.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Start building a tree from adjacency rows.
    ///
    /// Row `i` is `[i, child₁, …, childₖ]`; a row of length 1 is a leaf.
    pub fn builder(adjacency: impl Into<Vec<Vec<u32>>>, root: u32) -> TreeBuilder {
        TreeBuilder::new(adjacency, root)
    }

    /// Root id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a built tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if `id` names a node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        id.idx() < self.nodes.len()
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.idx())
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    /// Children of `id`; empty for leaves and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or_default()
    }

    /// Parent of `id`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Depth of `id` (root = 1).
    pub fn depth(&self, id: NodeId) -> Option<u32> {
        self.node(id).map(Node::depth)
    }

    /// Display name of `id`.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(Node::name)
    }

    /// Share of the whole bounding polygon `id` should occupy.
    pub fn wanted_fraction(&self, id: NodeId) -> Option<f64> {
        self.node(id).map(Node::wanted_fraction)
    }

    /// Normalized seed of `id`.
    pub fn seed(&self, id: NodeId) -> Option<Point> {
        self.node(id).map(Node::seed)
    }

    /// Raw weight of `id`.
    pub fn weight(&self, id: NodeId) -> Option<f64> {
        self.node(id).map(Node::weight)
    }

    /// True when `id` is a known leaf.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(Node::is_leaf)
    }

    /// Number of nodes with more than one child, i.e. cell solver runs per computation.
    pub fn subdivision_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.needs_subdivision()).count()
    }

    /// Lazy pre-order traversal from the root.
    ///
    /// Each call starts a fresh traversal with its own stack.
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: vec![self.root],
        }
    }

    /// Node by id; ids handed out by the tree are always valid.
    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.idx()]
    }
}

/// Pre-order iterator returned by [`Tree::depth_first`].
#[derive(Clone, Debug)]
pub struct DepthFirst<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.get(id);
        self.stack.extend(node.children.iter().rev().copied());
        Some(node)
    }
}

/// Builds and validates a [`Tree`].
#[derive(Clone, Debug)]
pub struct TreeBuilder {
    adjacency: Vec<Vec<u32>>,
    root: u32,
    attributes: BTreeMap<u32, NodeAttributes>,
    uniform_weights: bool,
    random_seed: u64,
    seed_table: Option<Vec<SeedEntry>>,
}

impl TreeBuilder {
    /// Start from adjacency rows and a root id.
    pub fn new(adjacency: impl Into<Vec<Vec<u32>>>, root: u32) -> Self {
        Self {
            adjacency: adjacency.into(),
            root,
            attributes: BTreeMap::new(),
            uniform_weights: false,
            random_seed: Settings::DEFAULT_RANDOM_SEED,
            seed_table: None,
        }
    }

    /// Add per-node attributes. Later entries for the same id replace earlier ones.
    #[must_use]
    pub fn attributes(mut self, attributes: impl IntoIterator<Item = (u32, NodeAttributes)>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Set the raw weight of one node.
    #[must_use]
    pub fn weight(mut self, id: u32, weight: f64) -> Self {
        self.attributes.entry(id).or_default().weight = Some(weight);
        self
    }

    /// Treat every node as weight `1.0`.
    #[must_use]
    pub fn uniform_weights(mut self, uniform: bool) -> Self {
        self.uniform_weights = uniform;
        self
    }

    /// Seed for the generator placing node seeds.
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Explicit seed coordinates overriding the random draw.
    #[must_use]
    pub fn seed_table(mut self, table: impl Into<Vec<SeedEntry>>) -> Self {
        self.seed_table = Some(table.into());
        self
    }

    /// Take uniform weights, the random seed and the seed table from `settings`.
    #[must_use]
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.uniform_weights = settings.uniform_weights;
        self.random_seed = settings.random_seed;
        if settings.seed_table.is_some() {
            self.seed_table.clone_from(&settings.seed_table);
        }
        self
    }

    /// Validate the structure, propagate fractions and place seeds.
    pub fn build(self) -> Result<Tree, TreeError> {
        let mut nodes = self.wire()?;
        let root = NodeId::new(self.root);
        assign_depths(&mut nodes, root)?;
        self.apply_attributes(&mut nodes)?;
        calculate_weights(&mut nodes, root)?;
        self.place_seeds(&mut nodes);

        let tree = Tree { nodes, root };
        tracing::debug!(
            nodes = tree.len(),
            subdivisions = tree.subdivision_count(),
            root = tree.root.get(),
            "tree built"
        );
        Ok(tree)
    }

    fn wire(&self) -> Result<Vec<Node>, TreeError> {
        let len = self.adjacency.len();
        if len == 0 {
            return Err(TreeError::Empty);
        }
        if u32::try_from(len).is_err() {
            return Err(TreeError::TooLarge { rows: len });
        }
        if self.root as usize >= len {
            return Err(TreeError::UnknownRoot { root: self.root });
        }

        let root = NodeId::new(self.root);
        let mut parents: Vec<Option<NodeId>> = vec![None; len];
        // The root counts as its own parent so listing it as a child is caught.
        parents[root.idx()] = Some(root);

        let mut nodes = Vec::with_capacity(len);
        for (row, ids) in self.adjacency.iter().enumerate() {
            let id = NodeId::from_idx(row);
            let (&own, children) = ids.split_first().ok_or(TreeError::EmptyRow { row })?;
            if own as usize != row {
                return Err(TreeError::RowIdMismatch { row, found: own });
            }
            let mut wired = Vec::with_capacity(children.len());
            for &child in children {
                if child as usize >= len {
                    return Err(TreeError::UnknownChild { parent: id, child });
                }
                let child = NodeId::new(child);
                if let Some(first) = parents[child.idx()] {
                    return Err(TreeError::MultipleParents {
                        child,
                        first,
                        second: id,
                    });
                }
                parents[child.idx()] = Some(id);
                wired.push(child);
            }
            nodes.push(Node::new(id, wired));
        }

        for (node, parent) in nodes.iter_mut().zip(parents) {
            node.parent = parent.filter(|&p| p != node.id);
        }
        Ok(nodes)
    }

    fn apply_attributes(&self, nodes: &mut [Node]) -> Result<(), TreeError> {
        for (&id, attrs) in &self.attributes {
            let Some(node) = nodes.get_mut(id as usize) else {
                tracing::warn!(id, "attribute entry for unknown node skipped");
                continue;
            };
            if let Some(name) = &attrs.name {
                node.name = Some(name.clone());
            }
            if self.uniform_weights {
                continue;
            }
            if let Some(weight) = attrs.weight {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(TreeError::InvalidWeight {
                        node: node.id,
                        weight,
                    });
                }
                node.weight = weight;
            }
        }
        Ok(())
    }

    fn place_seeds(&self, nodes: &mut [Node]) {
        let mut rng = StdRng::seed_from_u64(self.random_seed);
        for node in nodes.iter_mut() {
            let x: f64 = rng.random();
            let y: f64 = rng.random();
            node.seed = Point::new(x, y);
        }
        for entry in self.seed_table.iter().flatten() {
            match nodes.get_mut(entry.id.idx()) {
                Some(node) => node.seed = Point::new(entry.x, entry.y),
                None => tracing::warn!(id = entry.id.get(), "seed entry for unknown node skipped"),
            }
        }
    }
}

/// Walk down from the root assigning depths, and reject rows the root cannot reach.
fn assign_depths(nodes: &mut [Node], root: NodeId) -> Result<(), TreeError> {
    let mut stack = vec![(root, 1_u32)];
    let mut seen = 0_usize;
    while let Some((id, depth)) = stack.pop() {
        let node = &mut nodes[id.idx()];
        node.depth = depth;
        seen += 1;
        stack.extend(node.children.iter().map(|&c| (c, depth + 1)));
    }
    if seen == nodes.len() {
        return Ok(());
    }
    match nodes.iter().find(|n| n.depth == 0) {
        Some(node) => Err(TreeError::Unreachable { node: node.id }),
        None => Ok(()),
    }
}

/// Distribute wanted fractions top-down in proportion to sibling weights.
///
/// The root receives [`ROOT_FRACTION`]; every child receives its parent's fraction times
/// its weight over the sibling weight sum.
pub(crate) fn calculate_weights(nodes: &mut [Node], root: NodeId) -> Result<(), TreeError> {
    nodes[root.idx()].share = 1.0;
    nodes[root.idx()].wanted_fraction = ROOT_FRACTION;

    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let parent = &nodes[id.idx()];
        if parent.children.is_empty() {
            continue;
        }
        let children = parent.children.clone();
        let parent_fraction = parent.wanted_fraction;
        let sum: f64 = children.iter().map(|c| nodes[c.idx()].weight).sum();
        if sum <= 0.0 {
            return Err(TreeError::ZeroWeight { parent: id });
        }
        for &child in &children {
            let node = &mut nodes[child.idx()];
            node.share = node.weight / sum;
            node.wanted_fraction = parent_fraction * node.share;
        }
        stack.extend(children);
    }
    Ok(())
}
