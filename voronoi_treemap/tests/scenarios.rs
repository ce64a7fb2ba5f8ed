// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end layouts: weighted and uniform splits, best-effort acceptance, leaf
//! handling, determinism and the completion protocol.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use voronoi_cells::{CellError, Partition, Site};
use voronoi_treemap::{
    AbortReason, CellSolver, Layout, NodeFinished, NodeId, Outcome, Polygon, PowerDiagram,
    Settings, Tree, TreeBuilder, TreemapListener, VoronoiTreemap,
};

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Recorder {
    nodes: Mutex<Vec<(NodeId, u32, Vec<NodeId>, Vec<f64>)>>,
    outcomes: Mutex<Vec<Outcome>>,
}

impl TreemapListener for Recorder {
    fn on_node_finished(&self, event: &NodeFinished<'_>) {
        let areas = event.polygons.iter().map(Polygon::area_abs).collect();
        self.nodes.lock().unwrap().push((
            event.node,
            event.depth,
            event.children.to_vec(),
            areas,
        ));
    }

    fn on_all_finished(&self, outcome: &Outcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}

impl Recorder {
    fn finished_nodes(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for (id, ..) in self.nodes.lock().unwrap().iter() {
            *counts.entry(id.get()).or_default() += 1;
        }
        counts
    }
}

#[derive(Debug, Default)]
struct Counting {
    calls: AtomicUsize,
}

impl CellSolver for Counting {
    fn partition(&self, clip: &Polygon, sites: &[Site]) -> Result<Partition, CellError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PowerDiagram.partition(clip, sites)
    }
}

fn three_leaves(weights: [f64; 3]) -> TreeBuilder {
    TreeBuilder::new(vec![vec![0, 1, 2, 3], vec![1], vec![2], vec![3]], 0)
        .weight(1, weights[0])
        .weight(2, weights[1])
        .weight(3, weights[2])
}

/// 13 nodes: a wide root, a two-level branch, a single-child chain and leaves.
fn nested() -> TreeBuilder {
    TreeBuilder::new(
        vec![
            vec![0, 1, 2, 3, 4],
            vec![1, 5, 6, 7],
            vec![2, 8, 9],
            vec![3, 10],
            vec![4],
            vec![5],
            vec![6],
            vec![7],
            vec![8],
            vec![9],
            vec![10, 11, 12],
            vec![11],
            vec![12],
        ],
        0,
    )
    .weight(1, 4.0)
    .weight(2, 2.0)
    .weight(3, 3.0)
    .weight(4, 1.0)
    .weight(5, 1.0)
    .weight(6, 2.0)
    .weight(7, 1.0)
    .weight(11, 1.0)
    .weight(12, 3.0)
}

fn area(layout: &Layout, id: u32) -> f64 {
    layout.polygon(NodeId::new(id)).unwrap().area_abs()
}

fn run(builder: TreeBuilder, settings: Settings) -> Layout {
    VoronoiTreemap::build(builder, settings)
        .unwrap()
        .with_rect(0.0, 0.0, 100.0, 100.0)
        .compute_blocking()
        .unwrap()
}

// ═════════════════════════════════════════════════════════════════════════
// Weighted splits
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn weighted_leaves_get_proportional_areas() {
    let layout = run(three_leaves([1.0, 1.0, 2.0]), Settings::new());
    let tolerance = 0.01 * 10_000.0;
    for (id, expected) in [(1, 2500.0), (2, 2500.0), (3, 5000.0)] {
        let got = area(&layout, id);
        assert!((got - expected).abs() <= tolerance, "node {id}: {got} vs {expected}");
    }
    assert!(layout.stats(NodeId::new(0)).unwrap().converged);
}

#[test]
fn uniform_weights_ignore_raw_weights() {
    let layout = run(
        three_leaves([1.0, 1.0, 2.0]),
        Settings::new().with_uniform_weights(true),
    );
    let tolerance = 0.01 * 10_000.0;
    for id in 1..=3 {
        let got = area(&layout, id);
        assert!((got - 10_000.0 / 3.0).abs() <= tolerance, "node {id}: {got}");
    }
}

#[test]
fn one_iteration_with_zero_threshold_still_finishes() {
    let recorder = Arc::new(Recorder::default());
    let mut treemap = VoronoiTreemap::build(
        three_leaves([1.0, 1.0, 2.0]),
        Settings::new()
            .with_max_iterations(1)
            .with_error_threshold(0.0)
            .cancel_on_max_iteration(false),
    )
    .unwrap()
    .with_rect(0.0, 0.0, 100.0, 100.0);
    treemap.add_shared_listener(recorder.clone());

    let handle = treemap.compute().unwrap();
    let outcome = handle.wait_timeout(Duration::from_secs(30));
    assert_eq!(outcome, Some(Outcome::Completed));
    let layout = handle.wait().unwrap();

    let stats = layout.stats(NodeId::new(0)).unwrap();
    assert_eq!(stats.iterations, 1);
    assert!(!stats.converged);
    assert_eq!(*recorder.outcomes.lock().unwrap(), [Outcome::Completed]);
}

#[test]
fn max_iteration_policy_aborts_the_whole_computation() {
    let recorder = Arc::new(Recorder::default());
    let mut treemap = VoronoiTreemap::build(
        nested(),
        Settings::new()
            .with_max_iterations(1)
            .with_error_threshold(0.0)
            .cancel_on_max_iteration(true)
            .with_worker_count(3),
    )
    .unwrap()
    .with_rect(0.0, 0.0, 100.0, 100.0);
    treemap.add_shared_listener(recorder.clone());

    let err = treemap.compute_blocking().unwrap_err();
    assert!(matches!(
        err.abort_reason(),
        Some(AbortReason::DidNotConverge { node, .. }) if *node == NodeId::new(0)
    ));
    let outcomes = recorder.outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].is_completed());
}

// ═════════════════════════════════════════════════════════════════════════
// Leaves and single children
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn leaves_never_reach_the_solver() {
    let solver = Arc::new(Counting::default());
    let recorder = Arc::new(Recorder::default());
    let tree = TreeBuilder::new(
        vec![vec![0, 1, 2, 3], vec![1], vec![2, 4, 5], vec![3], vec![4], vec![5]],
        0,
    );
    let mut treemap = VoronoiTreemap::build(
        tree,
        Settings::new().with_max_iterations(1).with_error_threshold(0.0),
    )
    .unwrap()
    .with_rect(0.0, 0.0, 100.0, 100.0)
    .with_solver(Arc::clone(&solver));
    treemap.add_shared_listener(recorder.clone());

    let layout = treemap.compute_blocking().unwrap();
    assert_eq!(solver.calls.load(Ordering::SeqCst), 2);
    let finished: Vec<u32> = recorder.finished_nodes().into_keys().collect();
    assert_eq!(finished, [0, 2]);
    assert_eq!(layout.assigned(), 6);
}

#[test]
fn single_child_inherits_parent_polygon() {
    let layout = run(nested(), Settings::new());
    assert_eq!(
        layout.polygon(NodeId::new(3)),
        layout.polygon(NodeId::new(10))
    );
    assert!(layout.stats(NodeId::new(3)).is_none());
    assert!(layout.stats(NodeId::new(10)).is_some());
}

// ═════════════════════════════════════════════════════════════════════════
// Geometry of nested subdivisions
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn children_tile_their_parent() {
    let layout = run(nested(), Settings::new().with_worker_count(4));
    let tree = layout.tree();
    for node in tree.nodes().filter(|n| n.needs_subdivision()) {
        let parent = layout.polygon(node.id()).unwrap();
        let cells: Vec<&Polygon> = node
            .children()
            .iter()
            .map(|&c| layout.polygon(c).unwrap())
            .collect();
        let sum: f64 = cells.iter().map(|c| c.area_abs()).sum();
        assert!(
            (sum - parent.area_abs()).abs() <= 1e-6 * parent.area_abs(),
            "node {}: children {sum} vs parent {}",
            node.id(),
            parent.area_abs()
        );
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                assert!(a.intersect_convex(b).area_abs() <= 1e-6 * parent.area_abs());
            }
            assert!((a.intersect_convex(parent).area_abs() - a.area_abs()).abs() <= 1e-6 * parent.area_abs());
        }
    }
}

#[test]
fn shrunk_children_nest_inside_their_parent() {
    let shrink = 0.9;
    let layout = run(nested(), Settings::new().with_worker_count(3).with_shrink(shrink));
    let tree = layout.tree();
    for node in tree.nodes().filter(|n| n.needs_subdivision()) {
        let parent = layout.polygon(node.id()).unwrap();
        let sum: f64 = node
            .children()
            .iter()
            .map(|&c| layout.polygon(c).unwrap().area_abs())
            .sum();
        assert!(
            (sum - shrink * parent.area_abs()).abs() <= 1e-6 * parent.area_abs(),
            "node {}: children {sum} vs parent {}",
            node.id(),
            parent.area_abs()
        );
        for &c in node.children() {
            let cell = layout.polygon(c).unwrap();
            let inside = cell.intersect_convex(parent).area_abs();
            assert!((inside - cell.area_abs()).abs() <= 1e-6 * parent.area_abs());
        }
    }
    // The single child of node 3 fills its parent without shrinking.
    assert_eq!(layout.polygon(NodeId::new(10)), layout.polygon(NodeId::new(3)));
}

#[test]
fn every_node_gets_a_polygon() {
    let layout = run(nested(), Settings::new().with_worker_count(2));
    assert_eq!(layout.assigned(), 13);
    assert_eq!(layout.iter().count(), 13);
    let root = layout.polygon(NodeId::new(0)).unwrap();
    assert_eq!(root.area_abs(), 10_000.0);
}

// ═════════════════════════════════════════════════════════════════════════
// Determinism and scheduling independence
// ═════════════════════════════════════════════════════════════════════════

fn polygons(layout: &Layout, tree_len: u32) -> Vec<Polygon> {
    (0..tree_len)
        .map(|id| layout.polygon(NodeId::new(id)).unwrap().clone())
        .collect()
}

#[test]
fn fixed_seed_gives_identical_layouts() {
    let a = run(nested(), Settings::new().with_random_seed(7));
    let b = run(nested(), Settings::new().with_random_seed(7));
    assert_eq!(polygons(&a, 13), polygons(&b, 13));
}

#[test]
fn worker_count_does_not_change_the_layout() {
    let one = run(nested(), Settings::new().with_worker_count(1));
    let many = run(nested(), Settings::new().with_worker_count(4));
    for id in 0..13 {
        let (a, b) = (area(&one, id), area(&many, id));
        assert!((a - b).abs() <= 0.01 * 10_000.0, "node {id}: {a} vs {b}");
    }
    assert_eq!(polygons(&one, 13), polygons(&many, 13));
}

#[test]
fn computations_from_one_treemap_are_independent() {
    let treemap = VoronoiTreemap::build(nested(), Settings::new().with_worker_count(2))
        .unwrap()
        .with_rect(0.0, 0.0, 100.0, 100.0);
    let first = treemap.compute().unwrap();
    let second = treemap.compute().unwrap();
    let a = first.wait().unwrap();
    let b = second.wait().unwrap();
    assert_eq!(polygons(&a, 13), polygons(&b, 13));
}

// ═════════════════════════════════════════════════════════════════════════
// Completion protocol
// ═════════════════════════════════════════════════════════════════════════

#[test]
fn each_internal_node_finishes_once_and_all_finished_fires_once() {
    let recorder = Arc::new(Recorder::default());
    let tree: Tree = nested().build().unwrap();
    let internal: Vec<u32> = tree
        .nodes()
        .filter(|n| !n.is_leaf())
        .map(|n| n.id().get())
        .collect();
    let mut treemap = VoronoiTreemap::new(tree)
        .with_settings(Settings::new().with_worker_count(4))
        .with_rect(0.0, 0.0, 100.0, 100.0);
    treemap.add_shared_listener(recorder.clone());

    let handle = treemap.compute().unwrap();
    let total = treemap.tree().len();
    assert_eq!(handle.wait_timeout(Duration::from_secs(60)), Some(Outcome::Completed));
    assert_eq!(handle.processed(), total);
    assert!(handle.is_finished());
    handle.wait().unwrap();

    let counts = recorder.finished_nodes();
    assert_eq!(counts.keys().copied().collect::<Vec<_>>(), internal);
    assert!(counts.values().all(|&c| c == 1), "{counts:?}");
    assert_eq!(*recorder.outcomes.lock().unwrap(), [Outcome::Completed]);

    for (id, depth, children, areas) in recorder.nodes.lock().unwrap().iter() {
        assert_eq!(Some(*depth), treemap.tree().depth(*id));
        assert_eq!(children.as_slice(), treemap.tree().children(*id));
        assert_eq!(children.len(), areas.len());
    }
}

#[test]
fn single_node_tree_reports_completion() {
    let recorder = Arc::new(Recorder::default());
    let mut treemap = VoronoiTreemap::new(TreeBuilder::new(vec![vec![0]], 0).build().unwrap())
        .with_rect(0.0, 0.0, 1.0, 1.0);
    treemap.add_shared_listener(recorder.clone());
    let layout = treemap.compute_blocking().unwrap();
    assert_eq!(layout.assigned(), 1);
    assert!(recorder.nodes.lock().unwrap().is_empty());
    assert_eq!(*recorder.outcomes.lock().unwrap(), [Outcome::Completed]);
}
