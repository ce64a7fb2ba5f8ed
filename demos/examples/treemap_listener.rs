// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Treemap listener.
//!
//! Observe per-node progress from worker threads and wait on the handle with a timeout.
//!
//! Run:
//! - `cargo run -p voronoi_treemap_demos --example treemap_listener`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use voronoi_treemap::{
    NodeFinished, Outcome, Settings, TreeBuilder, TreemapListener, VoronoiTreemap,
};

#[derive(Default)]
struct Progress {
    finished: AtomicUsize,
}

impl TreemapListener for Progress {
    fn on_node_finished(&self, event: &NodeFinished<'_>) {
        let n = self.finished.fetch_add(1, Ordering::Relaxed) + 1;
        let areas: Vec<String> = event
            .polygons
            .iter()
            .map(|p| format!("{:.0}", p.area_abs()))
            .collect();
        let iterations = event.stats.map_or(0, |s| s.iterations);
        println!(
            "[{n:>2}] node {} depth {} -> {} children, areas [{}], {} iterations",
            event.node,
            event.depth,
            event.children.len(),
            areas.join(", "),
            iterations,
        );
    }

    fn on_all_finished(&self, outcome: &Outcome) {
        println!("all finished: {outcome:?}");
    }
}

fn main() -> voronoi_treemap::Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    // Three levels, four children each.
    let mut rows: Vec<Vec<u32>> = vec![vec![0]];
    let mut level = vec![0_u32];
    for _ in 0..3 {
        let mut next = Vec::new();
        for &parent in &level {
            for _ in 0..4 {
                let id = rows.len() as u32;
                rows.push(vec![id]);
                rows[parent as usize].push(id);
                next.push(id);
            }
        }
        level = next;
    }

    let progress = Arc::new(Progress::default());
    let settings = Settings::new().with_worker_count(4).with_random_seed(3);
    let mut treemap =
        VoronoiTreemap::build(TreeBuilder::new(rows, 0), settings)?.with_rect(0.0, 0.0, 800.0, 800.0);
    treemap.add_shared_listener(progress.clone());

    let handle = treemap.compute()?;
    while handle.wait_timeout(Duration::from_millis(5)).is_none() {
        println!("... {} of {} nodes", handle.processed(), treemap.tree().len());
    }
    let layout = handle.wait()?;
    println!(
        "{} subdivisions reported, {} polygons in {:?}",
        progress.finished.load(Ordering::Relaxed),
        layout.assigned(),
        layout.elapsed()
    );
    Ok(())
}
