// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Treemap basics.
//!
//! Build a small weighted tree, lay it out in a rectangle and print every node's area.
//!
//! Run:
//! - `cargo run -p voronoi_treemap_demos --example treemap_basics`
//! - `RUST_LOG=voronoi_treemap=debug cargo run -p voronoi_treemap_demos --example treemap_basics`

use tracing_subscriber::EnvFilter;
use voronoi_treemap::{NodeAttributes, Settings, TreeBuilder, VoronoiTreemap};

fn main() -> voronoi_treemap::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // root -> { docs, src -> { lib, tree, driver }, tests }
    let builder = TreeBuilder::new(
        vec![
            vec![0, 1, 2, 3],
            vec![1],
            vec![2, 4, 5, 6],
            vec![3],
            vec![4],
            vec![5],
            vec![6],
        ],
        0,
    )
    .attributes([
        (0, NodeAttributes::named("root")),
        (1, NodeAttributes { weight: Some(2.0), name: Some("docs".into()) }),
        (2, NodeAttributes { weight: Some(6.0), name: Some("src".into()) }),
        (3, NodeAttributes { weight: Some(3.0), name: Some("tests".into()) }),
        (4, NodeAttributes { weight: Some(1.0), name: Some("lib".into()) }),
        (5, NodeAttributes { weight: Some(3.0), name: Some("tree".into()) }),
        (6, NodeAttributes { weight: Some(2.0), name: Some("driver".into()) }),
    ]);

    let settings = Settings::new().with_available_parallelism();
    let layout = VoronoiTreemap::build(builder, settings)?
        .with_rect(0.0, 0.0, 400.0, 300.0)
        .compute_blocking()?;

    let total = 400.0 * 300.0;
    for (node, polygon) in layout.iter() {
        let indent = "  ".repeat(node.depth() as usize - 1);
        println!(
            "{indent}{:<8} vertices={:<3} area={:>9.1} ({:>5.1}% wanted {:>5.1}%)",
            node.name().unwrap_or("?"),
            polygon.len(),
            polygon.area_abs(),
            polygon.area_abs() / total * 100.0,
            node.wanted_fraction() * 100.0,
        );
    }
    println!("computed in {:?}", layout.elapsed());
    Ok(())
}
