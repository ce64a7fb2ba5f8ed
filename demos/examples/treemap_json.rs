// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Treemap from JSON.
//!
//! Load tree data and settings from JSON, lay out the tree and emit the polygons as JSON.
//!
//! Run:
//! - `cargo run -p voronoi_treemap_demos --example treemap_json`

use serde_json::json;
use voronoi_treemap::{Settings, TreeData, VoronoiTreemap};

const TREE: &str = r#"{
    "tree": [[0, 1, 2, 3], [1, 4, 5], [2], [3], [4], [5]],
    "root": 0,
    "attributes": {
        "1": { "name": "fruit" },
        "2": { "weight": 2.0, "name": "bread" },
        "3": { "weight": 1.0, "name": "cheese" },
        "4": { "weight": 3.0, "name": "apples" },
        "5": { "weight": 1.0, "name": "pears" },
        "42": { "weight": 9.0, "name": "not in the tree" }
    }
}"#;

const SETTINGS: &str = r#"{
    "maxIterations": 400,
    "errorThreshold": 0.005,
    "cancelOnMaxIteration": false,
    "cancelOnAreaErrorThreshold": true,
    "workerCount": 2,
    "randomSeed": 11,
    "explicitSeedTable": [
        { "id": 1, "x": 0.2, "y": 0.2 },
        { "id": 2, "x": 0.8, "y": 0.3 },
        { "id": 3, "x": 0.5, "y": 0.8 }
    ]
}"#;

fn main() -> voronoi_treemap::Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let data = TreeData::from_json_str(TREE)?;
    let settings = Settings::from_json_str(SETTINGS)?;
    let layout = VoronoiTreemap::build(data.builder(), settings)?
        .with_rect(0.0, 0.0, 640.0, 480.0)
        .compute_blocking()?;

    let cells: Vec<_> = layout
        .iter()
        .map(|(node, polygon)| {
            json!({
                "id": node.id(),
                "name": node.name(),
                "depth": node.depth(),
                "area": polygon.area_abs(),
                "points": polygon.vertices().iter().map(|p| [p.x, p.y]).collect::<Vec<_>>(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&json!({ "cells": cells }))?);
    Ok(())
}
