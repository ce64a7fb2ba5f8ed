// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use voronoi_treemap::{Settings, TreeBuilder, VoronoiTreemap};

/// A complete tree with `fanout` children per internal node and `depth` levels below the
/// root. Weights cycle through 1..=4.
fn gen_tree(fanout: u32, depth: u32) -> TreeBuilder {
    let mut rows: Vec<Vec<u32>> = vec![vec![0]];
    let mut level = vec![0_u32];
    for _ in 0..depth {
        let mut next = Vec::new();
        for &parent in &level {
            for _ in 0..fanout {
                let id = rows.len() as u32;
                rows.push(vec![id]);
                rows[parent as usize].push(id);
                next.push(id);
            }
        }
        level = next;
    }
    let n = rows.len() as u32;
    let mut builder = TreeBuilder::new(rows, 0);
    for id in 1..n {
        builder = builder.weight(id, f64::from(id % 4 + 1));
    }
    builder
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("treemap");
    group.sample_size(20);
    for &(fanout, depth) in &[(4_u32, 2_u32), (3, 4)] {
        for &workers in &[1_usize, 4] {
            let settings = Settings::new()
                .with_worker_count(workers)
                .with_max_iterations(200);
            let treemap = VoronoiTreemap::build(gen_tree(fanout, depth), settings)
                .map(|t| t.with_rect(0.0, 0.0, 1000.0, 1000.0));
            let Ok(treemap) = treemap else {
                continue;
            };
            group.throughput(Throughput::Elements(treemap.tree().len() as u64));
            group.bench_function(
                format!("compute_f{}_d{}_w{}", fanout, depth, workers),
                |b| b.iter(|| black_box(treemap.compute_blocking())),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_compute);
criterion_main!(benches);
