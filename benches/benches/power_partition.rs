// Copyright 2025 the Voronoi Treemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Point;
use voronoi_cells::{CellSolver, Polygon, PowerDiagram, Site};

/// Sites on a jittered grid with alternating weights.
fn gen_sites(clip: &Polygon, n: usize) -> Vec<Site> {
    let side = (n as f64).sqrt().ceil() as usize;
    (0..n)
        .map(|i| {
            let gx = (i % side) as f64;
            let gy = (i / side) as f64;
            let jitter = ((i * 7919) % 97) as f64 / 97.0 * 0.3;
            let rel = Point::new((gx + 0.35 + jitter) / side as f64, (gy + 0.5) / side as f64);
            let weight = if i % 2 == 0 { 40.0 } else { 10.0 };
            Site::new(clip.relative_point(rel), weight, 1.0 / n as f64)
        })
        .collect()
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("power_diagram");
    let clip = Polygon::from_xywh(0.0, 0.0, 1000.0, 1000.0);
    for &n in &[4_usize, 16, 64] {
        let sites = gen_sites(&clip, n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("partition_rect_n{}", n), |b| {
            b.iter(|| {
                let part = PowerDiagram.partition(black_box(&clip), black_box(&sites));
                black_box(part)
            });
        });
    }

    // Clip against an irregular convex cell, as nested subdivisions do.
    let outer = gen_sites(&clip, 5);
    let cell = PowerDiagram.partition(&clip, &outer).map(|p| p.cells[2].clone());
    if let Ok(cell) = cell {
        let sites = gen_sites(&cell, 16);
        group.bench_function("partition_cell_n16", |b| {
            b.iter(|| black_box(PowerDiagram.partition(black_box(&cell), black_box(&sites))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_partition);
criterion_main!(benches);
