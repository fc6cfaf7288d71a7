// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use facetize::convert::{evaluate_region, Workspace};
use facetize::csg::{CsgTree, Fragment, LeafRef, ResolvedTree};
use facetize::geometry::{Primitive, TessellationTolerance, Tolerance};
use facetize::io::MeshCollector;
use facetize::tessellate::triangulate_region;
use facetize::{convert, ConversionConfig, MemoryDatabase, Selector};
use nalgebra::{Matrix4, Point3, Vector3};

fn block() -> Primitive {
    Primitive::cuboid(Point3::origin(), Point3::new(10.0, 10.0, 10.0))
}

fn rod() -> Primitive {
    Primitive::cylinder(Point3::new(5.0, 5.0, -1.0), Vector3::new(0.0, 0.0, 12.0), 3.0)
}

fn ball() -> Primitive {
    Primitive::sphere(Point3::new(9.0, 8.5, 8.0), 4.0)
}

fn leaf(name: &str, shape: Primitive) -> ResolvedTree {
    CsgTree::leaf(Fragment {
        name: name.to_string(),
        region: shape.to_region(&TessellationTolerance::default()).unwrap(),
    })
}

fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");

    group.bench_function("box", |b| {
        let tol = TessellationTolerance::default();
        b.iter(|| black_box(block()).to_region(&tol).unwrap());
    });

    for relative in [0.01, 0.001] {
        let tol = TessellationTolerance {
            relative,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("sphere", relative), &tol, |b, tol| {
            b.iter(|| black_box(ball()).to_region(tol).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("cylinder", relative), &tol, |b, tol| {
            b.iter(|| black_box(rod()).to_region(tol).unwrap());
        });
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    let offset = Primitive::cuboid(Point3::new(8.0, 2.0, 2.0), Point3::new(18.0, 12.0, 12.0));
    let cases = [
        ("union", leaf("block", block()).union(leaf("offset", offset))),
        ("drilled", leaf("block", block()).subtract(leaf("rod", rod()))),
        ("cut_corner", leaf("block", block()).subtract(leaf("ball", ball()))),
        (
            "chain",
            leaf("block", block())
                .subtract(leaf("rod", rod()))
                .union(leaf("ball", ball())),
        ),
    ];

    for (name, tree) in &cases {
        group.bench_with_input(BenchmarkId::new("region", name), tree, |b, tree| {
            let mut ws = Workspace::new(Tolerance::default());
            b.iter(|| evaluate_region(&mut ws, "bench", black_box(tree), false).unwrap());
        });
    }

    group.finish();
}

fn bench_triangulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("triangulate");

    let sphere = ball().to_region(&TessellationTolerance::default()).unwrap();
    for recombine in [false, true] {
        group.bench_with_input(
            BenchmarkId::new("sphere", recombine),
            &recombine,
            |b, &recombine| {
                b.iter(|| triangulate_region("bench", black_box(sphere.clone()), recombine).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");

    let mut db = MemoryDatabase::new(TessellationTolerance::default());
    db.insert_solid("block", block());
    db.insert_solid("rod", rod());
    db.insert_solid("ball", ball());
    for i in 0..16 {
        let shift = Matrix4::new_translation(&Vector3::new(20.0 * i as f64, 0.0, 0.0));
        db.insert_assembly(
            &format!("part{i}"),
            CsgTree::leaf(LeafRef::placed("block", shift))
                .subtract(CsgTree::leaf(LeafRef::placed("rod", shift)))
                .subtract(CsgTree::leaf(LeafRef::placed("ball", shift))),
        );
    }

    for parallel in [false, true] {
        let config = ConversionConfig {
            parallel,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("parts", parallel), &config, |b, config| {
            b.iter(|| {
                let sink = MeshCollector::new();
                convert(&db, &Selector::All, config, &sink).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_primitives,
    bench_evaluate,
    bench_triangulate,
    bench_convert
);
criterion_main!(benches);
