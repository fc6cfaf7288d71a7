// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangulation keeps area and quad recombination is reproducible

use approx::assert_relative_eq;
use facetize::boolean::{evaluate, EvalScratch};
use facetize::csg::{CsgTree, Fragment, ResolvedTree};
use facetize::geometry::{
    cleanup, Face, Loop, Plane, Primitive, Region, Shell, TessellationTolerance, Tolerance,
};
use facetize::tessellate::triangulate_region;
use nalgebra::{Point3, Vector3};

fn leaf(name: &str, shape: Primitive) -> ResolvedTree {
    CsgTree::leaf(Fragment {
        name: name.to_string(),
        region: shape.to_region(&TessellationTolerance::default()).unwrap(),
    })
}

fn drilled_block() -> Region {
    let block = Primitive::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
    let rod = Primitive::cylinder(Point3::new(0.5, 0.5, -0.5), Vector3::new(0.0, 0.0, 2.0), 0.3);
    let tree = leaf("block", block).subtract(leaf("rod", rod));

    let tol = Tolerance::default();
    let mut scratch = EvalScratch::new(tol);
    let mut region = evaluate(&tree, &tol, &mut scratch).unwrap();
    cleanup(&mut region, &tol);
    region
}

fn washer() -> Region {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(5.0, 0.0, 0.0),
        Point3::new(5.0, 3.0, 0.0),
        Point3::new(0.0, 3.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(1.0, 2.0, 0.0),
        Point3::new(2.0, 2.0, 0.0),
        Point3::new(2.0, 1.0, 0.0),
        Point3::new(3.0, 1.0, 0.0),
        Point3::new(3.0, 2.0, 0.0),
        Point3::new(4.0, 2.0, 0.0),
        Point3::new(4.0, 1.0, 0.0),
    ];
    let plane = Plane::from_polygon(&vertices[0..4]).unwrap();
    let face = Face::with_holes(
        plane,
        Loop::new(vec![0, 1, 2, 3]),
        vec![Loop::new(vec![4, 5, 6, 7]), Loop::new(vec![8, 9, 10, 11])],
    );
    Region {
        vertices,
        shells: vec![Shell::new(vec![face])],
    }
}

#[test]
fn test_triangulation_preserves_area() {
    let sphere = Primitive::sphere(Point3::new(0.2, -0.4, 1.0), 1.5)
        .to_region(&TessellationTolerance::default())
        .unwrap();

    for region in [sphere, drilled_block(), washer()] {
        let expected = region.surface_area();
        let mesh = triangulate_region("area", region, false).unwrap();
        assert!(mesh.triangle_count() > 0);
        assert_relative_eq!(mesh.surface_area(), expected, max_relative = 1e-9);
    }
}

#[test]
fn test_washer_triangle_count() {
    // 12 vertices and two holes: n + 2h - 2 triangles
    let mesh = triangulate_region("washer", washer(), false).unwrap();
    assert_eq!(mesh.triangle_count(), 14);
    assert_relative_eq!(mesh.surface_area(), 13.0, epsilon = 1e-12);
}

#[test]
fn test_recombination_is_deterministic() {
    let first = triangulate_region("drilled", drilled_block(), true).unwrap();
    let second = triangulate_region("drilled", drilled_block(), true).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_recombination_keeps_surface() {
    let plain = triangulate_region("drilled", drilled_block(), false).unwrap();
    let merged = triangulate_region("drilled", drilled_block(), true).unwrap();

    assert!(merged.quad_count() > 0);
    assert!(merged.facets.len() < plain.facets.len());
    assert_eq!(merged.triangle_count(), plain.triangle_count());
    assert_relative_eq!(merged.surface_area(), plain.surface_area(), max_relative = 1e-12);
}
