// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boundary representation of an evaluated region
//!
//! A region owns a vertex pool and a list of shells. Each shell owns its
//! faces; each face is an outer loop plus optional hole loops, and each
//! loop is a cyclic list of vertex indices. Edge-uses are the consecutive
//! vertex pairs of a loop. In a closed region every edge-use `a -> b` has
//! a mate `b -> a`.

use super::plane::newell_normal;
use super::{BoundingBox, Plane};
use ahash::AHashMap;
use nalgebra::{Matrix4, Point3};
use serde::{Deserialize, Serialize};

/// Index into a region's vertex pool
pub type VertexIndex = usize;

/// One oriented use of an edge by a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeUse {
    pub from: VertexIndex,
    pub to: VertexIndex,
}

impl EdgeUse {
    pub fn mate(&self) -> EdgeUse {
        EdgeUse {
            from: self.to,
            to: self.from,
        }
    }
}

/// Number of edge-uses in `edges` without a reversed mate.
pub fn count_unmatched(edges: impl Iterator<Item = EdgeUse>) -> usize {
    let mut balance: AHashMap<(VertexIndex, VertexIndex), i64> = AHashMap::new();
    for eu in edges {
        if eu.from < eu.to {
            *balance.entry((eu.from, eu.to)).or_insert(0) += 1;
        } else {
            *balance.entry((eu.to, eu.from)).or_insert(0) -= 1;
        }
    }
    balance.values().map(|b| b.unsigned_abs() as usize).sum()
}

/// Cyclic list of vertex indices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Loop {
    pub vertices: Vec<VertexIndex>,
}

impl Loop {
    pub fn new(vertices: Vec<VertexIndex>) -> Self {
        Self { vertices }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn edge_uses(&self) -> impl Iterator<Item = EdgeUse> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| EdgeUse {
            from: self.vertices[i],
            to: self.vertices[(i + 1) % n],
        })
    }

    /// Signed area along `normal` (positive when counter-clockwise about it).
    pub fn signed_area(&self, pool: &[Point3<f64>], normal: &nalgebra::Vector3<f64>) -> f64 {
        newell_normal(self.vertices.iter().map(|&i| &pool[i])).dot(normal) * 0.5
    }

    pub fn points(&self, pool: &[Point3<f64>]) -> Vec<Point3<f64>> {
        self.vertices.iter().map(|&i| pool[i]).collect()
    }
}

/// Planar face bounded by an outer loop with optional holes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub plane: Plane,
    pub outer: Loop,
    pub holes: Vec<Loop>,
}

impl Face {
    pub fn new(plane: Plane, outer: Loop) -> Self {
        Self {
            plane,
            outer,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(plane: Plane, outer: Loop, holes: Vec<Loop>) -> Self {
        Self {
            plane,
            outer,
            holes,
        }
    }

    pub fn loops(&self) -> impl Iterator<Item = &Loop> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    pub fn edge_uses(&self) -> impl Iterator<Item = EdgeUse> + '_ {
        self.loops().flat_map(|l| l.edge_uses())
    }

    /// Face area: outer loop minus holes.
    pub fn area(&self, pool: &[Point3<f64>]) -> f64 {
        self.loops()
            .map(|l| l.signed_area(pool, &self.plane.normal))
            .sum::<f64>()
            .abs()
    }

    /// Largest vertex index used, if any.
    pub fn max_index(&self) -> Option<VertexIndex> {
        self.loops().flat_map(|l| l.vertices.iter().copied()).max()
    }
}

/// Connected set of faces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shell {
    pub faces: Vec<Face>,
}

impl Shell {
    pub fn new(faces: Vec<Face>) -> Self {
        Self { faces }
    }
}

/// Boundary-representation region: vertex pool plus shells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub vertices: Vec<Point3<f64>>,
    pub shells: Vec<Shell>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a single-shell region from polygon index lists.
    ///
    /// Polygons whose plane cannot be computed (fewer than three distinct
    /// points, zero area) are dropped.
    pub fn from_polygons(vertices: Vec<Point3<f64>>, polygons: Vec<Vec<VertexIndex>>) -> Self {
        let faces = polygons
            .into_iter()
            .filter_map(|indices| {
                let points: Vec<_> = indices.iter().map(|&i| vertices[i]).collect();
                let plane = Plane::from_polygon(&points)?;
                Some(Face::new(plane, Loop::new(indices)))
            })
            .collect::<Vec<_>>();

        let shells = if faces.is_empty() {
            Vec::new()
        } else {
            vec![Shell::new(faces)]
        };
        Self { vertices, shells }
    }

    pub fn is_empty(&self) -> bool {
        self.shells.iter().all(|s| s.faces.is_empty())
    }

    pub fn add_vertex(&mut self, point: Point3<f64>) -> VertexIndex {
        self.vertices.push(point);
        self.vertices.len() - 1
    }

    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.shells.iter().flat_map(|s| s.faces.iter())
    }

    pub fn face_count(&self) -> usize {
        self.shells.iter().map(|s| s.faces.len()).sum()
    }

    pub fn edge_uses(&self) -> impl Iterator<Item = EdgeUse> + '_ {
        self.faces().flat_map(|f| f.edge_uses())
    }

    /// Number of edge-uses that have no reversed mate.
    pub fn unmatched_edge_uses(&self) -> usize {
        count_unmatched(self.edge_uses())
    }

    pub fn is_closed(&self) -> bool {
        self.unmatched_edge_uses() == 0
    }

    /// Apply a placement matrix. Mirroring placements reverse every loop so
    /// faces keep pointing outward.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in &mut self.vertices {
            *vertex = matrix.transform_point(vertex);
        }

        let mirrored = matrix.fixed_view::<3, 3>(0, 0).determinant() < 0.0;
        for shell in &mut self.shells {
            for face in &mut shell.faces {
                if mirrored {
                    face.outer.vertices.reverse();
                    for hole in &mut face.holes {
                        hole.vertices.reverse();
                    }
                }
                let points = face.outer.points(&self.vertices);
                if let Some(plane) = Plane::from_polygon(&points) {
                    face.plane = plane;
                }
            }
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for face in self.faces() {
            for l in face.loops() {
                for &i in &l.vertices {
                    bbox.expand_to_include(&self.vertices[i]);
                }
            }
        }
        bbox
    }

    pub fn surface_area(&self) -> f64 {
        self.faces().map(|f| f.area(&self.vertices)).sum()
    }

    /// Enclosed volume by the divergence theorem; negative for inside-out shells.
    pub fn volume(&self) -> f64 {
        self.faces()
            .map(|f| {
                let area: f64 = f
                    .loops()
                    .map(|l| l.signed_area(&self.vertices, &f.plane.normal))
                    .sum();
                f.plane.offset * area / 3.0
            })
            .sum()
    }

    /// Regroup faces into shells by edge connectivity.
    pub fn rebuild_shells(&mut self) {
        let faces: Vec<Face> = self.shells.drain(..).flat_map(|s| s.faces).collect();
        if faces.is_empty() {
            return;
        }

        let mut parent: Vec<usize> = (0..faces.len()).collect();
        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        let mut edge_owner: AHashMap<(VertexIndex, VertexIndex), usize> = AHashMap::new();
        for (fi, face) in faces.iter().enumerate() {
            for eu in face.edge_uses() {
                let key = (eu.from.min(eu.to), eu.from.max(eu.to));
                match edge_owner.get(&key) {
                    Some(&other) => {
                        let (a, b) = (find(&mut parent, fi), find(&mut parent, other));
                        if a != b {
                            parent[a] = b;
                        }
                    }
                    None => {
                        edge_owner.insert(key, fi);
                    }
                }
            }
        }

        let mut shell_of_root: AHashMap<usize, usize> = AHashMap::new();
        for (fi, face) in faces.into_iter().enumerate() {
            let root = find(&mut parent, fi);
            let shell = *shell_of_root.entry(root).or_insert_with(|| {
                self.shells.push(Shell::default());
                self.shells.len() - 1
            });
            self.shells[shell].faces.push(face);
        }
    }

    /// Drop vertices no loop references and renumber the rest, keeping
    /// their relative order. Returns the number removed.
    pub fn compact_vertices(&mut self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for face in self.faces() {
            for l in face.loops() {
                for &v in &l.vertices {
                    used[v] = true;
                }
            }
        }

        let mut remap = vec![0; self.vertices.len()];
        let mut kept = Vec::with_capacity(self.vertices.len());
        for (i, point) in self.vertices.iter().enumerate() {
            if used[i] {
                remap[i] = kept.len();
                kept.push(*point);
            }
        }

        for shell in &mut self.shells {
            for face in &mut shell.faces {
                for l in std::iter::once(&mut face.outer).chain(face.holes.iter_mut()) {
                    for v in &mut l.vertices {
                        *v = remap[*v];
                    }
                }
            }
        }

        let removed = self.vertices.len() - kept.len();
        self.vertices = kept;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn unit_cube() -> Region {
        Primitive::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .to_region(&Default::default())
            .unwrap()
    }

    #[test]
    fn test_cube_is_closed() {
        let cube = unit_cube();
        assert!(cube.is_closed());
        assert_eq!(cube.face_count(), 6);
        assert_relative_eq!(cube.surface_area(), 6.0, epsilon = 1e-12);
        assert_relative_eq!(cube.volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_face_leaves_unmatched_edges() {
        let mut cube = unit_cube();
        cube.shells[0].faces.pop();
        assert_eq!(cube.unmatched_edge_uses(), 4);
    }

    #[test]
    fn test_mirror_keeps_outward_orientation() {
        let mut cube = unit_cube();
        let mirror = Matrix4::new_nonuniform_scaling(&Vector3::new(-1.0, 1.0, 1.0));
        cube.transform(&mirror);
        assert!(cube.is_closed());
        assert_relative_eq!(cube.volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rebuild_shells_splits_components() {
        let a = unit_cube();
        let mut b = unit_cube();
        b.transform(&Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0)));

        let offset = a.vertices.len();
        let mut merged = a.clone();
        merged.vertices.extend_from_slice(&b.vertices);
        for mut face in b.shells[0].faces.clone() {
            for v in &mut face.outer.vertices {
                *v += offset;
            }
            merged.shells[0].faces.push(face);
        }

        merged.rebuild_shells();
        assert_eq!(merged.shells.len(), 2);
        assert!(merged.is_closed());
    }

    #[test]
    fn test_compact_vertices() {
        let mut cube = unit_cube();
        cube.add_vertex(Point3::new(9.0, 9.0, 9.0));
        assert_eq!(cube.compact_vertices(), 1);
        assert_eq!(cube.vertices.len(), 8);
        assert!(cube.is_closed());
    }
}
