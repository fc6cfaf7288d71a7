// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangulation of evaluated regions and the output mesh handed to exporters

mod recombine;
mod triangulate;

pub use recombine::{recombine_quads, QUAD_NORMAL_TOLERANCE};
pub use triangulate::{face_triangles, region_triangles, triangulate_region, RegionTriangles};

use crate::geometry::BoundingBox;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// One output facet, referencing the region's vertex pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facet {
    Triangle([usize; 3]),
    /// Two coplanar triangles merged back into one quadrilateral
    Quad([usize; 4]),
}

impl Facet {
    pub fn indices(&self) -> &[usize] {
        match self {
            Facet::Triangle(t) => t,
            Facet::Quad(q) => q,
        }
    }

    pub fn is_quad(&self) -> bool {
        matches!(self, Facet::Quad(_))
    }
}

/// Triangulated boundary of one region, ready for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangulatedRegion {
    pub path: String,
    pub vertices: Vec<Point3<f64>>,
    pub facets: Vec<Facet>,
}

impl TriangulatedRegion {
    pub fn empty(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            vertices: Vec::new(),
            facets: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Visit every facet in emission order. Quads pass four points with
    /// `is_quad = true`; triangles pass three.
    pub fn for_each_facet(&self, mut visit: impl FnMut(&[Point3<f64>], bool)) {
        let mut points = [Point3::origin(); 4];
        for facet in &self.facets {
            let indices = facet.indices();
            for (slot, &i) in points.iter_mut().zip(indices) {
                *slot = self.vertices[i];
            }
            visit(&points[..indices.len()], facet.is_quad());
        }
    }

    /// Visit every triangle in emission order, splitting quads along their
    /// first diagonal. `is_quad` tells the visitor both halves came from one quad.
    pub fn for_each_triangle(&self, mut visit: impl FnMut(&[Point3<f64>; 3], bool)) {
        for facet in &self.facets {
            match *facet {
                Facet::Triangle([a, b, c]) => {
                    visit(&[self.vertices[a], self.vertices[b], self.vertices[c]], false)
                }
                Facet::Quad([a, b, c, d]) => {
                    visit(&[self.vertices[a], self.vertices[b], self.vertices[c]], true);
                    visit(&[self.vertices[a], self.vertices[c], self.vertices[d]], true);
                }
            }
        }
    }

    /// Triangles after splitting quads.
    pub fn triangle_count(&self) -> usize {
        self.facets
            .iter()
            .map(|f| if f.is_quad() { 2 } else { 1 })
            .sum()
    }

    pub fn quad_count(&self) -> usize {
        self.facets.iter().filter(|f| f.is_quad()).count()
    }

    pub fn surface_area(&self) -> f64 {
        let mut area = 0.0;
        self.for_each_triangle(|t, _| {
            area += (t[1] - t[0]).cross(&(t[2] - t[0])).norm() * 0.5;
        });
        area
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.facets.iter().flat_map(|f| {
            f.indices().iter().map(move |&i| &self.vertices[i])
        }))
    }
}
