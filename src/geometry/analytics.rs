// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics and statistics

use crate::tessellate::TriangulatedRegion;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Geometry statistics and analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Signed enclosed volume in cubic units
    pub volume: f64,
    /// Total surface area in square units
    pub surface_area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    /// Vertex average [x, y, z]
    pub centroid: [f64; 3],
    pub vertex_count: usize,
    /// Triangles after splitting quads
    pub triangle_count: usize,
    pub quad_count: usize,
    /// Every edge is shared by exactly two triangles
    pub is_watertight: bool,
}

impl GeometryStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: [0.0; 6],
            centroid: [0.0; 3],
            vertex_count: 0,
            triangle_count: 0,
            quad_count: 0,
            is_watertight: false,
        }
    }

    /// Pretty print statistics
    pub fn print(&self, path: &str) {
        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║ {:<56} ║", path);
        println!("╠══════════════════════════════════════════════════════════╣");
        println!("║ Volume:          {:>12.4}                            ║", self.volume);
        println!(
            "║ Surface Area:    {:>12.4}                            ║",
            self.surface_area
        );
        println!(
            "║ Bounding Box:    ({:>8.3}, {:>8.3}, {:>8.3})          ║",
            self.bbox[0], self.bbox[1], self.bbox[2]
        );
        println!(
            "║               -> ({:>8.3}, {:>8.3}, {:>8.3})          ║",
            self.bbox[3], self.bbox[4], self.bbox[5]
        );
        println!(
            "║ Vertices:        {:>12}                            ║",
            self.vertex_count
        );
        println!(
            "║ Triangles:       {:>12}                            ║",
            self.triangle_count
        );
        println!(
            "║ Quads:           {:>12}                            ║",
            self.quad_count
        );
        println!(
            "║ Watertight:      {:>12}                            ║",
            if self.is_watertight { "Yes" } else { "No" }
        );
        println!("╚══════════════════════════════════════════════════════════╝");
    }
}

/// Analyze a triangulated region and compute statistics
pub fn analyze(region: &TriangulatedRegion) -> GeometryStats {
    if region.vertices.is_empty() || region.facets.is_empty() {
        return GeometryStats::empty();
    }

    let bbox = region.bounding_box();
    let mut volume = 0.0;
    let mut triangle_count = 0;
    region.for_each_triangle(|tri, _| {
        volume += tri[0].coords.dot(&tri[1].coords.cross(&tri[2].coords)) / 6.0;
        triangle_count += 1;
    });

    GeometryStats {
        volume,
        surface_area: region.surface_area(),
        bbox: [
            bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z,
        ],
        centroid: calculate_centroid(region),
        vertex_count: region.vertices.len(),
        triangle_count,
        quad_count: region.quad_count(),
        is_watertight: check_watertight(region),
    }
}

fn calculate_centroid(region: &TriangulatedRegion) -> [f64; 3] {
    let sum = region
        .vertices
        .iter()
        .fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords);
    let c = sum / region.vertices.len() as f64;
    [c.x, c.y, c.z]
}

/// Every undirected edge of the facet boundaries is used exactly twice.
fn check_watertight(region: &TriangulatedRegion) -> bool {
    let mut edge_count: AHashMap<(usize, usize), usize> = AHashMap::new();

    for facet in &region.facets {
        let indices = facet.indices();
        for i in 0..indices.len() {
            let v1 = indices[i];
            let v2 = indices[(i + 1) % indices.len()];
            let edge = if v1 < v2 { (v1, v2) } else { (v2, v1) };
            *edge_count.entry(edge).or_insert(0) += 1;
        }
    }

    edge_count.values().all(|&count| count == 2)
}
