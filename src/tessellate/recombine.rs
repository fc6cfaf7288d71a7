// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Quad recombination
//!
//! Consecutive triangles in emission order are merged into one quad when
//! their normals agree and they share exactly one edge walked in opposite
//! directions. The shared edge is found through a fixed table of edge
//! pairings and the first matching entry decides, so the output depends
//! only on emission order.

use super::Facet;
use nalgebra::{Point3, Vector3};

/// Maximum `1 - cos` between the normals of two merged triangles.
pub const QUAD_NORMAL_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pairing {
    /// `a[i] -> a[i+1]` equals `b[j+1] -> b[j]`: consistent orientation
    Reversed,
    /// `a[i] -> a[i+1]` equals `b[j] -> b[j+1]`: the pair disagrees on orientation
    Same,
}

/// `(edge of a, edge of b, pairing)`, tested in order.
const EDGE_PAIRINGS: [(usize, usize, Pairing); 18] = [
    (0, 0, Pairing::Reversed),
    (0, 0, Pairing::Same),
    (0, 1, Pairing::Reversed),
    (0, 1, Pairing::Same),
    (0, 2, Pairing::Reversed),
    (0, 2, Pairing::Same),
    (1, 0, Pairing::Reversed),
    (1, 0, Pairing::Same),
    (1, 1, Pairing::Reversed),
    (1, 1, Pairing::Same),
    (1, 2, Pairing::Reversed),
    (1, 2, Pairing::Same),
    (2, 0, Pairing::Reversed),
    (2, 0, Pairing::Same),
    (2, 1, Pairing::Reversed),
    (2, 1, Pairing::Same),
    (2, 2, Pairing::Reversed),
    (2, 2, Pairing::Same),
];

fn unit_normal(tri: &[usize; 3], pool: &[Point3<f64>]) -> Option<Vector3<f64>> {
    let n = (pool[tri[1]] - pool[tri[0]]).cross(&(pool[tri[2]] - pool[tri[0]]));
    let len = n.norm();
    (len > 0.0).then(|| n / len)
}

/// Merge `b` into `a` if they form a quad.
fn merge_pair(a: &[usize; 3], b: &[usize; 3], pool: &[Point3<f64>]) -> Option<[usize; 4]> {
    let shared = a.iter().filter(|v| b.contains(v)).count();
    if shared != 2 {
        return None;
    }

    let (na, nb) = (unit_normal(a, pool)?, unit_normal(b, pool)?);
    if 1.0 - na.dot(&nb) > QUAD_NORMAL_TOLERANCE {
        return None;
    }

    for &(i, j, pairing) in &EDGE_PAIRINGS {
        let (a0, a1) = (a[i], a[(i + 1) % 3]);
        let (b0, b1) = (b[j], b[(j + 1) % 3]);
        match pairing {
            Pairing::Reversed if a0 == b1 && a1 == b0 => {
                return Some([a0, b[(j + 2) % 3], a1, a[(i + 2) % 3]]);
            }
            Pairing::Same if a0 == b0 && a1 == b1 => return None,
            _ => {}
        }
    }
    None
}

/// Walk triangles in emission order, merging each eligible consecutive pair.
pub fn recombine_quads(triangles: &[[usize; 3]], pool: &[Point3<f64>]) -> Vec<Facet> {
    let mut facets = Vec::with_capacity(triangles.len());
    let mut i = 0;
    while i < triangles.len() {
        if let Some(next) = triangles.get(i + 1) {
            if let Some(quad) = merge_pair(&triangles[i], next, pool) {
                facets.push(Facet::Quad(quad));
                i += 2;
                continue;
            }
        }
        facets.push(Facet::Triangle(triangles[i]));
        i += 1;
    }
    facets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn test_square_merges() {
        let facets = recombine_quads(&[[0, 1, 2], [0, 2, 3]], &pool());
        assert_eq!(facets, vec![Facet::Quad([2, 3, 0, 1])]);
    }

    #[test]
    fn test_quad_keeps_area_orientation() {
        let pool = pool();
        let Facet::Quad(q) = recombine_quads(&[[0, 1, 2], [0, 2, 3]], &pool)[0] else {
            panic!("expected quad");
        };
        let normal = crate::geometry::newell_normal(q.iter().map(|&i| &pool[i]));
        assert_eq!(normal, Vector3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_inconsistent_orientation_rejected() {
        let facets = recombine_quads(&[[0, 1, 2], [0, 3, 2]], &pool());
        assert!(facets.iter().all(|f| !f.is_quad()));
    }

    #[test]
    fn test_bent_pair_rejected() {
        let facets = recombine_quads(&[[0, 1, 2], [1, 4, 2]], &pool());
        assert_eq!(facets.len(), 2);
    }

    #[test]
    fn test_only_consecutive_pairs_merge() {
        // [0,1,2] and [0,2,3] are separated by an unrelated triangle
        let facets = recombine_quads(&[[0, 1, 2], [1, 4, 2], [0, 2, 3]], &pool());
        assert_eq!(facets.len(), 3);
        assert!(facets.iter().all(|f| !f.is_quad()));
    }

    #[test]
    fn test_deterministic() {
        let tris = [[0, 1, 2], [0, 2, 3], [1, 4, 2], [0, 1, 2]];
        assert_eq!(
            recombine_quads(&tris, &pool()),
            recombine_quads(&tris, &pool())
        );
    }
}
