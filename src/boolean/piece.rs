// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Convex planar pieces: the unit the classifier works on
//!
//! Every operand face is reduced to convex pieces before classification.
//! Convex faces without holes stay whole; other faces are cut into
//! triangles. Pieces are split against the other operand until none of
//! them crosses its boundary, so a single sample point classifies the
//! whole piece.

use crate::error::TriangulationFault;
use crate::geometry::{BoundingBox, Face, Plane, Side};
use crate::tessellate::face_triangles;
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub points: Vec<Point3<f64>>,
    pub plane: Plane,
    pub bbox: BoundingBox,
}

/// Result of cutting a piece with a plane.
#[derive(Debug)]
pub enum Split {
    /// The piece lies on one side (or on the plane); it is returned unchanged.
    Whole(Piece, Side),
    /// The piece crosses the plane.
    Cut {
        front: Option<Piece>,
        back: Option<Piece>,
    },
}

impl Piece {
    pub fn new(points: Vec<Point3<f64>>, plane: Plane) -> Self {
        let bbox = BoundingBox::from_points(&points);
        Self {
            points,
            plane,
            bbox,
        }
    }

    fn from_parts(points: Vec<Point3<f64>>, plane: Plane) -> Option<Self> {
        (points.len() >= 3).then(|| Self::new(points, plane))
    }

    pub fn flip(&mut self) {
        self.points.reverse();
        self.plane = self.plane.flipped();
    }

    /// Vertex average; interior for any non-degenerate convex piece.
    pub fn centroid(&self) -> Point3<f64> {
        let sum = self
            .points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.points.len() as f64)
    }

    pub fn area(&self) -> f64 {
        crate::geometry::newell_normal(self.points.iter()).norm() * 0.5
    }

    /// Which sides of `plane` the piece's vertices reach.
    pub fn extent(&self, plane: &Plane, epsilon: f64) -> (bool, bool) {
        let mut front = false;
        let mut back = false;
        for p in &self.points {
            match plane.side(p, epsilon) {
                Side::Front => front = true,
                Side::Back => back = true,
                Side::On => {}
            }
        }
        (front, back)
    }

    pub fn split(self, plane: &Plane, epsilon: f64) -> Split {
        let distances: Vec<f64> = self.points.iter().map(|p| plane.distance(p)).collect();
        let side = |d: f64| {
            if d > epsilon {
                Side::Front
            } else if d < -epsilon {
                Side::Back
            } else {
                Side::On
            }
        };

        let has_front = distances.iter().any(|&d| side(d) == Side::Front);
        let has_back = distances.iter().any(|&d| side(d) == Side::Back);
        match (has_front, has_back) {
            (true, false) => return Split::Whole(self, Side::Front),
            (false, true) => return Split::Whole(self, Side::Back),
            (false, false) => return Split::Whole(self, Side::On),
            (true, true) => {}
        }

        let n = self.points.len();
        let mut front = Vec::with_capacity(n + 1);
        let mut back = Vec::with_capacity(n + 1);
        for i in 0..n {
            let j = (i + 1) % n;
            let (si, sj) = (side(distances[i]), side(distances[j]));
            let (vi, vj) = (self.points[i], self.points[j]);

            if si != Side::Back {
                front.push(vi);
            }
            if si != Side::Front {
                back.push(vi);
            }
            if (si == Side::Front && sj == Side::Back) || (si == Side::Back && sj == Side::Front) {
                let v = crossing((vi, distances[i]), (vj, distances[j]));
                front.push(v);
                back.push(v);
            }
        }

        Split::Cut {
            front: Self::from_parts(front, self.plane),
            back: Self::from_parts(back, self.plane),
        }
    }
}

/// Where an edge crosses a plane, given each end's signed distance.
///
/// Ends are taken in lexicographic order, so pieces walking a shared edge
/// in opposite directions get bit-identical points.
fn crossing(a: (Point3<f64>, f64), b: (Point3<f64>, f64)) -> Point3<f64> {
    let (from, to) = if (a.0.x, a.0.y, a.0.z) <= (b.0.x, b.0.y, b.0.z) {
        (a, b)
    } else {
        (b, a)
    };
    let t = from.1 / (from.1 - to.1);
    from.0 + (to.0 - from.0) * t
}

/// Whether a loop of points is convex about `normal` (collinear runs allowed).
fn is_convex(points: &[Point3<f64>], normal: &Vector3<f64>) -> bool {
    let n = points.len();
    (0..n).all(|i| {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let turn = (b - a).cross(&(c - b)).dot(normal);
        turn >= -1e-12 * (b - a).norm() * (c - b).norm()
    })
}

/// Reduce a face to convex pieces.
pub fn face_pieces(
    face_index: usize,
    face: &Face,
    pool: &[Point3<f64>],
) -> Result<Vec<Piece>, TriangulationFault> {
    if face.holes.is_empty() {
        let points = face.outer.points(pool);
        if points.len() >= 3 && is_convex(&points, &face.plane.normal) {
            return Ok(vec![Piece::new(points, face.plane)]);
        }
    }

    Ok(face_triangles(face_index, face, pool)?
        .into_iter()
        .map(|t| Piece::new(t.iter().map(|&i| pool[i]).collect(), face.plane))
        .collect())
}
