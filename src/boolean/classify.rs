// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Piece refinement and inside/outside/on classification
//!
//! Pieces of one operand are first cut so that none of them crosses the
//! other operand's boundary. Each piece is then classified by a single
//! interior sample: coplanar overlap decides the on-boundary cases, the
//! generalized winding number decides inside against outside.

use super::piece::{Piece, Split};
use super::EvalScratch;
use crate::error::EvaluationFault;
use crate::geometry::{BoundingBox, Plane, Side, Tolerance};
use nalgebra::Point3;
use std::f64::consts::PI;

/// Winding numbers further than this from an integer mean the sample sits
/// on (or numerically too close to) the other operand's surface.
const WINDING_SLACK: f64 = 0.2;

/// Position of a piece relative to the other operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Inside,
    Outside,
    /// On the boundary, facing the same way as the other operand's face
    OnSame,
    /// On the boundary, facing the opposite way
    OnOpposite,
}

/// Boolean operand: a closed set of convex pieces.
///
/// A complemented solid denotes everything except the volume its pieces
/// enclose; its pieces face inward.
#[derive(Debug, Clone, Default)]
pub struct Solid {
    pub pieces: Vec<Piece>,
    pub complemented: bool,
}

impl Solid {
    pub fn new(pieces: Vec<Piece>) -> Self {
        Self {
            pieces,
            complemented: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bbox(&self) -> BoundingBox {
        self.pieces
            .iter()
            .fold(BoundingBox::empty(), |acc, p| acc.union(&p.bbox))
    }

    pub fn complement(mut self) -> Self {
        for piece in &mut self.pieces {
            piece.flip();
        }
        self.complemented = !self.complemented;
        self
    }

    /// Whether `point` lies inside, by winding number. Fails when the
    /// winding number does not settle near an integer.
    pub fn contains(&self, point: &Point3<f64>) -> Result<bool, EvaluationFault> {
        let w = winding_number(point, &self.pieces);
        if (w - w.round()).abs() > WINDING_SLACK {
            return Err(EvaluationFault::ClassificationDiverged { winding: w });
        }
        Ok((w.abs() > 0.5) != self.complemented)
    }
}

/// Generalized winding number of a closed surface about `point`, summing
/// the solid angles of the pieces' fan triangles.
pub fn winding_number(point: &Point3<f64>, pieces: &[Piece]) -> f64 {
    let mut total = 0.0;
    for piece in pieces {
        let Some((&first, rest)) = piece.points.split_first() else {
            continue;
        };
        let a = first - point;
        let la = a.norm();
        for pair in rest.windows(2) {
            let b = pair[0] - point;
            let c = pair[1] - point;
            let (lb, lc) = (b.norm(), c.norm());

            let det = a.dot(&b.cross(&c));
            if det.abs() <= 1e-12 * la * lb * lc {
                continue;
            }
            let denom = la * lb * lc + a.dot(&b) * lc + a.dot(&c) * lb + b.dot(&c) * la;
            total += 2.0 * det.atan2(denom);
        }
    }
    total / (4.0 * PI)
}

fn inside_convex(piece: &Piece, point: &Point3<f64>, epsilon: f64) -> bool {
    let n = piece.points.len();
    (0..n).all(|k| {
        let q0 = piece.points[k];
        let q1 = piece.points[(k + 1) % n];
        match Plane::through(&q0, (q1 - q0).cross(&piece.plane.normal)) {
            Some(side) => side.distance(point) <= epsilon,
            None => true,
        }
    })
}

/// Classify a refined piece against the other operand.
pub fn classify(
    piece: &Piece,
    other: &Solid,
    tolerance: &Tolerance,
) -> Result<Classification, EvaluationFault> {
    let eps = tolerance.epsilon();
    let sample = piece.centroid();

    for face in &other.pieces {
        if !face.bbox.intersects(&piece.bbox, eps) {
            continue;
        }
        let cos = piece.plane.normal.dot(&face.plane.normal);
        if tolerance.is_parallel(cos)
            && face.plane.distance(&sample).abs() <= eps
            && inside_convex(face, &sample, eps)
        {
            return Ok(if cos > 0.0 {
                Classification::OnSame
            } else {
                Classification::OnOpposite
            });
        }
    }

    Ok(if other.contains(&sample)? {
        Classification::Inside
    } else {
        Classification::Outside
    })
}

/// Whether every vertex of `piece` lies strictly on one side of `plane`.
fn strictly_one_side(piece: &Piece, plane: &Plane, epsilon: f64) -> bool {
    let mut sides = piece.points.iter().map(|p| plane.side(p, epsilon));
    match sides.next() {
        Some(Side::Front) => sides.all(|s| s == Side::Front),
        Some(Side::Back) => sides.all(|s| s == Side::Back),
        _ => false,
    }
}

/// Cut a coplanar piece along the edges of convex `face`: parts outside
/// the face are emitted as they fall off, the part inside is emitted last.
fn clip_coplanar(piece: Piece, face: &Piece, epsilon: f64, out: &mut Vec<Piece>) -> usize {
    let mut splits = 0;
    let mut rest = piece;
    let n = face.points.len();
    for k in 0..n {
        let q0 = face.points[k];
        let q1 = face.points[(k + 1) % n];
        let Some(side) = Plane::through(&q0, (q1 - q0).cross(&face.plane.normal)) else {
            continue;
        };
        match rest.split(&side, epsilon) {
            Split::Whole(p, Side::Front) => {
                out.push(p);
                return splits;
            }
            Split::Whole(p, _) => rest = p,
            Split::Cut { front, back } => {
                splits += 1;
                out.extend(front);
                match back {
                    Some(b) => rest = b,
                    None => return splits,
                }
            }
        }
    }
    out.push(rest);
    splits
}

/// Cut `pieces` until none crosses the boundary of `other`.
pub fn refine(
    pieces: &[Piece],
    other: &Solid,
    tolerance: &Tolerance,
    scratch: &mut EvalScratch,
) -> Vec<Piece> {
    let eps = tolerance.epsilon();
    let snap = scratch.snap();
    let mut current = pieces.to_vec();

    // Coincidence within `distance` decides coplanarity; cuts use the snap
    // distance.
    for face in &other.pieces {
        let mut next = Vec::with_capacity(current.len());
        for piece in current {
            if !piece.bbox.intersects(&face.bbox, eps) {
                next.push(piece);
                continue;
            }

            let (near_front, near_back) = piece.extent(&face.plane, eps);
            if !near_front && !near_back {
                let cos = piece.plane.normal.dot(&face.plane.normal);
                if tolerance.is_parallel(cos) {
                    scratch.splits += clip_coplanar(piece, face, snap, &mut next);
                } else {
                    next.push(piece);
                }
                continue;
            }

            let (front, back) = piece.extent(&face.plane, snap);
            if front && back && !strictly_one_side(face, &piece.plane, snap) {
                let plane = face.plane;
                match piece.split(&plane, snap) {
                    Split::Whole(p, _) => next.push(p),
                    Split::Cut { front, back } => {
                        scratch.splits += 1;
                        next.extend(front);
                        next.extend(back);
                    }
                }
                continue;
            }

            next.push(piece);
        }
        current = next;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;

    fn cube_solid(min: [f64; 3], max: [f64; 3]) -> Solid {
        let region = Primitive::cuboid(Point3::from(min), Point3::from(max))
            .to_region(&Default::default())
            .unwrap();
        let pieces = region
            .faces()
            .map(|f| Piece::new(f.outer.points(&region.vertices), f.plane))
            .collect();
        Solid::new(pieces)
    }

    #[test]
    fn test_winding_number_of_cube() {
        let cube = cube_solid([0.0; 3], [1.0; 3]);
        assert_relative_eq!(
            winding_number(&Point3::new(0.5, 0.5, 0.5), &cube.pieces),
            1.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            winding_number(&Point3::new(3.0, 0.5, 0.5), &cube.pieces),
            0.0,
            epsilon = 1e-9
        );
        // in the plane of a face, outside the cube
        assert_relative_eq!(
            winding_number(&Point3::new(-0.5, 0.0, 0.5), &cube.pieces),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_complement_inverts_containment() {
        let cube = cube_solid([0.0; 3], [1.0; 3]).complement();
        assert!(!cube.contains(&Point3::new(0.5, 0.5, 0.5)).unwrap());
        assert!(cube.contains(&Point3::new(5.0, 0.5, 0.5)).unwrap());
    }

    #[test]
    fn test_sample_on_surface_diverges() {
        let cube = cube_solid([0.0; 3], [1.0; 3]);
        assert!(matches!(
            cube.contains(&Point3::new(0.5, 0.5, 1.0)),
            Err(EvaluationFault::ClassificationDiverged { .. })
        ));
    }

    #[test]
    fn test_refine_and_classify_overlapping_cubes() {
        let tol = Tolerance::default();
        let mut scratch = EvalScratch::new(tol);
        let a = cube_solid([0.0; 3], [1.0; 3]);
        let b = cube_solid([0.5, 0.0, 0.0], [1.5, 1.0, 1.0]);

        let refined = refine(&a.pieces, &b, &tol, &mut scratch);
        assert!(scratch.splits > 0);

        let total: f64 = refined.iter().map(Piece::area).sum();
        assert_relative_eq!(total, 6.0, epsilon = 1e-9);

        let mut areas = [0.0; 4];
        for piece in &refined {
            let slot = match classify(piece, &b, &tol).unwrap() {
                Classification::Inside => 0,
                Classification::Outside => 1,
                Classification::OnSame => 2,
                Classification::OnOpposite => 3,
            };
            areas[slot] += piece.area();
        }
        // the x = 1 face is inside, half of each side face is shared
        assert_relative_eq!(areas[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(areas[1], 3.0, epsilon = 1e-9);
        assert_relative_eq!(areas[2], 2.0, epsilon = 1e-9);
        assert_relative_eq!(areas[3], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_touching_cubes_classify_opposite() {
        let tol = Tolerance::default();
        let a = cube_solid([0.0; 3], [1.0; 3]);
        let b = cube_solid([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);

        let shared = a
            .pieces
            .iter()
            .find(|p| p.plane.normal.x > 0.5)
            .unwrap();
        assert_eq!(
            classify(shared, &b, &tol).unwrap(),
            Classification::OnOpposite
        );
    }
}
