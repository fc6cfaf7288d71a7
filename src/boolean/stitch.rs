// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Re-stitching retained pieces into one boundary
//!
//! Kept pieces are fused onto a fresh pool at round-off precision, then
//! every edge that passes through another pool vertex is subdivided there.
//! Pieces cut by different operators meet at such T-junctions; subdividing
//! gives every edge-use a mate again. Identifying vertices within the
//! distance tolerance is left to cleanup.

use super::piece::Piece;
use crate::geometry::fuse::{remap_loop, split_t_junctions};
use crate::geometry::{Face, Loop, Region, Shell, VertexFuser};

pub fn stitch(pieces: &[Piece], snap: f64) -> Region {
    let mut fuser = VertexFuser::new(snap);
    let mut loops = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let indices: Vec<usize> = piece.points.iter().map(|p| fuser.insert(*p)).collect();
        let fused = remap_loop(&indices, |v| v);
        if fused.len() >= 3 {
            loops.push((fused, piece.plane));
        }
    }

    let vertices = fuser.into_points();
    let mut used: Vec<usize> = loops.iter().flat_map(|(l, _)| l.iter().copied()).collect();
    used.sort_unstable();
    used.dedup();

    let faces = loops
        .into_iter()
        .map(|(l, plane)| {
            Face::new(
                plane,
                Loop::new(split_t_junctions(&l, &used, &vertices, snap)),
            )
        })
        .collect::<Vec<_>>();

    let mut region = Region {
        vertices,
        shells: if faces.is_empty() {
            Vec::new()
        } else {
            vec![Shell::new(faces)]
        },
    };
    region.rebuild_shells();
    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Plane;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_t_junction_is_split() {
        let plane = Plane::new(Vector3::z(), 0.0);
        let big = Piece::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            plane,
        );
        // two pieces below sharing the midpoint (1, 0, 0) of the big piece's edge
        let left = Piece::new(
            vec![
                Point3::new(0.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
            ],
            plane,
        );
        let right = Piece::new(
            vec![
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(2.0, -1.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
            plane,
        );

        let region = stitch(&[big, left, right], 1e-10);

        let big_face = region
            .faces()
            .find(|f| f.outer.len() == 5)
            .expect("big face gains the junction vertex");
        assert_eq!(region.face_count(), 3);
        assert_eq!(region.shells.len(), 1);
        assert_eq!(big_face.outer.len(), 5);
    }

    fn tetrahedron(shift: f64) -> Vec<Piece> {
        let plane = Plane::new(Vector3::z(), 0.0);
        let o = Point3::origin();
        let (x, y, z) = (
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        );
        let moved = x + Vector3::new(shift, 0.0, 0.0);
        vec![
            Piece::new(vec![o, y, x], plane),
            Piece::new(vec![o, x, z], plane),
            Piece::new(vec![o, z, y], plane),
            Piece::new(vec![moved, y, z], plane),
        ]
    }

    #[test]
    fn test_round_off_copies_share_a_vertex() {
        let region = stitch(&tetrahedron(1e-14), 1e-10);
        assert_eq!(region.vertices.len(), 4);
        assert!(region.is_closed());
    }

    #[test]
    fn test_tolerance_scale_gaps_left_for_cleanup() {
        let region = stitch(&tetrahedron(1e-4), 1e-10);
        assert_eq!(region.vertices.len(), 5);
        assert!(!region.is_closed());
    }

    #[test]
    fn test_no_pieces_no_shells() {
        let region = stitch(&[], 1e-10);
        assert!(region.is_empty());
        assert!(region.shells.is_empty());
    }
}
