// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bottom-up reduction of a resolved CSG tree to one region

use super::classify::{classify, refine, Classification, Solid};
use super::piece::face_pieces;
use super::stitch::stitch;
use super::EvalScratch;
use crate::csg::{BooleanOp, Node, NodeId, ResolvedTree};
use crate::error::EvaluationFault;
use crate::geometry::{count_unmatched, fuse::remap_loop, Face, Loop, Tolerance};
use tracing::debug;

/// What to do with a classified piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keep {
    Drop,
    Keep,
    Flip,
}

/// Truth table for pieces of the left (`from_left`) or right operand.
fn keep(op: BooleanOp, from_left: bool, class: Classification) -> Keep {
    use Classification::*;
    match (op, from_left, class) {
        (BooleanOp::Union, true, Outside | OnSame) => Keep::Keep,
        (BooleanOp::Union, false, Outside) => Keep::Keep,
        (BooleanOp::Intersect, true, Inside | OnSame) => Keep::Keep,
        (BooleanOp::Intersect, false, Inside) => Keep::Keep,
        (BooleanOp::Subtract, true, Outside | OnOpposite) => Keep::Keep,
        (BooleanOp::Subtract, false, Inside) => Keep::Flip,
        (BooleanOp::Xor, _, Outside) => Keep::Keep,
        (BooleanOp::Xor, _, Inside) => Keep::Flip,
        _ => Keep::Drop,
    }
}

fn complemented(op: BooleanOp, a: bool, b: bool) -> bool {
    match op {
        BooleanOp::Union => a || b,
        BooleanOp::Intersect => a && b,
        BooleanOp::Subtract => a && !b,
        BooleanOp::Xor => a != b,
    }
}

/// Apply one boolean operator to two evaluated operands.
pub fn combine(
    op: BooleanOp,
    a: Solid,
    b: Solid,
    tolerance: &Tolerance,
    scratch: &mut EvalScratch,
) -> Result<Solid, EvaluationFault> {
    let eps = tolerance.epsilon();

    if !a.complemented && !b.complemented && !a.bbox().intersects(&b.bbox(), eps) {
        return Ok(match op {
            BooleanOp::Union | BooleanOp::Xor => {
                let mut pieces = a.pieces;
                pieces.extend(b.pieces);
                Solid::new(pieces)
            }
            BooleanOp::Intersect => Solid::empty(),
            BooleanOp::Subtract => a,
        });
    }

    let left = refine(&a.pieces, &b, tolerance, scratch);
    let right = refine(&b.pieces, &a, tolerance, scratch);

    let mut kept = Vec::with_capacity(left.len() + right.len());
    for (pieces, other, from_left) in [(left, &b, true), (right, &a, false)] {
        for mut piece in pieces {
            let class = classify(&piece, other, tolerance)?;
            scratch.classified += 1;
            match keep(op, from_left, class) {
                Keep::Drop => {}
                Keep::Keep => kept.push(piece),
                Keep::Flip => {
                    piece.flip();
                    kept.push(piece);
                }
            }
        }
    }

    Ok(Solid {
        pieces: kept,
        complemented: complemented(op, a.complemented, b.complemented),
    })
}

/// Fuse every leaf onto the scratch vertex pool and reduce it to pieces.
fn fuse_leaves(
    tree: &ResolvedTree,
    scratch: &mut EvalScratch,
) -> Result<Vec<Option<Solid>>, EvaluationFault> {
    let mut solids: Vec<Option<Solid>> = vec![None; tree.len()];

    for (id, fragment) in tree.leaves() {
        let region = &fragment.region;
        let map: Vec<usize> = region
            .vertices
            .iter()
            .map(|p| scratch.fuser.insert(*p))
            .collect();

        let faces: Vec<Face> = region
            .faces()
            .filter_map(|face| {
                let outer = remap_loop(&face.outer.vertices, |v| map[v]);
                (outer.len() >= 3).then(|| {
                    let holes = face
                        .holes
                        .iter()
                        .map(|h| remap_loop(&h.vertices, |v| map[v]))
                        .filter(|h| h.len() >= 3)
                        .map(Loop::new)
                        .collect();
                    Face::with_holes(face.plane, Loop::new(outer), holes)
                })
            })
            .collect();

        let unmatched = count_unmatched(faces.iter().flat_map(|f| f.edge_uses()));
        if unmatched > 0 {
            return Err(EvaluationFault::OpenShell {
                leaf: fragment.name.clone(),
                unmatched,
            });
        }

        let pool = scratch.fuser.points();
        let mut pieces = Vec::new();
        for (index, face) in faces.iter().enumerate() {
            pieces.extend(face_pieces(index, face, pool).map_err(EvaluationFault::Decomposition)?);
        }
        solids[id.index()] = Some(Solid::new(pieces));
    }

    let scale = scratch
        .fuser
        .points()
        .iter()
        .map(|p| p.coords.amax())
        .fold(0.0, f64::max);
    scratch.set_scale(scale);
    Ok(solids)
}

fn reduce(
    tree: &ResolvedTree,
    id: NodeId,
    leaves: &mut [Option<Solid>],
    tolerance: &Tolerance,
    scratch: &mut EvalScratch,
) -> Result<Solid, EvaluationFault> {
    match tree.node(id) {
        Node::Leaf(_) => Ok(leaves[id.index()].take().unwrap_or_default()),
        Node::Nop => Ok(Solid::empty()),
        Node::Guard(child) => reduce(tree, *child, leaves, tolerance, scratch),
        Node::Not(child) => Ok(reduce(tree, *child, leaves, tolerance, scratch)?.complement()),
        node => {
            let Some((op, l, r)) = node.as_binary() else {
                return Ok(Solid::empty());
            };
            let a = reduce(tree, l, leaves, tolerance, scratch)?;
            let b = reduce(tree, r, leaves, tolerance, scratch)?;
            combine(op, a, b, tolerance, scratch)
        }
    }
}

/// Evaluate a resolved tree into raw (uncleaned) boundary pieces and stitch
/// them into a region.
pub fn evaluate(
    tree: &ResolvedTree,
    tolerance: &Tolerance,
    scratch: &mut EvalScratch,
) -> Result<crate::geometry::Region, EvaluationFault> {
    let mut leaves = fuse_leaves(tree, scratch)?;
    let solid = reduce(tree, tree.root(), &mut leaves, tolerance, scratch)?;
    if solid.complemented {
        return Err(EvaluationFault::Unbounded);
    }

    let region = stitch(&solid.pieces, scratch.snap());
    debug!(
        pieces = solid.pieces.len(),
        splits = scratch.splits,
        classified = scratch.classified,
        faces = region.face_count(),
        "boolean evaluation finished"
    );
    Ok(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csg::{CsgTree, Fragment};
    use crate::geometry::{Primitive, Region};
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn cube(name: &str, min: [f64; 3], max: [f64; 3]) -> ResolvedTree {
        CsgTree::leaf(Fragment {
            name: name.to_string(),
            region: Primitive::cuboid(Point3::from(min), Point3::from(max))
                .to_region(&Default::default())
                .unwrap(),
        })
    }

    fn run(tree: &ResolvedTree) -> Result<Region, EvaluationFault> {
        let tol = Tolerance::default();
        let mut scratch = EvalScratch::new(tol);
        evaluate(tree, &tol, &mut scratch)
    }

    #[test]
    fn test_truth_table() {
        use Classification::*;
        assert_eq!(keep(BooleanOp::Union, true, OnSame), Keep::Keep);
        assert_eq!(keep(BooleanOp::Union, false, OnSame), Keep::Drop);
        assert_eq!(keep(BooleanOp::Subtract, false, Inside), Keep::Flip);
        assert_eq!(keep(BooleanOp::Subtract, true, OnSame), Keep::Drop);
        assert_eq!(keep(BooleanOp::Xor, false, Inside), Keep::Flip);
        assert_eq!(keep(BooleanOp::Xor, true, OnOpposite), Keep::Drop);
    }

    #[test]
    fn test_single_leaf_passes_through() {
        let region = run(&cube("a", [0.0; 3], [1.0; 3])).unwrap();
        assert_eq!(region.face_count(), 6);
        assert!(region.is_closed());
        assert_relative_eq!(region.volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_overlapping_union() {
        let tree = cube("a", [0.0; 3], [1.0; 3]).union(cube("b", [0.5, 0.0, 0.0], [1.5, 1.0, 1.0]));
        let region = run(&tree).unwrap();

        assert!(region.is_closed());
        assert_relative_eq!(region.surface_area(), 8.0, epsilon = 1e-9);
        assert_relative_eq!(region.volume(), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_subtract_and_intersect_volumes() {
        let a = || cube("a", [0.0; 3], [2.0; 3]);
        let b = || cube("b", [1.0; 3], [3.0; 3]);

        let diff = run(&a().subtract(b())).unwrap();
        assert!(diff.is_closed());
        assert_relative_eq!(diff.volume(), 7.0, epsilon = 1e-9);

        let both = run(&a().intersect(b())).unwrap();
        assert!(both.is_closed());
        assert_relative_eq!(both.volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_xor_volume() {
        let tree = cube("a", [0.0; 3], [2.0; 3]).xor(cube("b", [1.0; 3], [3.0; 3]));
        let region = run(&tree).unwrap();
        assert!(region.is_closed());
        assert_relative_eq!(region.volume(), 14.0, epsilon = 1e-9);
    }

    #[test]
    fn test_not_intersect_is_subtract() {
        let tree = cube("a", [0.0; 3], [2.0; 3]).intersect(cube("b", [1.0; 3], [3.0; 3]).not());
        let region = run(&tree).unwrap();
        assert_relative_eq!(region.volume(), 7.0, epsilon = 1e-9);
    }

    #[test]
    fn test_top_level_not_is_unbounded() {
        let tree = cube("a", [0.0; 3], [1.0; 3]).not();
        assert_eq!(run(&tree).unwrap_err(), EvaluationFault::Unbounded);
    }

    #[test]
    fn test_disjoint_shortcuts() {
        let a = || cube("a", [0.0; 3], [1.0; 3]);
        let b = || cube("b", [5.0; 3], [6.0; 3]);

        assert_eq!(run(&a().union(b())).unwrap().shells.len(), 2);
        assert!(run(&a().intersect(b())).unwrap().is_empty());
        assert_relative_eq!(run(&a().subtract(b())).unwrap().volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_open_leaf_is_a_fault() {
        let mut open = Primitive::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .to_region(&Default::default())
            .unwrap();
        open.shells[0].faces.pop();
        let tree = CsgTree::leaf(Fragment {
            name: "open".into(),
            region: open,
        });

        assert_eq!(
            run(&tree).unwrap_err(),
            EvaluationFault::OpenShell {
                leaf: "open".into(),
                unmatched: 4
            }
        );
    }
}
