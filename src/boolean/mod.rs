// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boundary-representation boolean evaluation
//!
//! Leaves are fused onto one vertex pool, reduced to convex pieces, and
//! combined bottom-up with a classify-and-merge pass per operator. The
//! retained pieces are stitched back into a single region at the end.

mod classify;
mod evaluate;
mod piece;
mod scratch;
mod stitch;

pub use crate::csg::BooleanOp;
pub use classify::{winding_number, Classification, Solid};
pub use evaluate::{combine, evaluate};
pub use piece::{face_pieces, Piece, Split};
pub use scratch::EvalScratch;
pub use stitch::stitch;
