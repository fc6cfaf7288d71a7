// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Region-scoped fault boundary around evaluation and triangulation
//!
//! Everything that can go wrong inside one region, including a panic from
//! an internal consistency check, is turned into a [`RegionFault`] here.
//! After a fault the workspace is back at its clean baseline.

use crate::boolean::{evaluate, EvalScratch};
use crate::csg::ResolvedTree;
use crate::error::{EvaluationFault, RegionFault, TriangulationFault};
use crate::geometry::{cleanup, CleanupReport, Region, Tolerance};
use crate::tessellate::{triangulate_region, TriangulatedRegion};
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Mutable state private to one region evaluation.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub scratch: EvalScratch,
    pub model: Region,
}

impl Workspace {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            scratch: EvalScratch::new(tolerance),
            model: Region::new(),
        }
    }

    pub fn tolerance(&self) -> &Tolerance {
        self.scratch.tolerance()
    }

    /// Drop any partial result and clear the scratch tables.
    pub fn reset(&mut self) {
        self.scratch.reset();
        self.model = Region::new();
    }

    pub fn is_clean(&self) -> bool {
        self.scratch.is_clean() && self.model.is_empty() && self.model.vertices.is_empty()
    }
}

/// Result of a region that did not fault
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Mesh(TriangulatedRegion),
    /// The boolean result, after cleanup, bounds nothing.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Boolean,
    Triangulation,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn run_stages(
    ws: &mut Workspace,
    path: &str,
    tree: &ResolvedTree,
    recombine: bool,
    stage: &Cell<Stage>,
) -> Result<Evaluated, RegionFault> {
    let tolerance = *ws.tolerance();
    ws.model = evaluate(tree, &tolerance, &mut ws.scratch)?;

    let report: CleanupReport = cleanup(&mut ws.model, &tolerance);
    debug!(path, ?report, "cleanup finished");
    if ws.model.is_empty() {
        return Ok(Evaluated::Empty);
    }

    let unmatched = ws.model.unmatched_edge_uses();
    if unmatched > 0 {
        return Err(EvaluationFault::InconsistentTopology { unmatched }.into());
    }

    stage.set(Stage::Triangulation);
    let region = std::mem::take(&mut ws.model);
    Ok(Evaluated::Mesh(triangulate_region(path, region, recombine)?))
}

/// Evaluate, clean and triangulate one resolved tree inside a fault
/// boundary.
///
/// Whatever the outcome, the workspace is returned to its clean baseline,
/// so a worker can reuse it for the next region.
pub fn evaluate_region(
    ws: &mut Workspace,
    path: &str,
    tree: &ResolvedTree,
    recombine: bool,
) -> Result<Evaluated, RegionFault> {
    let stage = Cell::new(Stage::Boolean);
    let caught = panic::catch_unwind(AssertUnwindSafe(|| {
        run_stages(ws, path, tree, recombine, &stage)
    }));

    let result = caught.unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        Err(match stage.get() {
            Stage::Boolean => EvaluationFault::Panicked(message).into(),
            Stage::Triangulation => TriangulationFault::Panicked(message).into(),
        })
    });

    ws.reset();
    result
}
