// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-region scratch state for boolean evaluation

use crate::geometry::{Tolerance, VertexFuser};

/// Working tables owned by exactly one region evaluation.
///
/// Leaf vertices are fused onto the shared pool at the distance tolerance.
/// Split points are matched later at `snap`, which only absorbs round-off.
#[derive(Debug, Clone)]
pub struct EvalScratch {
    tolerance: Tolerance,
    snap: f64,
    pub fuser: VertexFuser,
    pub splits: usize,
    pub classified: usize,
}

impl EvalScratch {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            tolerance,
            snap: tolerance.snap(1.0),
            fuser: VertexFuser::new(tolerance.epsilon()),
            splits: 0,
            classified: 0,
        }
    }

    pub fn tolerance(&self) -> &Tolerance {
        &self.tolerance
    }

    pub fn snap(&self) -> f64 {
        self.snap
    }

    /// Size the snap distance for coordinates reaching `scale`.
    pub fn set_scale(&mut self, scale: f64) {
        self.snap = self.tolerance.snap(scale);
    }

    /// Return to the clean baseline a fresh evaluation expects.
    pub fn reset(&mut self) {
        self.fuser = VertexFuser::new(self.tolerance.epsilon());
        self.snap = self.tolerance.snap(1.0);
        self.splits = 0;
        self.classified = 0;
    }

    pub fn is_clean(&self) -> bool {
        self.fuser.is_empty() && self.splits == 0 && self.classified == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_reset_restores_baseline() {
        let mut scratch = EvalScratch::new(Tolerance::default());
        assert!(scratch.is_clean());

        scratch.fuser.insert(Point3::new(1.0, 2.0, 3.0));
        scratch.set_scale(1e6);
        scratch.splits = 4;
        assert!(!scratch.is_clean());

        scratch.reset();
        assert!(scratch.is_clean());
        assert_eq!(scratch.snap(), Tolerance::default().snap(1.0));
    }

    #[test]
    fn test_zero_distance_pool_fuses_within_floor() {
        let mut scratch = EvalScratch::new(Tolerance::new(0.0).unwrap());
        let a = scratch.fuser.insert(Point3::new(1.0, 2.0, 3.0));
        let b = scratch.fuser.insert(Point3::new(1.0, 2.0, 3.0 + 1e-12));
        assert_eq!(a, b);
    }
}
