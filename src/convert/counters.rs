// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Run-wide conversion counters

use crate::csg::RegionOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Append-only counters shared by every region of a run.
#[derive(Debug, Default)]
pub struct ConversionCounters {
    attempted: AtomicUsize,
    booleaned: AtomicUsize,
    triangulated: AtomicUsize,
    nothing_remains: AtomicUsize,
    skipped: AtomicUsize,
    faulted: AtomicUsize,
}

impl ConversionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// A leaf failed to resolve and was dropped from its tree.
    pub fn leaf_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Account for one finished region.
    pub fn record(&self, outcome: &RegionOutcome) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
        match outcome {
            RegionOutcome::Converted(_) | RegionOutcome::Empty => {
                self.booleaned.fetch_add(1, Ordering::Relaxed);
                self.triangulated.fetch_add(1, Ordering::Relaxed);
            }
            RegionOutcome::NothingRemains => {
                self.nothing_remains.fetch_add(1, Ordering::Relaxed);
            }
            RegionOutcome::Faulted(fault) => {
                if fault.booleaned() {
                    self.booleaned.fetch_add(1, Ordering::Relaxed);
                }
                self.faulted.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            attempted: self.attempted.load(Ordering::Relaxed),
            booleaned: self.booleaned.load(Ordering::Relaxed),
            triangulated: self.triangulated.load(Ordering::Relaxed),
            nothing_remains: self.nothing_remains.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            faulted: self.faulted.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of the counters at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub attempted: usize,
    pub booleaned: usize,
    pub triangulated: usize,
    /// Regions whose tree lost every leaf before evaluation
    pub nothing_remains: usize,
    pub skipped: usize,
    pub faulted: usize,
}

impl RunSummary {
    /// Regions that made it all the way through triangulation.
    pub fn succeeded(&self) -> usize {
        self.triangulated
    }

    pub fn is_clean(&self) -> bool {
        self.faulted == 0 && self.skipped == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempted, {} booleaned, {} triangulated, {} nothing remains, {} leaves skipped, {} faulted",
            self.attempted,
            self.booleaned,
            self.triangulated,
            self.nothing_remains,
            self.skipped,
            self.faulted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvaluationFault, RegionFault, TriangulationFault};

    #[test]
    fn test_outcomes_advance_the_right_counters() {
        let counters = ConversionCounters::new();
        counters.record(&RegionOutcome::Empty);
        counters.record(&RegionOutcome::NothingRemains);
        counters.record(&RegionOutcome::Faulted(RegionFault::Evaluation(
            EvaluationFault::Unbounded,
        )));
        counters.record(&RegionOutcome::Faulted(RegionFault::Triangulation(
            TriangulationFault::Panicked("boom".into()),
        )));
        counters.leaf_skipped();

        let summary = counters.summary();
        assert_eq!(
            summary,
            RunSummary {
                attempted: 4,
                booleaned: 2,
                triangulated: 1,
                nothing_remains: 1,
                skipped: 1,
                faulted: 2,
            }
        );
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_summary_line() {
        let summary = RunSummary {
            attempted: 5,
            booleaned: 4,
            triangulated: 4,
            nothing_remains: 0,
            skipped: 0,
            faulted: 1,
        };
        assert_eq!(
            summary.to_string(),
            "5 attempted, 4 booleaned, 4 triangulated, 0 nothing remains, 0 leaves skipped, 1 faulted"
        );

        let hollow = RunSummary {
            attempted: 1,
            nothing_remains: 1,
            skipped: 2,
            ..Default::default()
        };
        assert_eq!(
            hollow.to_string(),
            "1 attempted, 0 booleaned, 0 triangulated, 1 nothing remains, 2 leaves skipped, 0 faulted"
        );
    }
}
