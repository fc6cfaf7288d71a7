// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error taxonomy for a conversion run
//!
//! Leaf resolution failures and region faults are recoverable and never
//! leave the fault boundary; configuration errors are fatal and surface
//! before any region is processed.

use thiserror::Error;

/// Failure to turn a named object into a boundary fragment.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("cannot tessellate {name}: {reason}")]
    Tessellation { name: String, reason: String },

    #[error("reference cycle through {0}")]
    Cycle(String),
}

/// Structural problem in a CSG node arena.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("root {root} is outside the arena of {len} nodes")]
    BadRoot { root: usize, len: usize },

    #[error("node {node} refers to child {child}, which does not precede it")]
    BadChild { node: usize, child: usize },
}

/// Boolean evaluation could not produce a consistent boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationFault {
    #[error("shell of {leaf} is not closed: {unmatched} edge-uses without a mate")]
    OpenShell { leaf: String, unmatched: usize },

    #[error("classification did not converge (winding number {winding:.4})")]
    ClassificationDiverged { winding: f64 },

    #[error("boolean result has {unmatched} edge-uses without a mate")]
    InconsistentTopology { unmatched: usize },

    #[error("region evaluates to an unbounded solid")]
    Unbounded,

    #[error("cannot decompose operand face: {0}")]
    Decomposition(TriangulationFault),

    #[error("internal consistency violation: {0}")]
    Panicked(String),
}

/// Triangulation hit an internal index inconsistency.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TriangulationFault {
    #[error("face {face} references vertex {index} but the pool holds {pool}")]
    IndexOutOfBounds {
        face: usize,
        index: usize,
        pool: usize,
    },

    #[error("polygon triangulation failed on face {face}: {reason}")]
    Earcut { face: usize, reason: String },

    #[error("internal consistency violation: {0}")]
    Panicked(String),
}

/// Any fault that aborts a single region.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegionFault {
    #[error("boolean evaluation failed: {0}")]
    Evaluation(#[from] EvaluationFault),

    #[error("triangulation failed: {0}")]
    Triangulation(#[from] TriangulationFault),
}

impl RegionFault {
    /// Whether the boolean stage completed before the fault.
    pub fn booleaned(&self) -> bool {
        matches!(self, RegionFault::Triangulation(_))
    }
}

/// Invalid configuration, reported before any work begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("distance tolerance must not be negative (got {0})")]
    NegativeDistance(f64),

    #[error("{field} must be finite (got {value})")]
    NonFinite { field: &'static str, value: f64 },

    #[error("relative tolerance must lie in [0, 1) (got {0})")]
    RelativeOutOfRange(f64),

    #[error("normal tolerance must lie in [0, pi) radians (got {0})")]
    NormalOutOfRange(f64),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot start worker pool: {0}")]
    ThreadPool(String),
}
