// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Facetize
//!
//! Evaluates CSG assemblies of named solids into boundary representations,
//! cleans them, and triangulates them for exporters. Each top-level region
//! is evaluated inside its own fault boundary, so one bad region never
//! stops a batch.

pub mod boolean;
pub mod cli;
pub mod config;
pub mod convert;
pub mod csg;
pub mod db;
pub mod error;
pub mod geometry;
pub mod io;
pub mod tessellate;

pub use config::ConversionConfig;
pub use convert::{convert, ConversionRun, Converter, RunSummary};
pub use csg::{AssemblyTree, BooleanOp, CsgTree, LeafRef, RegionOutcome, TreeClient};
pub use db::{MemoryDatabase, ObjectDatabase, Selector};
pub use error::{ConfigError, EvaluationFault, RegionFault, ResolveError, TriangulationFault};
pub use geometry::{Primitive, Region, Tolerance};
pub use tessellate::TriangulatedRegion;

use anyhow::Result;
use io::MeshCollector;
use std::path::Path;

/// Convert every top-level object of a scene file with default settings
/// and return the resulting meshes, sorted by path.
pub fn convert_scene(path: impl AsRef<Path>) -> Result<(Vec<TriangulatedRegion>, RunSummary)> {
    let config = ConversionConfig::default();
    let db = MemoryDatabase::load(path, config.tessellation_tolerance())?;
    let collector = MeshCollector::new();
    let run = convert(&db, &Selector::All, &config, &collector)?;
    Ok((collector.into_regions(), run.summary))
}
