// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Conversion driver: walk, evaluate, triangulate, export

mod counters;
mod isolation;

pub use counters::{ConversionCounters, RunSummary};
pub use isolation::{evaluate_region, Evaluated, Workspace};

use crate::config::ConversionConfig;
use crate::csg::{RegionOutcome, RegionReport, ResolvedTree, TreeClient, TreeWalker, WalkOptions};
use crate::db::{ObjectDatabase, Selector};
use crate::error::{ConfigError, ResolveError};
use crate::geometry::{Region, Tolerance};
use crate::io::ExportSink;
use nalgebra::Matrix4;

/// Tree client that evaluates each region and hands the mesh to a sink.
pub struct Converter<'a, D: ObjectDatabase> {
    db: &'a D,
    sink: &'a dyn ExportSink,
    tolerance: Tolerance,
    recombine_quads: bool,
}

impl<'a, D: ObjectDatabase> Converter<'a, D> {
    pub fn new(db: &'a D, sink: &'a dyn ExportSink, tolerance: Tolerance) -> Self {
        Self {
            db,
            sink,
            tolerance,
            recombine_quads: false,
        }
    }

    pub fn with_recombine_quads(mut self, recombine: bool) -> Self {
        self.recombine_quads = recombine;
        self
    }

    pub fn database(&self) -> &'a D {
        self.db
    }
}

impl<D: ObjectDatabase> TreeClient for Converter<'_, D> {
    fn leaf(&self, name: &str, placement: &Matrix4<f64>) -> Result<Region, ResolveError> {
        self.db.resolve_leaf(name, placement)
    }

    fn region_end(&self, path: &str, tree: ResolvedTree) -> RegionOutcome {
        if tree.is_nop() {
            return RegionOutcome::NothingRemains;
        }

        let mut workspace = Workspace::new(self.tolerance);
        match evaluate_region(&mut workspace, path, &tree, self.recombine_quads) {
            Ok(Evaluated::Mesh(mesh)) => {
                let report = RegionReport {
                    path: path.to_string(),
                    vertices: mesh.vertices.len(),
                    triangles: mesh.triangle_count(),
                    quads: mesh.quad_count(),
                    surface_area: mesh.surface_area(),
                };
                self.sink.accept(mesh);
                RegionOutcome::Converted(report)
            }
            Ok(Evaluated::Empty) => RegionOutcome::Empty,
            Err(fault) => RegionOutcome::Faulted(fault),
        }
    }
}

/// Per-region outcomes, in request order, and the final counters
#[derive(Debug, Clone)]
pub struct ConversionRun {
    pub outcomes: Vec<(String, RegionOutcome)>,
    pub summary: RunSummary,
}

impl ConversionRun {
    pub fn outcome(&self, path: &str) -> Option<&RegionOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, outcome)| outcome)
    }
}

/// Walk `names` with any tree client under the run settings of `config`.
pub fn run_walk<D: ObjectDatabase, C: TreeClient>(
    db: &D,
    client: &C,
    names: &[String],
    config: &ConversionConfig,
) -> Result<ConversionRun, ConfigError> {
    config.validate()?;

    let counters = ConversionCounters::new();
    let options = WalkOptions {
        parallel: config.parallel,
        parallel_subtrees: config.parallel_subtrees,
    };
    let walk = || {
        TreeWalker::new(db, client, &counters)
            .with_options(options)
            .walk(names)
    };

    let outcomes = match config.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?
            .install(walk),
        None => walk(),
    };

    Ok(ConversionRun {
        outcomes,
        summary: counters.summary(),
    })
}

/// Convert the selected top-level objects of `db`, sending meshes to `sink`.
///
/// The sink is not finished; call [`ExportSink::finish`] once all runs
/// feeding it are done.
pub fn convert<D: ObjectDatabase>(
    db: &D,
    selector: &Selector,
    config: &ConversionConfig,
    sink: &dyn ExportSink,
) -> Result<ConversionRun, ConfigError> {
    config.validate()?;
    let converter =
        Converter::new(db, sink, config.tolerance()?).with_recombine_quads(config.recombine_quads);
    let names = db.directory_names(selector);
    run_walk(db, &converter, &names, config)
}
