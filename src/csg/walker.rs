// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Depth-first walk over top-level assemblies
//!
//! Every requested name becomes one region. Its tree is resolved leaf by
//! leaf through the [`TreeClient`], nested assemblies are inlined with
//! their placements composed, and the fully resolved tree is handed to
//! `region_end` exactly once.

use super::{AssemblyTree, BooleanOp, CsgTree, Fragment, LeafRef, Node, NodeId, ResolvedTree};
use crate::convert::ConversionCounters;
use crate::db::ObjectDatabase;
use crate::error::{RegionFault, ResolveError};
use crate::geometry::Region;
use nalgebra::Matrix4;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Extension points invoked by the walker.
pub trait TreeClient: Sync {
    /// Resolve one named solid at `placement`.
    fn leaf(&self, name: &str, placement: &Matrix4<f64>) -> Result<Region, ResolveError>;

    fn region_start(&self, _path: &str) {}

    /// Evaluate a fully resolved region tree. A tree whose every leaf
    /// dropped out arrives as a single NOP node.
    fn region_end(&self, path: &str, tree: ResolvedTree) -> RegionOutcome;
}

/// Summary of a region that converted to a non-empty mesh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionReport {
    pub path: String,
    pub vertices: usize,
    pub triangles: usize,
    pub quads: usize,
    pub surface_area: f64,
}

/// What became of one top-level region.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionOutcome {
    Converted(RegionReport),
    /// Evaluation succeeded and nothing is left after cleanup.
    Empty,
    /// No leaf of the tree resolved.
    NothingRemains,
    Faulted(RegionFault),
}

impl RegionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RegionOutcome::Converted(_) | RegionOutcome::Empty)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RegionOutcome::Converted(_) => "ok",
            RegionOutcome::Empty => "empty",
            RegionOutcome::NothingRemains => "nothing remains",
            RegionOutcome::Faulted(_) => "fault",
        }
    }
}

/// Walker options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Walk top-level regions concurrently.
    pub parallel: bool,
    /// Resolve both operands of a binary node concurrently.
    pub parallel_subtrees: bool,
}

pub struct TreeWalker<'a, D: ObjectDatabase, C: TreeClient> {
    db: &'a D,
    client: &'a C,
    counters: &'a ConversionCounters,
    options: WalkOptions,
}

impl<'a, D: ObjectDatabase, C: TreeClient> TreeWalker<'a, D, C> {
    pub fn new(db: &'a D, client: &'a C, counters: &'a ConversionCounters) -> Self {
        Self {
            db,
            client,
            counters,
            options: WalkOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Walk every name once. Outcomes come back in request order.
    pub fn walk(&self, names: &[String]) -> Vec<(String, RegionOutcome)> {
        let outcomes: Vec<_> = if self.options.parallel {
            names
                .par_iter()
                .map(|name| (name.clone(), self.walk_region(name)))
                .collect()
        } else {
            names
                .iter()
                .map(|name| (name.clone(), self.walk_region(name)))
                .collect()
        };

        let summary = self.counters.summary();
        info!(
            attempted = summary.attempted,
            booleaned = summary.booleaned,
            triangulated = summary.triangulated,
            skipped = summary.skipped,
            faulted = summary.faulted,
            "walk finished"
        );
        outcomes
    }

    /// Resolve and evaluate one top-level region.
    pub fn walk_region(&self, path: &str) -> RegionOutcome {
        self.client.region_start(path);
        debug!(path, "region start");

        let mut stack = vec![path.to_string()];
        let resolved = match self.db.assembly(path) {
            Some(tree) => self.resolve(tree, tree.root(), &Matrix4::identity(), &mut stack),
            None => self.resolve_leaf(&LeafRef::new(path), &Matrix4::identity(), &mut Vec::new()),
        };

        let outcome = self
            .client
            .region_end(path, resolved.unwrap_or_else(CsgTree::nop));
        self.counters.record(&outcome);

        match &outcome {
            RegionOutcome::Faulted(fault) => warn!(path, %fault, "region faulted"),
            other => debug!(path, outcome = other.label(), "region end"),
        }
        outcome
    }

    /// Resolve a leaf reference, inlining it when it names an assembly.
    fn resolve_leaf(
        &self,
        leaf: &LeafRef,
        parent: &Matrix4<f64>,
        stack: &mut Vec<String>,
    ) -> Option<ResolvedTree> {
        let placement = parent * leaf.placement;

        if let Some(tree) = self.db.assembly(&leaf.name) {
            if stack.iter().any(|n| n == &leaf.name) {
                let error = ResolveError::Cycle(leaf.name.clone());
                warn!(leaf = %leaf.name, %error, "skipping leaf");
                self.counters.leaf_skipped();
                return None;
            }
            stack.push(leaf.name.clone());
            let inlined = self.resolve(tree, tree.root(), &placement, stack);
            stack.pop();
            return inlined;
        }

        match self.client.leaf(&leaf.name, &placement) {
            Ok(region) => Some(CsgTree::leaf(Fragment {
                name: leaf.name.clone(),
                region,
            })),
            Err(error) => {
                warn!(leaf = %leaf.name, %error, "skipping leaf");
                self.counters.leaf_skipped();
                None
            }
        }
    }

    /// Resolve the subtree at `id`. `None` stands for NOP.
    fn resolve(
        &self,
        tree: &AssemblyTree,
        id: NodeId,
        placement: &Matrix4<f64>,
        stack: &mut Vec<String>,
    ) -> Option<ResolvedTree> {
        match tree.node(id) {
            Node::Leaf(leaf) => self.resolve_leaf(leaf, placement, stack),
            Node::Nop => None,
            Node::Not(child) => self.resolve(tree, *child, placement, stack).map(CsgTree::not),
            Node::Guard(child) => self
                .resolve(tree, *child, placement, stack)
                .map(CsgTree::guard),
            node => {
                let (op, l, r) = node.as_binary()?;
                let (left, right) = if self.options.parallel_subtrees {
                    let mut right_stack = stack.clone();
                    rayon::join(
                        || self.resolve(tree, l, placement, stack),
                        || self.resolve(tree, r, placement, &mut right_stack),
                    )
                } else {
                    let left = self.resolve(tree, l, placement, stack);
                    (left, self.resolve(tree, r, placement, stack))
                };
                simplify(op, left, right)
            }
        }
    }
}

/// Apply a binary operator where either operand may be NOP.
fn simplify(
    op: BooleanOp,
    left: Option<ResolvedTree>,
    right: Option<ResolvedTree>,
) -> Option<ResolvedTree> {
    use BooleanOp::*;
    match (op, left, right) {
        (op, Some(a), Some(b)) => Some(a.combine(op, b)),
        (Union | Xor, a, b) => a.or(b),
        (Subtract, a, None) => a,
        (Subtract, None, _) => None,
        (Intersect, _, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;
    use crate::geometry::{Primitive, TessellationTolerance};
    use nalgebra::{Point3, Vector3};
    use std::sync::Mutex;

    /// Records each region's resolved tree instead of evaluating it.
    struct Recorder<'a> {
        db: &'a MemoryDatabase,
        seen: Mutex<Vec<String>>,
    }

    impl TreeClient for Recorder<'_> {
        fn leaf(&self, name: &str, placement: &Matrix4<f64>) -> Result<Region, ResolveError> {
            self.db.resolve_leaf(name, placement)
        }

        fn region_end(&self, path: &str, tree: ResolvedTree) -> RegionOutcome {
            self.seen.lock().unwrap().push(format!("{path}: {tree}"));
            if tree.is_nop() {
                RegionOutcome::NothingRemains
            } else {
                RegionOutcome::Empty
            }
        }
    }

    fn cube_at(x: f64) -> Primitive {
        Primitive::cuboid(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
    }

    fn leaf(name: &str) -> AssemblyTree {
        CsgTree::leaf(LeafRef::new(name))
    }

    fn run(
        db: &MemoryDatabase,
        names: &[&str],
        options: WalkOptions,
    ) -> (Vec<String>, ConversionCounters) {
        let counters = ConversionCounters::new();
        let client = Recorder {
            db,
            seen: Mutex::new(Vec::new()),
        };
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        TreeWalker::new(db, &client, &counters)
            .with_options(options)
            .walk(&names);
        let mut seen = client.seen.into_inner().unwrap();
        seen.sort();
        (seen, counters)
    }

    #[test]
    fn test_nop_simplification() {
        let mut db = MemoryDatabase::new(TessellationTolerance::default());
        db.insert_solid("a", cube_at(0.0));
        db.insert_solid("b", cube_at(0.5));
        db.insert_assembly("u", leaf("a").union(leaf("gone")));
        db.insert_assembly("s", leaf("gone").subtract(leaf("a")));
        db.insert_assembly("t", leaf("a").subtract(leaf("gone")));
        db.insert_assembly("i", leaf("a").intersect(leaf("gone")));
        db.insert_assembly("x", leaf("gone").xor(leaf("b")));
        db.insert_assembly("n", leaf("gone").not().union(leaf("a").guard()));

        let (seen, counters) = run(&db, &["u", "s", "t", "i", "x", "n"], WalkOptions::default());
        assert_eq!(
            seen,
            vec![
                "i: nop",
                "n: guard(a)",
                "s: nop",
                "t: a",
                "u: a",
                "x: b",
            ]
        );

        let summary = counters.summary();
        assert_eq!(summary.attempted, 6);
        assert_eq!(summary.skipped, 6);
        assert_eq!(summary.booleaned, 4);
    }

    #[test]
    fn test_nested_assemblies_compose_placement() {
        let mut db = MemoryDatabase::new(TessellationTolerance::default());
        db.insert_solid("a", cube_at(0.0));
        db.insert_assembly(
            "inner",
            CsgTree::leaf(LeafRef::placed(
                "a",
                Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0)),
            )),
        );
        db.insert_assembly(
            "outer",
            CsgTree::leaf(LeafRef::placed(
                "inner",
                Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0)),
            )),
        );

        struct Bounds<'a>(&'a MemoryDatabase, Mutex<Option<Region>>);
        impl TreeClient for Bounds<'_> {
            fn leaf(&self, name: &str, placement: &Matrix4<f64>) -> Result<Region, ResolveError> {
                self.0.resolve_leaf(name, placement)
            }
            fn region_end(&self, _path: &str, tree: ResolvedTree) -> RegionOutcome {
                let region = tree.leaves().next().map(|(_, f)| f.region.clone());
                *self.1.lock().unwrap() = region;
                RegionOutcome::Empty
            }
        }

        let counters = ConversionCounters::new();
        let client = Bounds(&db, Mutex::new(None));
        TreeWalker::new(&db, &client, &counters).walk(&["outer".to_string()]);

        let region = client.1.into_inner().unwrap().unwrap();
        let bbox = region.bounding_box();
        assert_eq!(bbox.min, Point3::new(1.0, 2.0, 0.0));
        assert_eq!(bbox.max, Point3::new(2.0, 3.0, 1.0));
    }

    #[test]
    fn test_cycles_are_skipped() {
        let mut db = MemoryDatabase::new(TessellationTolerance::default());
        db.insert_solid("a", cube_at(0.0));
        db.insert_assembly("loop", leaf("a").union(leaf("loop")));

        let (seen, counters) = run(&db, &["loop"], WalkOptions::default());
        assert_eq!(seen, vec!["loop: a"]);
        assert_eq!(counters.summary().skipped, 1);
    }

    #[test]
    fn test_top_level_solid_is_its_own_region() {
        let mut db = MemoryDatabase::new(TessellationTolerance::default());
        db.insert_solid("a", cube_at(0.0));

        let (seen, counters) = run(&db, &["a", "missing"], WalkOptions::default());
        assert_eq!(seen, vec!["a: a", "missing: nop"]);
        assert_eq!(counters.summary().attempted, 2);
        assert_eq!(counters.summary().skipped, 1);
    }

    #[test]
    fn test_parallel_walk_keeps_request_order() {
        let mut db = MemoryDatabase::new(TessellationTolerance::default());
        let names: Vec<String> = (0..16).map(|i| format!("c{i}")).collect();
        for (i, name) in names.iter().enumerate() {
            db.insert_solid(name.clone(), cube_at(i as f64 * 2.0));
        }

        let counters = ConversionCounters::new();
        let client = Recorder {
            db: &db,
            seen: Mutex::new(Vec::new()),
        };
        let outcomes = TreeWalker::new(&db, &client, &counters)
            .with_options(WalkOptions {
                parallel: true,
                parallel_subtrees: true,
            })
            .walk(&names);

        let returned: Vec<String> = outcomes.into_iter().map(|(n, _)| n).collect();
        assert_eq!(returned, names);
        assert_eq!(counters.summary().attempted, 16);
    }
}
