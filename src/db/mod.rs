// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Named-object database consumed by the tree walker

mod memory;
pub mod scene;

pub use memory::MemoryDatabase;
pub use scene::{Scene, SceneAssembly, SceneSolid, TreeExpr};

use crate::csg::AssemblyTree;
use crate::error::ResolveError;
use crate::geometry::Region;
use nalgebra::Matrix4;

/// Which top-level names a run should walk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    /// Every top-level object
    #[default]
    All,
    /// Exactly these names, in this order
    Names(Vec<String>),
    /// Top-level objects whose name starts with the prefix
    Prefix(String),
}

/// Source of named solids and assemblies.
///
/// Implementations are shared by every region of a parallel run, so
/// `resolve_leaf` must tolerate concurrent calls.
pub trait ObjectDatabase: Sync {
    /// Enumerate the top-level names to walk.
    fn directory_names(&self, selector: &Selector) -> Vec<String>;

    /// The CSG tree stored under `name`, if it names an assembly.
    fn assembly(&self, name: &str) -> Option<&AssemblyTree>;

    /// Tessellate the solid `name` and move it to `placement`.
    fn resolve_leaf(&self, name: &str, placement: &Matrix4<f64>) -> Result<Region, ResolveError>;
}
