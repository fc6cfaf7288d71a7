// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSG trees over named objects and the walker that resolves them

mod tree;
pub mod walker;

pub use tree::{BooleanOp, CsgTree, Node, NodeId};
pub use walker::{RegionOutcome, RegionReport, TreeClient, TreeWalker, WalkOptions};

use crate::geometry::Region;
use nalgebra::Matrix4;
use std::fmt;

/// Reference to a named object with the placement it is instanced at.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafRef {
    pub name: String,
    pub placement: Matrix4<f64>,
}

impl LeafRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            placement: Matrix4::identity(),
        }
    }

    pub fn placed(name: impl Into<String>, placement: Matrix4<f64>) -> Self {
        Self {
            name: name.into(),
            placement,
        }
    }
}

impl fmt::Display for LeafRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Leaf after resolution: the object's boundary in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub region: Region,
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Tree as stored in the object database
pub type AssemblyTree = CsgTree<LeafRef>;

/// Tree whose leaves are all resolved to boundary fragments
pub type ResolvedTree = CsgTree<Fragment>;
