// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene files: named solids and assemblies in TOML or JSON
//!
//! ```toml
//! [[solids]]
//! name = "cube"
//! shape = { box = { min = [0.0, 0.0, 0.0], max = [1.0, 1.0, 1.0] } }
//!
//! [[assemblies]]
//! name = "part"
//! tree = { union = [{ leaf = { name = "cube" } }, { leaf = { name = "cube", translate = [0.5, 0.0, 0.0] } }] }
//! ```

use crate::csg::{AssemblyTree, CsgTree, LeafRef};
use crate::geometry::Primitive;
use anyhow::{Context, Result};
use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub solids: Vec<SceneSolid>,
    #[serde(default)]
    pub assemblies: Vec<SceneAssembly>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSolid {
    pub name: String,
    pub shape: Primitive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAssembly {
    pub name: String,
    pub tree: TreeExpr,
}

/// Nested form of a CSG tree as written in scene files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeExpr {
    Leaf {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        translate: Option<[f64; 3]>,
        /// Row-major 4x4 placement, applied before `translate`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        matrix: Option<[f64; 16]>,
    },
    Union(Box<[TreeExpr; 2]>),
    Subtract(Box<[TreeExpr; 2]>),
    Intersect(Box<[TreeExpr; 2]>),
    Xor(Box<[TreeExpr; 2]>),
    Not(Box<TreeExpr>),
    Guard(Box<TreeExpr>),
    Nop,
}

impl TreeExpr {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self::Leaf {
            name: name.into(),
            translate: None,
            matrix: None,
        }
    }

    pub fn placement(&self) -> Matrix4<f64> {
        let Self::Leaf {
            translate, matrix, ..
        } = self
        else {
            return Matrix4::identity();
        };
        let base = matrix
            .map(|m| Matrix4::from_row_slice(&m))
            .unwrap_or_else(Matrix4::identity);
        match translate {
            Some(t) => Matrix4::new_translation(&Vector3::from(*t)) * base,
            None => base,
        }
    }

    /// Lower the nested form into an arena tree.
    pub fn to_tree(&self) -> AssemblyTree {
        let pair = |operands: &[TreeExpr; 2]| (operands[0].to_tree(), operands[1].to_tree());
        match self {
            Self::Leaf { name, .. } => CsgTree::leaf(LeafRef::placed(name.clone(), self.placement())),
            Self::Union(operands) => {
                let (a, b) = pair(operands);
                a.union(b)
            }
            Self::Subtract(operands) => {
                let (a, b) = pair(operands);
                a.subtract(b)
            }
            Self::Intersect(operands) => {
                let (a, b) = pair(operands);
                a.intersect(b)
            }
            Self::Xor(operands) => {
                let (a, b) = pair(operands);
                a.xor(b)
            }
            Self::Not(inner) => inner.to_tree().not(),
            Self::Guard(inner) => inner.to_tree().guard(),
            Self::Nop => CsgTree::nop(),
        }
    }
}

impl Scene {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML scene")
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse JSON scene")
    }

    /// Read a scene, picking the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file: {:?}", path))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
        .with_context(|| format!("Invalid scene file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    const SCENE: &str = r#"
[[solids]]
name = "cube"
shape = { box = { min = [0.0, 0.0, 0.0], max = [1.0, 1.0, 1.0] } }

[[solids]]
name = "ball"
shape = { sphere = { center = [0.5, 0.5, 0.5], radius = 0.7 } }

[[assemblies]]
name = "part"
tree = { subtract = [{ leaf = { name = "cube" } }, { not = { leaf = { name = "ball", translate = [1.0, 0.0, 0.0] } } }] }

[[assemblies]]
name = "blank"
tree = "nop"
"#;

    #[test]
    fn test_parse_toml_scene() {
        let scene = Scene::from_toml_str(SCENE).unwrap();
        assert_eq!(scene.solids.len(), 2);
        assert_eq!(
            scene.solids[0].shape,
            Primitive::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
        );

        let part = scene.assemblies[0].tree.to_tree();
        assert_eq!(part.to_string(), "subtract(cube, not(ball))");
        assert!(scene.assemblies[1].tree.to_tree().is_nop());
    }

    #[test]
    fn test_leaf_placement_composition() {
        let expr = TreeExpr::Leaf {
            name: "a".into(),
            translate: Some([1.0, 2.0, 3.0]),
            matrix: Some([
                2.0, 0.0, 0.0, 0.0, //
                0.0, 2.0, 0.0, 0.0, //
                0.0, 0.0, 2.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ]),
        };
        let p = expr.placement().transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_eq!(p, Point3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_parse_json_scene() {
        let json = r#"{
            "solids": [
                {"name": "rod", "shape": {"cylinder": {"base": [0, 0, 0], "height": [0, 0, 2], "radius": 0.25}}}
            ],
            "assemblies": [
                {"name": "pair", "tree": {"xor": [{"leaf": {"name": "rod"}}, {"guard": {"leaf": {"name": "rod"}}}]}}
            ]
        }"#;
        let scene = Scene::from_json_str(json).unwrap();
        assert_eq!(scene.assemblies[0].tree.to_tree().to_string(), "xor(rod, guard(rod))");
    }
}
