// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! In-memory object database with a concurrent tessellation cache

use super::{ObjectDatabase, Scene, Selector};
use crate::csg::{AssemblyTree, Node};
use crate::error::ResolveError;
use crate::geometry::{Primitive, Region, TessellationTolerance};
use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result};
use dashmap::DashMap;
use nalgebra::Matrix4;
use std::path::Path;
use tracing::debug;

type CacheKey = (String, [u64; 16]);

fn cache_key(name: &str, placement: &Matrix4<f64>) -> CacheKey {
    let mut bits = [0u64; 16];
    for (slot, value) in bits.iter_mut().zip(placement.iter()) {
        *slot = value.to_bits();
    }
    (name.to_string(), bits)
}

/// Catalogue of named solids and assemblies
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    solids: AHashMap<String, Primitive>,
    assemblies: AHashMap<String, AssemblyTree>,
    order: Vec<String>,
    tessellation: TessellationTolerance,
    cache: DashMap<CacheKey, Region>,
}

impl MemoryDatabase {
    pub fn new(tessellation: TessellationTolerance) -> Self {
        Self {
            tessellation,
            ..Default::default()
        }
    }

    /// Build a database from a parsed scene.
    pub fn from_scene(scene: Scene, tessellation: TessellationTolerance) -> Self {
        let mut db = Self::new(tessellation);
        for solid in scene.solids {
            db.insert_solid(solid.name, solid.shape);
        }
        for assembly in scene.assemblies {
            let tree = assembly.tree.to_tree();
            db.insert_assembly(assembly.name, tree);
        }
        db
    }

    /// Load a TOML or JSON scene file.
    pub fn load(path: impl AsRef<Path>, tessellation: TessellationTolerance) -> Result<Self> {
        let path = path.as_ref();
        let scene =
            Scene::from_file(path).with_context(|| format!("Failed to load scene {:?}", path))?;
        Ok(Self::from_scene(scene, tessellation))
    }

    pub fn insert_solid(&mut self, name: impl Into<String>, shape: Primitive) {
        let name = name.into();
        self.assemblies.remove(&name);
        self.declare(&name);
        self.solids.insert(name, shape);
    }

    pub fn insert_assembly(&mut self, name: impl Into<String>, tree: AssemblyTree) {
        let name = name.into();
        self.solids.remove(&name);
        self.declare(&name);
        self.assemblies.insert(name, tree);
    }

    fn declare(&mut self, name: &str) {
        self.cache.retain(|key, _| key.0 != name);
        if !self.order.iter().any(|n| n == name) {
            self.order.push(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.solids.contains_key(name) || self.assemblies.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of cached tessellations.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn tessellation(&self) -> &TessellationTolerance {
        &self.tessellation
    }

    /// Objects no assembly refers to, in declaration order.
    pub fn top_level(&self) -> Vec<String> {
        let referenced: AHashSet<&str> = self
            .assemblies
            .values()
            .flat_map(|tree| tree.nodes().iter())
            .filter_map(|node| match node {
                Node::Leaf(leaf) => Some(leaf.name.as_str()),
                _ => None,
            })
            .collect();

        self.order
            .iter()
            .filter(|name| !referenced.contains(name.as_str()))
            .cloned()
            .collect()
    }
}

impl ObjectDatabase for MemoryDatabase {
    fn directory_names(&self, selector: &Selector) -> Vec<String> {
        match selector {
            Selector::All => self.top_level(),
            Selector::Names(names) => names.clone(),
            Selector::Prefix(prefix) => self
                .top_level()
                .into_iter()
                .filter(|name| name.starts_with(prefix.as_str()))
                .collect(),
        }
    }

    fn assembly(&self, name: &str) -> Option<&AssemblyTree> {
        self.assemblies.get(name)
    }

    fn resolve_leaf(&self, name: &str, placement: &Matrix4<f64>) -> Result<Region, ResolveError> {
        let key = cache_key(name, placement);
        if let Some(region) = self.cache.get(&key) {
            return Ok(region.clone());
        }

        let shape = self
            .solids
            .get(name)
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))?;

        let mut region =
            shape
                .to_region(&self.tessellation)
                .map_err(|e| ResolveError::Tessellation {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
        region.transform(placement);

        debug!(
            name,
            faces = region.face_count(),
            vertices = region.vertices.len(),
            "tessellated leaf"
        );
        self.cache.insert(key, region.clone());
        Ok(region)
    }
}
