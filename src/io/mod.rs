// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Export adapters for triangulated regions

mod stl;

pub use stl::StlSink;

use crate::tessellate::TriangulatedRegion;
use anyhow::Result;
use std::sync::Mutex;

/// Consumer of converted regions.
///
/// Regions may arrive from several worker threads and in completion
/// order; sinks buffer them and do their I/O in [`ExportSink::finish`].
pub trait ExportSink: Send + Sync {
    fn accept(&self, region: TriangulatedRegion);

    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// Keeps every converted region in memory.
#[derive(Debug, Default)]
pub struct MeshCollector {
    regions: Mutex<Vec<TriangulatedRegion>>,
}

impl MeshCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.regions.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, path: &str) -> Option<TriangulatedRegion> {
        self.regions
            .lock()
            .ok()?
            .iter()
            .find(|r| r.path == path)
            .cloned()
    }

    /// Collected regions sorted by path.
    pub fn into_regions(self) -> Vec<TriangulatedRegion> {
        let mut regions = self
            .regions
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        regions.sort_by(|a, b| a.path.cmp(&b.path));
        regions
    }
}

impl ExportSink for MeshCollector {
    fn accept(&self, region: TriangulatedRegion) {
        match self.regions.lock() {
            Ok(mut regions) => regions.push(region),
            Err(poisoned) => poisoned.into_inner().push(region),
        }
    }
}
