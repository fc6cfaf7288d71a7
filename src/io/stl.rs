// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Binary STL sink

use super::ExportSink;
use crate::tessellate::TriangulatedRegion;
use anyhow::{Context, Result};
use nalgebra::Vector3;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use stl_io::{Normal, Triangle, Vertex};

/// Writes every accepted region into one binary STL file. Quads are
/// split into two triangles.
#[derive(Debug)]
pub struct StlSink {
    path: PathBuf,
    regions: Mutex<Vec<(String, Vec<Triangle>)>>,
}

impl StlSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            regions: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_triangles(region: &TriangulatedRegion) -> Vec<Triangle> {
        let mut triangles = Vec::with_capacity(region.triangle_count());
        region.for_each_triangle(|[a, b, c], _| {
            let n = (b - a).cross(&(c - a)).try_normalize(0.0).unwrap_or_else(Vector3::zeros);
            triangles.push(Triangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [a, b, c].map(|p| Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
            });
        });
        triangles
    }
}

impl ExportSink for StlSink {
    fn accept(&self, region: TriangulatedRegion) {
        let triangles = Self::to_triangles(&region);
        match self.regions.lock() {
            Ok(mut regions) => regions.push((region.path, triangles)),
            Err(poisoned) => poisoned.into_inner().push((region.path, triangles)),
        }
    }

    /// Write regions in path order so output does not depend on scheduling.
    fn finish(&self) -> Result<()> {
        let mut regions = match self.regions.lock() {
            Ok(regions) => regions.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        regions.sort_by(|a, b| a.0.cmp(&b.0));

        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create STL file: {:?}", self.path))?;
        let mut writer = BufWriter::new(file);
        let triangles: Vec<&Triangle> = regions.iter().flat_map(|(_, t)| t.iter()).collect();
        stl_io::write_stl(&mut writer, triangles.into_iter())
            .with_context(|| format!("Failed to write STL file: {:?}", self.path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use crate::tessellate::triangulate_region;
    use nalgebra::Point3;

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.stl");

        let region = Primitive::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .to_region(&Default::default())
            .unwrap();
        let mesh = triangulate_region("cube", region, true).unwrap();
        assert!(mesh.quad_count() > 0);

        let sink = StlSink::new(&path);
        sink.accept(mesh);
        sink.finish().unwrap();

        let mut file = File::open(&path).unwrap();
        let read = stl_io::read_stl(&mut file).unwrap();
        assert_eq!(read.faces.len(), 12);
        assert_eq!(read.vertices.len(), 8);
    }
}
