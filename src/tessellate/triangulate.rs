// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planar face triangulation with holes
//!
//! Each face is projected onto the coordinate plane that drops its dominant
//! normal axis and cut into triangles with earcut. Triangles are re-oriented
//! to agree with the face normal, so the output keeps outward orientation
//! whatever winding the projection produced.

use super::{recombine_quads, Facet, TriangulatedRegion};
use crate::error::TriangulationFault;
use crate::geometry::{Face, Region};
use nalgebra::Point3;
use tracing::debug;

/// Triangulate one face. Degenerate faces produce no triangles.
pub fn face_triangles(
    face_index: usize,
    face: &Face,
    pool: &[Point3<f64>],
) -> Result<Vec<[usize; 3]>, TriangulationFault> {
    for l in face.loops() {
        if let Some(&index) = l.vertices.iter().find(|&&v| v >= pool.len()) {
            return Err(TriangulationFault::IndexOutOfBounds {
                face: face_index,
                index,
                pool: pool.len(),
            });
        }
    }
    if face.outer.len() < 3 {
        return Ok(Vec::new());
    }

    let (u, v) = match face.plane.dominant_axis() {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };

    let mut flat = Vec::new();
    let mut lut = Vec::new();
    let mut hole_indices = Vec::new();
    for (k, l) in face.loops().enumerate() {
        if l.len() < 3 {
            continue;
        }
        if k > 0 {
            hole_indices.push(lut.len());
        }
        for &vi in &l.vertices {
            flat.push(pool[vi][u]);
            flat.push(pool[vi][v]);
            lut.push(vi);
        }
    }

    let indices = earcutr::earcut(&flat, &hole_indices, 2).map_err(|e| {
        TriangulationFault::Earcut {
            face: face_index,
            reason: format!("{e:?}"),
        }
    })?;

    let normal = face.plane.normal;
    let mut triangles = Vec::with_capacity(indices.len() / 3);
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (lut[tri[0]], lut[tri[1]], lut[tri[2]]);
        if a == b || b == c || c == a {
            continue;
        }
        let ab = pool[b] - pool[a];
        let ac = pool[c] - pool[a];
        let cross = ab.cross(&ac);
        if cross.norm() <= f64::EPSILON * (ab.norm_squared() + ac.norm_squared()) {
            continue;
        }
        triangles.push(if cross.dot(&normal) >= 0.0 {
            [a, b, c]
        } else {
            [a, c, b]
        });
    }
    Ok(triangles)
}

/// Lazy triangle stream over every face of a region.
///
/// Faces are triangulated only as the stream reaches them. After the first
/// fault the stream ends.
pub struct RegionTriangles<'a> {
    region: &'a Region,
    shell: usize,
    face: usize,
    face_number: usize,
    pending: std::vec::IntoIter<[usize; 3]>,
    done: bool,
}

pub fn region_triangles(region: &Region) -> RegionTriangles<'_> {
    RegionTriangles {
        region,
        shell: 0,
        face: 0,
        face_number: 0,
        pending: Vec::new().into_iter(),
        done: false,
    }
}

impl<'a> RegionTriangles<'a> {
    fn next_face(&mut self) -> Option<&'a Face> {
        while let Some(shell) = self.region.shells.get(self.shell) {
            if let Some(face) = shell.faces.get(self.face) {
                self.face += 1;
                return Some(face);
            }
            self.shell += 1;
            self.face = 0;
        }
        None
    }
}

impl Iterator for RegionTriangles<'_> {
    type Item = Result<[usize; 3], TriangulationFault>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if let Some(tri) = self.pending.next() {
                return Some(Ok(tri));
            }
            let Some(face) = self.next_face() else {
                self.done = true;
                return None;
            };
            let number = self.face_number;
            self.face_number += 1;
            match face_triangles(number, face, &self.region.vertices) {
                Ok(tris) => self.pending = tris.into_iter(),
                Err(fault) => {
                    self.done = true;
                    return Some(Err(fault));
                }
            }
        }
    }
}

impl std::iter::FusedIterator for RegionTriangles<'_> {}

/// Consume a cleaned region and produce its export mesh.
pub fn triangulate_region(
    path: &str,
    region: Region,
    recombine: bool,
) -> Result<TriangulatedRegion, TriangulationFault> {
    let triangles = region_triangles(&region).collect::<Result<Vec<_>, _>>()?;

    let facets = if recombine {
        recombine_quads(&triangles, &region.vertices)
    } else {
        triangles.into_iter().map(Facet::Triangle).collect()
    };

    debug!(
        path,
        facets = facets.len(),
        vertices = region.vertices.len(),
        "triangulated region"
    );

    Ok(TriangulatedRegion {
        path: path.to_string(),
        vertices: region.vertices,
        facets,
    })
}
