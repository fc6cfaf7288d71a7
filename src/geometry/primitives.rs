// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Solid primitives and their boundary tessellation

use super::{Region, TessellationTolerance};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

const MIN_SEGMENTS: usize = 8;
const MAX_SEGMENTS: usize = 256;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PrimitiveError {
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("face {face} references vertex {index} but only {count} vertices exist")]
    FaceIndex {
        face: usize,
        index: usize,
        count: usize,
    },

    #[error("face {0} has fewer than three vertices")]
    ShortFace(usize),
}

/// Geometric primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    #[serde(rename = "box")]
    Cuboid { min: Point3<f64>, max: Point3<f64> },
    Sphere { center: Point3<f64>, radius: f64 },
    /// Right circular cylinder; `height` is the axis vector from the base centre.
    Cylinder {
        base: Point3<f64>,
        height: Vector3<f64>,
        radius: f64,
    },
    /// Raw polygon faces, counter-clockwise seen from outside.
    Polyhedron {
        vertices: Vec<Point3<f64>>,
        faces: Vec<Vec<usize>>,
    },
}

impl Primitive {
    pub fn cuboid(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self::Cuboid { min, max }
    }

    pub fn sphere(center: Point3<f64>, radius: f64) -> Self {
        Self::Sphere { center, radius }
    }

    pub fn cylinder(base: Point3<f64>, height: Vector3<f64>, radius: f64) -> Self {
        Self::Cylinder {
            base,
            height,
            radius,
        }
    }

    pub fn polyhedron(vertices: Vec<Point3<f64>>, faces: Vec<Vec<usize>>) -> Self {
        Self::Polyhedron { vertices, faces }
    }

    pub fn to_region(&self, tolerance: &TessellationTolerance) -> Result<Region, PrimitiveError> {
        match self {
            Self::Cuboid { min, max } => generate_cuboid(min, max),
            Self::Sphere { center, radius } => {
                generate_sphere(center, *radius, segment_count(tolerance))
            }
            Self::Cylinder {
                base,
                height,
                radius,
            } => generate_cylinder(base, height, *radius, segment_count(tolerance)),
            Self::Polyhedron { vertices, faces } => generate_polyhedron(vertices, faces),
        }
    }
}

/// Number of segments around a full circle.
///
/// Satisfies both the relative chord-error bound and, when non-zero, the
/// maximum angle between adjacent facet normals.
pub fn segment_count(tolerance: &TessellationTolerance) -> usize {
    let mut segments = MIN_SEGMENTS as f64;

    if tolerance.relative > 0.0 && tolerance.relative < 1.0 {
        segments = segments.max((PI / (1.0 - tolerance.relative).acos()).ceil());
    } else if tolerance.relative <= 0.0 {
        segments = MAX_SEGMENTS as f64;
    }
    if tolerance.normal > 0.0 {
        segments = segments.max((2.0 * PI / tolerance.normal).ceil());
    }

    (segments as usize).clamp(MIN_SEGMENTS, MAX_SEGMENTS)
}

fn generate_cuboid(min: &Point3<f64>, max: &Point3<f64>) -> Result<Region, PrimitiveError> {
    if !(min.x < max.x && min.y < max.y && min.z < max.z) {
        return Err(PrimitiveError::InvalidDimensions(format!(
            "box min {:?} must be below max {:?}",
            min.coords.as_slice(),
            max.coords.as_slice()
        )));
    }

    let vertices = vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    let faces = vec![
        vec![0, 3, 2, 1], // -z
        vec![4, 5, 6, 7], // +z
        vec![0, 1, 5, 4], // -y
        vec![3, 7, 6, 2], // +y
        vec![0, 4, 7, 3], // -x
        vec![1, 2, 6, 5], // +x
    ];

    Ok(Region::from_polygons(vertices, faces))
}

fn generate_sphere(
    center: &Point3<f64>,
    radius: f64,
    slices: usize,
) -> Result<Region, PrimitiveError> {
    if !(radius > 0.0 && radius.is_finite()) {
        return Err(PrimitiveError::InvalidDimensions(format!(
            "sphere radius {radius} must be positive"
        )));
    }

    let stacks = (slices + 1) / 2;
    let mut vertices = Vec::with_capacity(2 + (stacks - 1) * slices);
    vertices.push(center + Vector3::new(0.0, 0.0, radius));

    for i in 1..stacks {
        let phi = PI * i as f64 / stacks as f64;
        for j in 0..slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            vertices.push(
                center
                    + radius
                        * Vector3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos()),
            );
        }
    }
    let south = vertices.len();
    vertices.push(center - Vector3::new(0.0, 0.0, radius));

    let ring = |i: usize, j: usize| 1 + (i - 1) * slices + (j % slices);
    let mut faces = Vec::with_capacity(slices * stacks);

    for j in 0..slices {
        faces.push(vec![0, ring(1, j), ring(1, j + 1)]);
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            faces.push(vec![ring(i, j), ring(i + 1, j), ring(i + 1, j + 1), ring(i, j + 1)]);
        }
    }
    for j in 0..slices {
        faces.push(vec![south, ring(stacks - 1, j + 1), ring(stacks - 1, j)]);
    }

    Ok(Region::from_polygons(vertices, faces))
}

fn generate_cylinder(
    base: &Point3<f64>,
    height: &Vector3<f64>,
    radius: f64,
    segments: usize,
) -> Result<Region, PrimitiveError> {
    let length = height.norm();
    if !(radius > 0.0 && radius.is_finite()) || length <= f64::EPSILON || !length.is_finite() {
        return Err(PrimitiveError::InvalidDimensions(format!(
            "cylinder needs positive radius and height (got {radius}, {length})"
        )));
    }

    let axis = height / length;
    let helper = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = axis.cross(&helper).normalize();
    let v = axis.cross(&u);

    let mut vertices = Vec::with_capacity(segments * 2);
    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        vertices.push(base + radius * (angle.cos() * u + angle.sin() * v));
    }
    for i in 0..segments {
        vertices.push(vertices[i] + height);
    }

    let mut faces = Vec::with_capacity(segments + 2);
    faces.push((0..segments).rev().collect());
    faces.push((segments..2 * segments).collect());
    for i in 0..segments {
        let next = (i + 1) % segments;
        faces.push(vec![i, next, next + segments, i + segments]);
    }

    Ok(Region::from_polygons(vertices, faces))
}

fn generate_polyhedron(
    vertices: &[Point3<f64>],
    faces: &[Vec<usize>],
) -> Result<Region, PrimitiveError> {
    for (face, indices) in faces.iter().enumerate() {
        if indices.len() < 3 {
            return Err(PrimitiveError::ShortFace(face));
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= vertices.len()) {
            return Err(PrimitiveError::FaceIndex {
                face,
                index,
                count: vertices.len(),
            });
        }
    }
    Ok(Region::from_polygons(vertices.to_vec(), faces.to_vec()))
}
