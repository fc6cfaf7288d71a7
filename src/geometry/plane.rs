// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Plane equations for planar faces

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Side of a plane a point falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    On,
}

/// Oriented plane `normal · p = offset` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub offset: f64,
}

impl Plane {
    pub fn new(normal: Vector3<f64>, offset: f64) -> Self {
        Self { normal, offset }
    }

    /// Plane through a point with the given (not necessarily unit) normal.
    pub fn through(point: &Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        let len = normal.norm();
        if len <= f64::EPSILON {
            return None;
        }
        let normal = normal / len;
        Some(Self {
            normal,
            offset: normal.dot(&point.coords),
        })
    }

    pub fn from_points(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Self> {
        Self::through(a, (b - a).cross(&(c - a)))
    }

    /// Best-fit plane of a polygon using Newell's method.
    pub fn from_polygon(points: &[Point3<f64>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let normal = newell_normal(points.iter());
        let centroid = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / points.len() as f64;
        Self::through(&Point3::from(centroid), normal)
    }

    /// Signed distance from the plane.
    pub fn distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }

    pub fn side(&self, point: &Point3<f64>, epsilon: f64) -> Side {
        let d = self.distance(point);
        if d > epsilon {
            Side::Front
        } else if d < -epsilon {
            Side::Back
        } else {
            Side::On
        }
    }

    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Index of the axis dropped when projecting onto a coordinate plane.
    pub fn dominant_axis(&self) -> usize {
        let n = self.normal.map(f64::abs);
        if n.x >= n.y && n.x >= n.z {
            0
        } else if n.y >= n.z {
            1
        } else {
            2
        }
    }
}

/// Newell's area vector: twice the vector area of a closed polygon.
pub fn newell_normal<'a>(points: impl Iterator<Item = &'a Point3<f64>>) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    let mut iter = points.peekable();
    let first = match iter.peek() {
        Some(p) => **p,
        None => return normal,
    };
    while let Some(current) = iter.next() {
        let next = iter.peek().map(|p| **p).unwrap_or(first);
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}
