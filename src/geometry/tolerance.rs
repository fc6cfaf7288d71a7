// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tolerance model shared by every geometric predicate

use crate::error::ConfigError;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Distance and angular thresholds for one conversion run.
///
/// `distance` may be zero, in which case only exactly coincident points
/// are fused. Side tests still use a tiny floor so that round-off in
/// split points does not create slivers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub distance: f64,
    pub distance_squared: f64,
    /// Cosine below which two directions count as perpendicular
    pub perpendicular: f64,
    /// Cosine above which two directions count as parallel
    pub parallel: f64,
}

impl Tolerance {
    pub const DEFAULT_DISTANCE: f64 = 0.0005;
    pub const DEFAULT_PERPENDICULAR: f64 = 1e-6;
    const EPSILON_FLOOR: f64 = 1e-10;
    const RELATIVE_SNAP: f64 = 1e-12;

    /// Build a tolerance from a distance, rejecting negative or non-finite values.
    pub fn new(distance: f64) -> Result<Self, ConfigError> {
        if !distance.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "distance",
                value: distance,
            });
        }
        if distance < 0.0 {
            return Err(ConfigError::NegativeDistance(distance));
        }

        let perpendicular = Self::DEFAULT_PERPENDICULAR;
        Ok(Self {
            distance,
            distance_squared: distance * distance,
            perpendicular,
            parallel: 1.0 - perpendicular,
        })
    }

    /// Distance used for point/plane side tests.
    pub fn epsilon(&self) -> f64 {
        self.distance.max(Self::EPSILON_FLOOR)
    }

    /// Distance below which two independently computed points are the same
    /// point, for a model whose coordinates reach `scale`. Covers round-off
    /// only and does not grow with `distance`.
    pub fn snap(&self, scale: f64) -> f64 {
        (scale.abs() * Self::RELATIVE_SNAP).max(Self::EPSILON_FLOOR)
    }

    pub fn near_zero(&self, value: f64) -> bool {
        value.abs() <= self.epsilon()
    }

    pub fn points_coincide(&self, a: &Point3<f64>, b: &Point3<f64>) -> bool {
        (a - b).norm_squared() <= self.distance_squared
    }

    /// `cos` is the cosine of the angle between two unit directions.
    pub fn is_parallel(&self, cos: f64) -> bool {
        cos.abs() >= self.parallel
    }

    pub fn is_perpendicular(&self, cos: f64) -> bool {
        cos.abs() <= self.perpendicular
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        let distance = Self::DEFAULT_DISTANCE;
        Self {
            distance,
            distance_squared: distance * distance,
            perpendicular: Self::DEFAULT_PERPENDICULAR,
            parallel: 1.0 - Self::DEFAULT_PERPENDICULAR,
        }
    }
}

/// Tolerances handed to leaf tessellation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TessellationTolerance {
    /// Maximum chord error as a fraction of the feature size
    pub relative: f64,
    /// Maximum angle in radians between adjacent facet normals, 0 = unused
    pub normal: f64,
}

impl Default for TessellationTolerance {
    fn default() -> Self {
        Self {
            relative: 0.01,
            normal: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_from_distance() {
        let tol = Tolerance::new(0.01).unwrap();
        assert_eq!(tol.distance_squared, 0.0001);
        assert!(tol.is_parallel(0.9999999));
        assert!(tol.is_perpendicular(1e-7));
        assert!(!tol.is_parallel(0.5));
    }

    #[test]
    fn test_zero_distance_is_valid() {
        let tol = Tolerance::new(0.0).unwrap();
        assert!(tol.epsilon() > 0.0);
        assert!(tol.points_coincide(&Point3::origin(), &Point3::origin()));
        assert!(!tol.points_coincide(&Point3::origin(), &Point3::new(1e-6, 0.0, 0.0)));
    }

    #[test]
    fn test_snap_tracks_scale_not_distance() {
        let coarse = Tolerance::new(0.1).unwrap();
        assert_eq!(coarse.snap(1.0), Tolerance::new(0.0).unwrap().snap(1.0));
        assert!(coarse.snap(1.0) < 1e-9);
        assert!(coarse.snap(1e6) > coarse.snap(1.0));
    }

    #[test]
    fn test_negative_distance_rejected() {
        assert!(matches!(
            Tolerance::new(-1.0),
            Err(ConfigError::NegativeDistance(_))
        ));
        assert!(matches!(
            Tolerance::new(f64::NAN),
            Err(ConfigError::NonFinite { .. })
        ));
    }
}
