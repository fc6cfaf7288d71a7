// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Conversion configuration
//!
//! Values are layered: built-in defaults, then `facetize.toml` (or an
//! explicit file), then `FACETIZE_*` environment variables. Command-line
//! flags are applied on top by the binary. Nothing is processed until
//! [`ConversionConfig::validate`] has passed.

use crate::error::ConfigError;
use crate::geometry::{TessellationTolerance, Tolerance};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "facetize.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Fusing distance in model units
    pub distance: f64,
    /// Chord error relative to feature size, for leaf tessellation
    pub relative_tolerance: f64,
    /// Maximum angle between adjacent facet normals in radians, 0 = unused
    pub normal_tolerance: f64,
    /// Merge coplanar triangle pairs back into quads
    pub recombine_quads: bool,
    /// Evaluate top-level regions concurrently
    pub parallel: bool,
    /// Resolve sibling operands concurrently
    pub parallel_subtrees: bool,
    /// Worker threads; `None` uses the global rayon pool
    pub threads: Option<usize>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            distance: Tolerance::DEFAULT_DISTANCE,
            relative_tolerance: 0.01,
            normal_tolerance: 0.0,
            recombine_quads: false,
            parallel: true,
            parallel_subtrees: false,
            threads: None,
        }
    }
}

impl ConversionConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Defaults, overlaid by `path` (or `facetize.toml` when present) and
    /// then by the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if PathBuf::from(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `FACETIZE_*` overrides. Unparseable values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let float = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

        if let Some(distance) = float("FACETIZE_DISTANCE") {
            self.distance = distance;
        }
        if let Some(relative) = float("FACETIZE_RELATIVE_TOLERANCE") {
            self.relative_tolerance = relative;
        }
        if let Some(normal) = float("FACETIZE_NORMAL_TOLERANCE") {
            self.normal_tolerance = normal;
        }
        if let Some(recombine) = lookup("FACETIZE_RECOMBINE_QUADS") {
            self.recombine_quads = matches!(recombine.trim(), "1" | "true" | "yes" | "on");
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        use anyhow::Context;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("distance", self.distance),
            ("relative_tolerance", self.relative_tolerance),
            ("normal_tolerance", self.normal_tolerance),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        if self.distance < 0.0 {
            return Err(ConfigError::NegativeDistance(self.distance));
        }
        if !(0.0..1.0).contains(&self.relative_tolerance) {
            return Err(ConfigError::RelativeOutOfRange(self.relative_tolerance));
        }
        if !(0.0..PI).contains(&self.normal_tolerance) {
            return Err(ConfigError::NormalOutOfRange(self.normal_tolerance));
        }
        Ok(())
    }

    pub fn tolerance(&self) -> Result<Tolerance, ConfigError> {
        Tolerance::new(self.distance)
    }

    pub fn tessellation_tolerance(&self) -> TessellationTolerance {
        TessellationTolerance {
            relative: self.relative_tolerance,
            normal: self.normal_tolerance,
        }
    }
}
