// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Progress bar that advances as regions finish

use crate::csg::{RegionOutcome, ResolvedTree, TreeClient};
use crate::error::ResolveError;
use crate::geometry::Region;
use indicatif::{ProgressBar, ProgressStyle};
use nalgebra::Matrix4;

/// Wraps another tree client and ticks a progress bar per region.
pub struct ProgressClient<'a, C: TreeClient> {
    inner: &'a C,
    bar: ProgressBar,
}

impl<'a, C: TreeClient> ProgressClient<'a, C> {
    pub fn new(inner: &'a C, regions: usize) -> Self {
        let bar = ProgressBar::new(regions as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { inner, bar }
    }

    /// Client that reports nothing, for quiet runs.
    pub fn hidden(inner: &'a C) -> Self {
        Self {
            inner,
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl<C: TreeClient> TreeClient for ProgressClient<'_, C> {
    fn leaf(&self, name: &str, placement: &Matrix4<f64>) -> Result<Region, ResolveError> {
        self.inner.leaf(name, placement)
    }

    fn region_start(&self, path: &str) {
        self.bar.set_message(path.to_string());
        self.inner.region_start(path);
    }

    fn region_end(&self, path: &str, tree: ResolvedTree) -> RegionOutcome {
        let outcome = self.inner.region_end(path, tree);
        self.bar.inc(1);
        outcome
    }
}
