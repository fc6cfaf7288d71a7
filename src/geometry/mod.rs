// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - boundary representation, tolerances and primitives

pub mod analytics;
mod bbox;
pub mod cleanup;
pub mod fuse;
mod plane;
mod primitives;
mod region;
mod tolerance;

pub use analytics::{analyze, GeometryStats};
pub use bbox::BoundingBox;
pub use cleanup::{cleanup, CleanupReport};
pub use fuse::VertexFuser;
pub use plane::{newell_normal, Plane, Side};
pub use primitives::{segment_count, Primitive, PrimitiveError};
pub use region::{count_unmatched, EdgeUse, Face, Loop, Region, Shell, VertexIndex};
pub use tolerance::{TessellationTolerance, Tolerance};
