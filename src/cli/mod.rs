// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Terminal front end helpers for the `facetize` binary

pub mod panics;
pub mod progress;
pub mod reporter;

pub use panics::with_quiet_panics;
pub use progress::ProgressClient;
pub use reporter::Reporter;
