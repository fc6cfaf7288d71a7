// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Panic output while regions run inside their fault boundaries

use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Run `f` with the process panic hook swapped for a debug-level `tracing`
/// event, then restore the previous hook.
///
/// Panics caught by a region's fault boundary surface only as that region's
/// warning. A panic escaping `f` is re-raised after the hook is restored.
pub fn with_quiet_panics<T>(f: impl FnOnce() -> T) -> T {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        let location = info.location().map(|l| l.to_string()).unwrap_or_default();
        debug!(%location, "contained panic");
    }));

    let result = panic::catch_unwind(AssertUnwindSafe(f));
    panic::set_hook(previous);
    match result {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contained_panic_passes_value_through() {
        let value = with_quiet_panics(|| {
            let caught = panic::catch_unwind(|| panic!("contained"));
            assert!(caught.is_err());
            7
        });
        assert_eq!(value, 7);
    }

    #[test]
    fn test_escaping_panic_is_reraised() {
        let escaped = panic::catch_unwind(|| with_quiet_panics(|| -> u8 { panic!("escaped") }));
        let payload = escaped.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"escaped"));
    }
}
