// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.

/// Configuration for an [`ItemTree`](crate::item::ItemTree).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    /// Assert on every dequeue that an up-to-date property has no requirement
    /// needing an update. Defaults to `cfg!(debug_assertions)`.
    pub check_invariants: bool,
    /// Upper bound on work-queue rounds per batch. Exceeding it is reported
    /// as a circular dependency. `None` relies on stagnation detection alone.
    pub max_rounds: Option<u32>,
}

impl TreeConfig {
    /// Default configuration: invariant checks follow `debug_assertions`, no
    /// round cap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            check_invariants: cfg!(debug_assertions),
            max_rounds: None,
        }
    }

    /// Configuration that never checks invariants, for hot loops.
    #[must_use]
    pub const fn unchecked() -> Self {
        Self {
            check_invariants: false,
            max_rounds: None,
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}
