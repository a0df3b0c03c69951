// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the TTL index.

use std::fmt;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::index::IndexOptions;

/// Configuration for [`TtlIndex`](super::TtlIndex).
#[derive(Clone)]
pub struct TtlIndexConfig {
    /// Tuning of the underlying ordered index. Zero values select the
    /// defaults.
    pub index: IndexOptions,
    /// Time source for the `*_now` operations and the clock-driven purge.
    pub clock: Arc<dyn Clock>,
}

impl Default for TtlIndexConfig {
    fn default() -> Self {
        Self {
            index: IndexOptions::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl TtlIndexConfig {
    /// Sets the index tuning options.
    pub fn with_index(mut self, index: IndexOptions) -> Self {
        self.index = index;
        self
    }

    /// Sets the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl fmt::Debug for TtlIndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlIndexConfig")
            .field("index", &self.index)
            .field("clock_now", &self.clock.now())
            .finish()
    }
}
