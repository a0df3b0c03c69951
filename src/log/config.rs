// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the append-log store.

use crate::index::IndexOptions;

use super::LogStoreError;

/// Default tombstone ratio above which compaction is scheduled.
pub const DEFAULT_COMPACTION_THRESHOLD: f64 = 0.3;

/// Default number of index entries inspected per compaction step.
pub const DEFAULT_COMPACTION_BATCH_SIZE: usize = 1024;

/// How compaction runs once the tombstone threshold is crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompactionMode {
    /// A dedicated worker thread compacts in batches, releasing the write
    /// lock between batches.
    #[default]
    Background,
    /// The delete that crosses the threshold compacts to completion before
    /// releasing the write lock.
    Inline,
}

/// Configuration for [`AppendLogStore`](super::AppendLogStore).
#[derive(Debug, Clone)]
pub struct LogStoreConfig {
    /// Tombstone ratio in `(0, 1)` above which compaction is scheduled.
    pub threshold: f64,
    /// Index entries inspected per incremental compaction step
    /// (0 = whole index in one step).
    pub batch_size: usize,
    /// Initial capacity of the value arena.
    pub capacity: usize,
    /// Where threshold-triggered compaction runs.
    pub mode: CompactionMode,
    /// Tuning of the underlying ordered index.
    pub index: IndexOptions,
}

impl Default for LogStoreConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COMPACTION_THRESHOLD,
            batch_size: DEFAULT_COMPACTION_BATCH_SIZE,
            capacity: 0,
            mode: CompactionMode::default(),
            index: IndexOptions::default(),
        }
    }
}

impl LogStoreConfig {
    /// Sets the compaction threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the compaction batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the initial arena capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the compaction mode.
    pub fn with_mode(mut self, mode: CompactionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the index tuning options.
    pub fn with_index(mut self, index: IndexOptions) -> Self {
        self.index = index;
        self
    }

    /// Checks the configuration for values the store cannot work with.
    pub fn validate(&self) -> Result<(), LogStoreError> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(LogStoreError::InvalidConfig(format!(
                "compaction threshold must be in (0, 1), got {}",
                self.threshold
            )));
        }
        self.index.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LogStoreConfig::default();
        assert_eq!(config.threshold, 0.3);
        assert_eq!(config.mode, CompactionMode::Background);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_bounds() {
        for bad in [0.0, 1.0, -0.5, 1.5, f64::NAN, f64::INFINITY] {
            let config = LogStoreConfig::default().with_threshold(bad);
            assert!(
                matches!(config.validate(), Err(LogStoreError::InvalidConfig(_))),
                "threshold {bad} should be rejected"
            );
        }
        assert!(LogStoreConfig::default().with_threshold(0.99).validate().is_ok());
    }

    #[test]
    fn test_index_options_validated() {
        let config =
            LogStoreConfig::default().with_index(IndexOptions::default().with_degree(1));
        assert!(matches!(config.validate(), Err(LogStoreError::Index(_))));
    }
}
