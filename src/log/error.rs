// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Append-log store error types.

use crate::index::IndexError;

/// Errors that can occur while building an append-log store.
///
/// Keyed operations never fail: absent keys are reported through `Option`
/// or `bool` results and empty keys are ignored.
#[derive(Debug, thiserror::Error)]
pub enum LogStoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("failed to spawn compaction worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}
