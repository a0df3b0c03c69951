// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! TTL index error types.

use crate::index::IndexError;

/// Errors that can occur in TTL index operations.
///
/// Absent keys are not errors, and operations on empty keys are ignored.
#[derive(Debug, thiserror::Error)]
pub enum TtlError {
    #[error("traversal requires a visitor")]
    MissingVisitor,

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}
