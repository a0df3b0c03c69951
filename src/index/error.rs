// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Index error types.

/// Errors raised while building an ordered index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("invalid index options: {0}")]
    InvalidOptions(String),
}
