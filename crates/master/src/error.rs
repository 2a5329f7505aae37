// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error values surfaced by master operations.

use thiserror::Error;

/// Errors returned by registry and lifecycle operations.
///
/// These are plain values; no operation aborts the loop, and observer
/// failures never propagate past the invocation site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MasterError {
    /// The operation is redundant in the current state.
    #[error("already in the requested state")]
    Already,
    /// The slave is in the wrong state for this operation.
    #[error("invalid state for operation")]
    Invalid,
    /// No matching record.
    #[error("no matching record")]
    NotExist,
    /// A downstream operation failed.
    #[error("downstream operation failed")]
    Fault,
}
