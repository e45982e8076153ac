// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docrect.

use thiserror::Error;

use crate::types::DetectionFailure;

/// Top-level error type for all docrect operations.
#[derive(Debug, Error)]
pub enum DocrectError {
    // -- Image errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("cannot rectify quadrilateral: {0}")]
    DegenerateQuad(String),

    // -- Detection --
    /// Only produced when the scanner runs with `FailurePolicy::Strict`.
    #[error("no document detected: {0}")]
    NoDocumentDetected(DetectionFailure),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Shell --
    #[error("scan cancelled")]
    Cancelled,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocrectError>;
