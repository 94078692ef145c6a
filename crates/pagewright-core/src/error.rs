// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagewright.

use thiserror::Error;

/// Top-level error type for all Pagewright operations.
#[derive(Debug, Error)]
pub enum PagewrightError {
    // -- Input validation (always reported before any output is produced) --
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("operation would produce an empty document: {0}")]
    EmptyResult(String),

    // -- Document errors --
    #[error("cannot read source document {path}: {reason}")]
    SourceRead { path: String, reason: String },

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("failed to write output: {0}")]
    Materialization(String),

    // -- Session / persistence --
    #[error("session error: {0}")]
    Session(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PagewrightError {
    /// Shorthand for a [`PagewrightError::SourceRead`] with a displayable cause.
    pub fn source_read(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::SourceRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures caused by bad caller input rather than by the documents
    /// or the environment.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Rejected user input: bad page references, malformed positions, wrong
/// number of inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("no valid page numbers in {input:?}")]
    NoValidPages { input: String },

    #[error("expected a single page number, got {input:?}")]
    NotASinglePage { input: String },

    #[error("page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u64, total: u32 },

    #[error("split point {point} is out of range (must be between 1 and {max})", max = .total.saturating_sub(1))]
    SplitPointOutOfRange { point: u64, total: u32 },

    #[error("insert position {position} is out of range (must be between 0 and {total})")]
    PositionOutOfRange { position: u64, total: u32 },

    #[error("insert position {input:?} is not \"start\", \"end\" or a page number")]
    MalformedPosition { input: String },

    #[error("at least {required} input documents are required, got {supplied}")]
    InsufficientInputs { required: usize, supplied: usize },

    #[error("at most {allowed} input documents are accepted, got {supplied}")]
    TooManyInputs { allowed: usize, supplied: usize },

    #[error("rotation must be 90, 180 or 270 degrees, got {degrees}")]
    InvalidRotation { degrees: i64 },

    #[error("page order must list every page from 1 to {total} exactly once")]
    NotAPermutation { total: u32 },

    #[error("unknown page-number position {input:?}")]
    UnknownAnchor { input: String },

    #[error("invalid crop box ({left}, {top}, {right}, {bottom})")]
    InvalidCropBox {
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
    },

    #[error("invalid size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("opacity must be between 0 and 1, got {0}")]
    InvalidOpacity(f32),

    #[error("file is too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagewrightError>;
