//! Error types for the geometry library.
//!
//! This module defines all error types that can occur while building spatial
//! indices or running the layout analysis passes.

/// Result type alias for geometry library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during layout analysis.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An argument was outside the documented domain (empty element set,
    /// reading order below -1, negative depth limit, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An internal invariant was violated by the geometry pipeline.
    ///
    /// This indicates that upstream input was inconsistent, for example a
    /// merged line ending up shorter than one of the segments it absorbed.
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    /// The operation was cancelled through a [`CancellationToken`](crate::cancel::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
