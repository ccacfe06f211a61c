//! Error types for pnmconv-filter
//!
//! Filtering itself cannot fail on a well-formed raster; errors come from
//! name lookup, output allocation, and partition planning.

use thiserror::Error;

/// Errors that can occur during filtering operations
#[derive(Debug, Error)]
pub enum FilterError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] pnmconv_core::Error),

    /// Filter name is not one of the presets
    #[error("unknown filter: {0:?} (expected blur, laplace or sharpen)")]
    UnknownFilter(String),

    /// The output buffer could not be allocated
    #[error("out of memory allocating {samples} output samples")]
    OutOfMemory {
        /// Number of samples requested
        samples: usize,
    },

    /// A partition plan does not cover the image exactly once
    #[error("invalid partition: {0}")]
    InvalidPartition(String),
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;
