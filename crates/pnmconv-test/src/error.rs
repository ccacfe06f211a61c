//! Error types for the regression harness

use std::path::PathBuf;
use thiserror::Error;

/// Harness failures that are not check failures
#[derive(Debug, Error)]
pub enum TestError {
    /// A fixture under `tests/data/images` could not be decoded
    #[error("cannot load fixture {name:?}: {source}")]
    Fixture {
        name: String,
        #[source]
        source: pnmconv_io::IoError,
    },

    /// A display-mode raster could not be written
    #[error("cannot write {path:?}: {source}")]
    RegOut {
        path: PathBuf,
        #[source]
        source: pnmconv_io::IoError,
    },
}

/// Result type for harness operations
pub type TestResult<T> = Result<T, TestError>;
