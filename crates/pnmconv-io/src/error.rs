//! I/O error types
//!
//! Provides a unified error type for reading and writing plain-text
//! PNM rasters.  Decode failures (`BadMagic`, `Truncated`, `InvalidHeader`,
//! `CannotOpen` on the source) and encode failures (`CannotOpen` on the
//! destination, `Io` while writing) share one enum so that callers only
//! need to handle one error type.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for raster I/O operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// The source could not be opened for reading, or the destination
    /// could not be created for writing
    #[error("cannot open {path:?}: {source}")]
    CannotOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The format token is not exactly `P2` or `P3`
    #[error("bad magic number {found:?}: expected \"P2\" or \"P3\"")]
    BadMagic { found: String },

    /// Fewer integers than the header requires were present
    #[error("truncated input: missing {what}")]
    Truncated { what: String },

    /// The header fields are structurally invalid
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Standard I/O error while reading or writing an open stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the core library (e.g. sample count overflow)
    #[error("core error: {0}")]
    Core(#[from] pnmconv_core::Error),
}

impl IoError {
    /// Whether this error came from parsing the input rather than from
    /// the operating system.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            IoError::BadMagic { .. } | IoError::Truncated { .. } | IoError::InvalidHeader(_)
        )
    }
}

/// Convenience alias for I/O results.
pub type IoResult<T> = Result<T, IoError>;
