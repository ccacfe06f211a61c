//! Error types for pnmconv-core
//!
//! Raster construction and sample access are the only fallible
//! operations here; every variant carries the geometry that was rejected.

use thiserror::Error;

/// pnmconv core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid image dimensions
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Sample buffer does not match the declared geometry
    #[error("sample count mismatch: expected {expected}, got {actual}")]
    SampleCountMismatch { expected: usize, actual: usize },

    /// `width * height * channels` does not fit in memory indices
    #[error("image too large: {width}x{height}x{channels} samples overflow")]
    Overflow {
        width: u32,
        height: u32,
        channels: usize,
    },

    /// Index out of bounds
    #[error("index out of bounds: ({x}, {y}, {c}) in {width}x{height}x{channels}")]
    IndexOutOfBounds {
        x: u32,
        y: u32,
        c: usize,
        width: u32,
        height: u32,
        channels: usize,
    },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
