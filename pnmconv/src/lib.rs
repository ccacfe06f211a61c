//! pnmconv - 3×3 convolution filters for plain-text rasters
//!
//! Reads a `P2` (grayscale) or `P3` (RGB) file, applies one of the preset
//! kernels and writes the result in the same format.
//!
//! # Overview
//!
//! - [`io`] - plain-text PNM decode and encode
//! - [`filter`] - kernels, the convolution engine and partition strategies
//! - [`dist`] - replicated filtering across a worker group
//! - [`driver`] - the decode, filter, encode pipeline
//!
//! # Example
//!
//! ```
//! use pnmconv::filter::{Kernel, PartitionStrategy, convolve};
//! use pnmconv::{Raster, SampleFormat};
//!
//! let input = Raster::from_samples(3, 1, SampleFormat::Gray, 255, vec![9, 9, 9]).unwrap();
//! let output = convolve(&input, &Kernel::blur(), PartitionStrategy::QuadrantSplit).unwrap();
//! assert_eq!(output.samples(), &[9, 9, 9]);
//! ```

pub mod driver;
mod error;

pub use driver::{
    BatchConfig, RunConfig, RunReport, filter_output_path, run_filter, run_filter_with, run_filters,
    run_filters_with,
};
pub use error::{CoreError, CoreResult};

// Re-export core types (primary data structures used everywhere)
pub use pnmconv_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use pnmconv_dist as dist;
pub use pnmconv_filter as filter;
pub use pnmconv_io as io;
