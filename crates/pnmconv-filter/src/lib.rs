//! pnmconv-filter - 3×3 convolution over plain-text rasters
//!
//! This crate provides:
//!
//! - [`Kernel`] - A fixed 3×3 weight matrix and the named presets
//!   (blur, laplace edge detection, sharpen)
//! - [`Engine`] - Applies a kernel to a raster with border
//!   renormalization, rounding and clamping
//! - [`PartitionStrategy`] / [`Partition`] - How the work is divided across
//!   concurrent units and how each unit's output window is carved out of
//!   the shared output buffer

pub mod convolve;
mod error;
pub mod kernel;
pub mod partition;

pub use error::{FilterError, FilterResult};
pub use kernel::{FilterName, Kernel};

// Re-export commonly used items
pub use convolve::{Engine, Rounding, convolve, convolve_region, filter_sample};
pub use partition::{Partition, PartitionStrategy, Region, quadrants, verify_cover};
