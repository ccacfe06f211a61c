//! Convolution kernels
//!
//! Defines the fixed 3×3 kernel and the three named presets.
//!
//! | Name      | Weights                              |
//! |-----------|--------------------------------------|
//! | `blur`    | all nine `1/9`                       |
//! | `laplace` | `[[0,-1,0],[-1,4,-1],[0,-1,0]]`      |
//! | `sharpen` | `[[0,-1,0],[-1,5,-1],[0,-1,0]]`      |

use crate::{FilterError, FilterResult};
use std::fmt;
use std::str::FromStr;

/// Side length of every kernel
pub const KERNEL_SIZE: usize = 3;

const BLUR_WEIGHT: f32 = 1.0 / 9.0;

/// A 3×3 convolution kernel
///
/// `rows[ky + 1][kx + 1]` is the weight applied to the neighbor at offset
/// `(kx, ky)` from the output pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    rows: [[f32; KERNEL_SIZE]; KERNEL_SIZE],
}

impl Kernel {
    /// Create a kernel from its rows, top row first.
    pub const fn from_rows(rows: [[f32; KERNEL_SIZE]; KERNEL_SIZE]) -> Self {
        Self { rows }
    }

    /// Create the box blur kernel (all weights `1/9`).
    pub const fn blur() -> Self {
        Self::from_rows([[BLUR_WEIGHT; KERNEL_SIZE]; KERNEL_SIZE])
    }

    /// Create the Laplacian edge detection kernel.
    ///
    /// Weights sum to zero at full support.
    pub const fn edge_detect() -> Self {
        Self::from_rows([[0.0, -1.0, 0.0], [-1.0, 4.0, -1.0], [0.0, -1.0, 0.0]])
    }

    /// Create the sharpening kernel.
    pub const fn sharpen() -> Self {
        Self::from_rows([[0.0, -1.0, 0.0], [-1.0, 5.0, -1.0], [0.0, -1.0, 0.0]])
    }

    /// Look up a preset by its filter name.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownFilter`] for anything other than
    /// `blur`, `laplace` or `sharpen`.
    pub fn by_name(name: &str) -> FilterResult<Self> {
        Ok(name.parse::<FilterName>()?.kernel())
    }

    /// Get the kernel rows.
    pub fn rows(&self) -> &[[f32; KERNEL_SIZE]; KERNEL_SIZE] {
        &self.rows
    }

    /// Weight for the neighbor at offset `(kx, ky)`, each in `-1..=1`.
    #[inline]
    pub fn weight(&self, kx: i32, ky: i32) -> f32 {
        self.rows[(ky + 1) as usize][(kx + 1) as usize]
    }

    /// Get the sum of all kernel weights.
    pub fn sum(&self) -> f32 {
        self.rows.iter().flatten().sum()
    }
}

/// Name of a preset filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterName {
    /// Box blur
    Blur,
    /// Laplacian edge detection
    Laplace,
    /// Sharpen
    Sharpen,
}

impl FilterName {
    /// All presets, in the order they are listed to users.
    pub const ALL: [FilterName; 3] = [FilterName::Blur, FilterName::Laplace, FilterName::Sharpen];

    /// The name as accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterName::Blur => "blur",
            FilterName::Laplace => "laplace",
            FilterName::Sharpen => "sharpen",
        }
    }

    /// The kernel for this preset.
    pub fn kernel(self) -> Kernel {
        match self {
            FilterName::Blur => Kernel::blur(),
            FilterName::Laplace => Kernel::edge_detect(),
            FilterName::Sharpen => Kernel::sharpen(),
        }
    }
}

impl FromStr for FilterName {
    type Err = FilterError;

    fn from_str(s: &str) -> FilterResult<Self> {
        FilterName::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| FilterError::UnknownFilter(s.to_string()))
    }
}

impl fmt::Display for FilterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
