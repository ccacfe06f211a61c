//! Convolution operations
//!
//! Applies a 3×3 [`Kernel`] to a [`Raster`].
//!
//! # Border handling
//!
//! Neighbor taps that fall outside the image are skipped, not padded.
//! The weights of the taps actually used are summed, and the accumulated
//! value is divided by that partial sum when it is nonzero.  Kernels whose
//! weights sum to 1 (blur, sharpen) therefore stay unbiased at the border,
//! while a kernel whose full support sums to 0 (laplace) passes its raw
//! response through in the interior.
//!
//! # Determinism
//!
//! Each output sample depends only on the input raster, the kernel and the
//! rounding rule.  Taps are accumulated in `f32` in the same order
//! (`ky` outer, `kx` inner) no matter which unit computes the pixel, so
//! every [`PartitionStrategy`] produces identical output.

use crate::partition::{PartitionStrategy, Region};
use crate::{FilterError, FilterResult, Kernel};
use pnmconv_core::Raster;
use rayon::prelude::*;
use std::thread;
use tracing::debug;

/// How a normalized value is turned into an integer sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Drop the fractional part (round toward zero)
    Truncate,
    /// Round to nearest, halves away from zero
    #[default]
    HalfAwayFromZero,
}

impl Rounding {
    /// Round `value` to an integer.  NaN maps to 0, infinities saturate.
    #[inline]
    pub fn apply(self, value: f32) -> i64 {
        match self {
            Rounding::Truncate => value as i64,
            Rounding::HalfAwayFromZero => value.round() as i64,
        }
    }
}

/// Normalized filter response at `(x, y)` for channel `c`, before rounding.
///
/// The coordinate and channel must lie inside `input`.
pub fn filter_sample(input: &Raster, kernel: &Kernel, x: u32, y: u32, c: usize) -> f32 {
    let width = input.width() as i64;
    let height = input.height() as i64;
    let channels = input.channels();
    let samples = input.samples();

    let mut sum = 0.0f32;
    let mut weight_sum = 0.0f32;
    for ky in -1..=1 {
        let ny = y as i64 + ky as i64;
        if ny < 0 || ny >= height {
            continue;
        }
        for kx in -1..=1 {
            let nx = x as i64 + kx as i64;
            if nx < 0 || nx >= width {
                continue;
            }
            let idx = (ny * width + nx) as usize * channels + c;
            let w = kernel.weight(kx, ky);
            sum += samples[idx] as f32 * w;
            weight_sum += w;
        }
    }

    if weight_sum != 0.0 {
        sum / weight_sum
    } else {
        sum
    }
}

/// Round and clamp a normalized value into `[0, max_sample]`.
#[inline]
fn quantize(value: f32, rounding: Rounding, max_sample: i32) -> i32 {
    rounding.apply(value).min(max_sample as i64).max(0) as i32
}

/// Compute one output window.
///
/// Writes every sample of `region.rect()` and nothing else.
pub fn convolve_region(input: &Raster, kernel: &Kernel, rounding: Rounding, region: &mut Region<'_>) {
    let rect = region.rect();
    let channels = input.channels();
    let max_sample = input.max_sample();

    for (dy, row) in region.rows_mut().iter_mut().enumerate() {
        let y = rect.y + dy as u32;
        for dx in 0..rect.w {
            let x = rect.x + dx;
            let base = dx as usize * channels;
            for c in 0..channels {
                let value = filter_sample(input, kernel, x, y, c);
                row[base + c] = quantize(value, rounding, max_sample);
            }
        }
    }
}

/// Immutable description of one unit of work
///
/// Everything a concurrent unit needs is passed in explicitly: the shared
/// read-only input and kernel, and the unit's own output window.
struct Task<'a, 'b> {
    input: &'a Raster,
    kernel: &'a Kernel,
    rounding: Rounding,
    region: Region<'b>,
}

impl Task<'_, '_> {
    fn run(mut self) {
        convolve_region(self.input, self.kernel, self.rounding, &mut self.region);
    }
}

/// The filter engine: a kernel plus a rounding rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engine {
    kernel: Kernel,
    rounding: Rounding,
}

impl Engine {
    /// Create an engine with the default rounding rule.
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            rounding: Rounding::default(),
        }
    }

    /// Use a different rounding rule.
    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Get the kernel.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Get the rounding rule.
    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Filter `input` into a new raster.
    ///
    /// The result has the same format, dimensions and maximum sample value
    /// as `input`, which is left untouched.  The call returns once every
    /// unit has finished.
    ///
    /// # Errors
    ///
    /// - [`FilterError::OutOfMemory`] if the output buffer cannot be
    ///   allocated
    /// - [`FilterError::InvalidPartition`] if the planned partition does not
    ///   cover the image exactly once
    pub fn apply(&self, input: &Raster, strategy: PartitionStrategy) -> FilterResult<Raster> {
        let (width, height) = input.dimensions();
        let count = input.samples().len();

        let partition = strategy.plan(width, height);
        partition.verify(width, height)?;

        let mut out = Vec::new();
        out.try_reserve_exact(count)
            .map_err(|_| FilterError::OutOfMemory { samples: count })?;
        out.resize(count, 0);

        let tasks: Vec<Task<'_, '_>> = partition
            .split(&mut out, width, input.channels())
            .into_iter()
            .filter(|region| !region.rect().is_empty())
            .map(|region| Task {
                input,
                kernel: &self.kernel,
                rounding: self.rounding,
                region,
            })
            .collect();

        debug!(
            strategy = strategy.name(),
            width,
            height,
            channels = input.channels(),
            units = tasks.len(),
            "applying kernel"
        );

        match strategy {
            PartitionStrategy::Sequential | PartitionStrategy::DistributeReplicate { .. } => {
                tasks.into_iter().for_each(Task::run);
            }
            PartitionStrategy::QuadrantSplit => {
                thread::scope(|s| {
                    for task in tasks {
                        s.spawn(move || task.run());
                    }
                });
            }
            PartitionStrategy::DataParallel => {
                tasks.into_par_iter().for_each(Task::run);
            }
        }

        Ok(Raster::from_samples(
            width,
            height,
            input.format(),
            input.max_sample(),
            out,
        )?)
    }
}

/// Convolve a raster with the default rounding rule.
pub fn convolve(input: &Raster, kernel: &Kernel, strategy: PartitionStrategy) -> FilterResult<Raster> {
    Engine::new(*kernel).apply(input, strategy)
}
