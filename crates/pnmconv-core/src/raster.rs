//! Raster - the decoded image container
//!
//! A `Raster` holds one plain-text portable image in memory: its
//! dimensions, sample format, declared maximum sample value and a flat
//! sample buffer.
//!
//! # Sample layout
//!
//! - Samples are stored row-major, top row first
//! - Within a pixel, channels are interleaved (R, G, B for RGB)
//! - The sample at `(x, y, c)` lives at `(y * width + x) * channels + c`
//!
//! # Ownership model
//!
//! Unlike a reference-counted image, a `Raster` has exactly one owner.
//! Filters never mutate their input; they build a fresh `Raster` for the
//! result, so the buffer is released when its owner goes out of scope.

use crate::error::{Error, Result};

/// Sample format of a raster
///
/// Derived from the two-character magic token of the on-disk format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Single channel grayscale (`P2`)
    Gray,
    /// Three channel RGB, interleaved per pixel (`P3`)
    Rgb,
}

impl SampleFormat {
    /// Parse a magic token.
    ///
    /// Returns `None` unless the token is exactly `"P2"` or `"P3"`.
    pub fn from_magic(magic: &str) -> Option<Self> {
        match magic {
            "P2" => Some(SampleFormat::Gray),
            "P3" => Some(SampleFormat::Rgb),
            _ => None,
        }
    }

    /// Get the magic token written at the head of an encoded image.
    pub fn magic(self) -> &'static str {
        match self {
            SampleFormat::Gray => "P2",
            SampleFormat::Rgb => "P3",
        }
    }

    /// Number of samples per pixel.
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            SampleFormat::Gray => 1,
            SampleFormat::Rgb => 3,
        }
    }

    /// Conventional file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            SampleFormat::Gray => "pgm",
            SampleFormat::Rgb => "ppm",
        }
    }
}

/// Decoded image
///
/// # Examples
///
/// ```
/// use pnmconv_core::{Raster, SampleFormat};
///
/// let raster = Raster::new(4, 3, SampleFormat::Rgb, 255).unwrap();
/// assert_eq!(raster.channels(), 3);
/// assert_eq!(raster.samples().len(), 4 * 3 * 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    /// Grayscale or RGB
    format: SampleFormat,
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Declared maximum sample value, used to clamp filter output
    max_sample: i32,
    /// Row-major, channel-interleaved samples
    samples: Vec<i32>,
}

impl Raster {
    /// Create a zero-filled raster.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if either dimension is zero and
    /// [`Error::Overflow`] if the sample count does not fit in `usize`.
    pub fn new(width: u32, height: u32, format: SampleFormat, max_sample: i32) -> Result<Self> {
        let count = Self::sample_count(width, height, format)?;
        Ok(Raster {
            format,
            width,
            height,
            max_sample,
            samples: vec![0; count],
        })
    }

    /// Wrap an existing sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SampleCountMismatch`] unless
    /// `samples.len() == width * height * channels`.
    pub fn from_samples(
        width: u32,
        height: u32,
        format: SampleFormat,
        max_sample: i32,
        samples: Vec<i32>,
    ) -> Result<Self> {
        let expected = Self::sample_count(width, height, format)?;
        if samples.len() != expected {
            return Err(Error::SampleCountMismatch {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Raster {
            format,
            width,
            height,
            max_sample,
            samples,
        })
    }

    /// Compute `width * height * channels`, checking for overflow.
    pub fn sample_count(width: u32, height: u32, format: SampleFormat) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let channels = format.channels();
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels))
            .ok_or(Error::Overflow {
                width,
                height,
                channels,
            })
    }

    /// Get the sample format.
    #[inline]
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Get the width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Get the declared maximum sample value.
    #[inline]
    pub fn max_sample(&self) -> i32 {
        self.max_sample
    }

    /// Samples per pixel (1 or 3).
    #[inline]
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Samples per row (`width * channels`).
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels()
    }

    /// Get the sample buffer.
    #[inline]
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    /// Get mutable access to the sample buffer.
    ///
    /// The buffer length is fixed, so the sample-count invariant holds.
    #[inline]
    pub fn samples_mut(&mut self) -> &mut [i32] {
        &mut self.samples
    }

    /// Consume the raster and return its sample buffer.
    pub fn into_samples(self) -> Vec<i32> {
        self.samples
    }

    /// Buffer index of sample `(x, y, c)`, without bounds checks.
    #[inline]
    pub fn sample_index(&self, x: u32, y: u32, c: usize) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels() + c
    }

    /// Get sample `(x, y, c)`.
    ///
    /// Returns `None` if the coordinate or channel is out of range.
    #[inline]
    pub fn get(&self, x: u32, y: u32, c: usize) -> Option<i32> {
        if x >= self.width || y >= self.height || c >= self.channels() {
            return None;
        }
        Some(self.samples[self.sample_index(x, y, c)])
    }

    /// Set sample `(x, y, c)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if the coordinate or channel is
    /// out of range.
    pub fn set(&mut self, x: u32, y: u32, c: usize, value: i32) -> Result<()> {
        if x >= self.width || y >= self.height || c >= self.channels() {
            return Err(Error::IndexOutOfBounds {
                x,
                y,
                c,
                width: self.width,
                height: self.height,
                channels: self.channels(),
            });
        }
        let idx = self.sample_index(x, y, c);
        self.samples[idx] = value;
        Ok(())
    }
}
