//! pnmconv core - basic data structures for plain-text raster filtering
//!
//! This crate provides the fundamental data structures used throughout
//! the pnmconv workspace:
//!
//! - [`Raster`] - A decoded image: dimensions, sample format, maximum
//!   sample value, and a flat channel-interleaved sample buffer
//! - [`SampleFormat`] - Grayscale (`P2`) or RGB (`P3`)
//! - [`Rect`] - Half-open pixel rectangle used to describe units of work

pub mod error;
pub mod raster;
pub mod rect;

pub use error::{Error, Result};
pub use raster::{Raster, SampleFormat};
pub use rect::Rect;
