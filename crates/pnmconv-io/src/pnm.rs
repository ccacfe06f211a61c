//! Plain-text PNM (Portable Any Map) format support
//!
//! Reads and writes the ASCII variants PGM (`P2`, grayscale) and
//! PPM (`P3`, RGB).  Binary variants (P4/P5/P6) are rejected as a bad
//! magic token.
//!
//! # Layout
//!
//! ```text
//! P2|P3
//! <width> <height>
//! <maxSample>
//! <width*height*channels integers>
//! ```
//!
//! On read, tokens may be separated by any whitespace, and `#` starts a
//! comment that runs to the end of the line.  Reading stops as soon as the
//! declared number of samples has been read; trailing bytes are ignored.
//!
//! On write, the header fields each get their own line and the samples are
//! written as space-separated integers, [`SAMPLES_PER_LINE`] per line.

use crate::{IoError, IoResult};
use pnmconv_core::{Raster, SampleFormat};
use std::io::{BufRead, Write};

/// Number of samples per output line when encoding
pub const SAMPLES_PER_LINE: usize = 12;

/// Upper bound on the up-front sample buffer reservation.
///
/// A header may claim more samples than the stream holds; the buffer
/// grows past this only as samples are actually read.
const INITIAL_SAMPLE_CAPACITY: usize = 1 << 20;

/// Whitespace-and-comment aware token scanner over a buffered reader.
struct Tokens<R> {
    reader: R,
}

impl<R: BufRead> Tokens<R> {
    fn new(reader: R) -> Self {
        Self { reader }
    }

    fn peek_byte(&mut self) -> IoResult<Option<u8>> {
        let buf = self.reader.fill_buf()?;
        Ok(buf.first().copied())
    }

    /// Skip whitespace and `#` comments.
    fn skip_separators(&mut self) -> IoResult<()> {
        while let Some(b) = self.peek_byte()? {
            if b.is_ascii_whitespace() {
                self.reader.consume(1);
            } else if b == b'#' {
                self.skip_line()?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn skip_line(&mut self) -> IoResult<()> {
        let mut discard = Vec::new();
        self.reader.read_until(b'\n', &mut discard)?;
        Ok(())
    }

    /// Read the next token, or `None` at end of input.
    fn next_token(&mut self) -> IoResult<Option<String>> {
        self.skip_separators()?;
        let mut token = Vec::new();
        while let Some(b) = self.peek_byte()? {
            if b.is_ascii_whitespace() || b == b'#' {
                break;
            }
            token.push(b);
            self.reader.consume(1);
        }
        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&token).into_owned()))
        }
    }

    /// Read the next token as a signed integer.
    ///
    /// A missing or non-numeric token is reported as truncation of `what`,
    /// the same way a scanf-style reader stops at the first bad field.
    fn next_int(&mut self, what: impl FnOnce() -> String) -> IoResult<i64> {
        match self.next_token()? {
            Some(tok) => tok.parse::<i64>().map_err(|_| IoError::Truncated {
                what: format!("{} (found {:?})", what(), tok),
            }),
            None => Err(IoError::Truncated { what: what() }),
        }
    }
}

/// Parsed PNM header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PnmHeader {
    /// Grayscale or RGB
    pub format: SampleFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Declared maximum sample value
    pub max_sample: i32,
}

impl PnmHeader {
    /// Number of samples the body must contain.
    pub fn sample_count(&self) -> IoResult<usize> {
        Ok(Raster::sample_count(self.width, self.height, self.format)?)
    }
}

fn read_header<R: BufRead>(tokens: &mut Tokens<R>) -> IoResult<PnmHeader> {
    let magic = tokens.next_token()?.unwrap_or_default();
    let format = SampleFormat::from_magic(&magic).ok_or(IoError::BadMagic { found: magic })?;

    let width = tokens.next_int(|| "width".to_string())?;
    let height = tokens.next_int(|| "height".to_string())?;
    let max_sample = tokens.next_int(|| "max sample value".to_string())?;

    let width = u32::try_from(width)
        .ok()
        .filter(|&w| w > 0)
        .ok_or_else(|| IoError::InvalidHeader(format!("width must be positive, got {}", width)))?;
    let height = u32::try_from(height)
        .ok()
        .filter(|&h| h > 0)
        .ok_or_else(|| {
            IoError::InvalidHeader(format!("height must be positive, got {}", height))
        })?;
    let max_sample = i32::try_from(max_sample)
        .ok()
        .filter(|&m| m >= 0)
        .ok_or_else(|| {
            IoError::InvalidHeader(format!(
                "max sample value must be non-negative, got {}",
                max_sample
            ))
        })?;

    Ok(PnmHeader {
        format,
        width,
        height,
        max_sample,
    })
}

/// Read only the header of a plain-text PNM image.
pub fn read_pnm_header<R: BufRead>(reader: R) -> IoResult<PnmHeader> {
    read_header(&mut Tokens::new(reader))
}

/// Read a plain-text PNM image (P2/P3) from a reader.
///
/// # Errors
///
/// - [`IoError::BadMagic`] if the first token is not exactly `P2` or `P3`
/// - [`IoError::Truncated`] if a header field or any sample is missing
///   or not an integer
/// - [`IoError::InvalidHeader`] for non-positive dimensions or a negative
///   maximum sample value
pub fn read_pnm<R: BufRead>(reader: R) -> IoResult<Raster> {
    let mut tokens = Tokens::new(reader);
    let header = read_header(&mut tokens)?;
    let count = header.sample_count()?;

    let mut samples = Vec::with_capacity(count.min(INITIAL_SAMPLE_CAPACITY));
    for i in 0..count {
        let value = tokens.next_int(|| format!("sample {} of {}", i + 1, count))?;
        let value = i32::try_from(value).map_err(|_| IoError::Truncated {
            what: format!("sample {} of {} (out of range: {})", i + 1, count, value),
        })?;
        samples.push(value);
    }

    Ok(Raster::from_samples(
        header.width,
        header.height,
        header.format,
        header.max_sample,
        samples,
    )?)
}

/// Write a raster as plain-text PNM to a writer.
///
/// Chooses `P2` or `P3` from the raster's sample format.
///
/// # Arguments
/// * `raster` - The image to encode
/// * `writer` - Destination writer
pub fn write_pnm<W: Write>(raster: &Raster, mut writer: W) -> IoResult<()> {
    writeln!(writer, "{}", raster.format().magic())?;
    writeln!(writer, "{} {}", raster.width(), raster.height())?;
    writeln!(writer, "{}", raster.max_sample())?;

    for line in raster.samples().chunks(SAMPLES_PER_LINE) {
        for (i, value) in line.iter().enumerate() {
            if i > 0 {
                writer.write_all(b" ")?;
            }
            write!(writer, "{}", value)?;
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
