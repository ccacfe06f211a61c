//! pnmconv-io - plain-text raster I/O
//!
//! Decodes `P2`/`P3` files into [`Raster`] values and encodes them back.
//! The stream-level codec lives in [`pnm`]; this module adds the path and
//! in-memory entry points used by the driver and the worker group.

mod error;
pub mod pnm;

pub use error::{IoError, IoResult};
pub use pnm::{PnmHeader, SAMPLES_PER_LINE, read_pnm, read_pnm_header, write_pnm};

use pnmconv_core::Raster;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::debug;

/// Read a raster from a file path.
///
/// # Errors
///
/// Returns [`IoError::CannotOpen`] if the file cannot be opened, otherwise
/// any decode error from [`read_pnm`].
pub fn read_raster<P: AsRef<Path>>(path: P) -> IoResult<Raster> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IoError::CannotOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let raster = read_pnm(BufReader::new(file))?;
    debug!(
        path = %path.display(),
        format = raster.format().magic(),
        width = raster.width(),
        height = raster.height(),
        "decoded raster"
    );
    Ok(raster)
}

/// Write a raster to a file path.
///
/// The destination is created or truncated.  On failure the destination
/// is left in whatever state the failed write produced.
///
/// # Errors
///
/// Returns [`IoError::CannotOpen`] if the destination cannot be created.
pub fn write_raster<P: AsRef<Path>>(raster: &Raster, path: P) -> IoResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| IoError::CannotOpen {
        path: path.to_path_buf(),
        source,
    })?;
    write_pnm(raster, BufWriter::new(file))?;
    debug!(path = %path.display(), samples = raster.samples().len(), "encoded raster");
    Ok(())
}

/// Decode a raster from an in-memory buffer.
pub fn decode_bytes(data: &[u8]) -> IoResult<Raster> {
    read_pnm(data)
}

/// Encode a raster into a new buffer.
pub fn encode_to_vec(raster: &Raster) -> IoResult<Vec<u8>> {
    let mut out = Vec::new();
    write_pnm(raster, &mut out)?;
    Ok(out)
}
