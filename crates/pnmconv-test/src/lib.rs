//! pnmconv-test - regression harness shared by the workspace's `*_reg` tests
//!
//! A regression test creates a [`RegParams`], records a sequence of
//! numbered checks, and asserts on [`RegParams::cleanup`] at the end, so one
//! run reports every failing check instead of stopping at the first.
//!
//! Set `REGTEST_MODE=display` to also keep the rasters a test produces under
//! `tests/regout/` for inspection; the default mode only checks.
//!
//! ```ignore
//! use pnmconv_test::{RegParams, load_test_image};
//!
//! let mut rp = RegParams::new("convolve");
//! let input = load_test_image("spike.pgm").unwrap();
//! rp.compare_values(5.0, input.width() as f64, 0.0);
//! assert!(rp.cleanup());
//! ```

mod error;
mod params;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

use pnmconv_core::Raster;
use std::path::PathBuf;

/// Decode a fixture from `tests/data/images`.
pub fn load_test_image(name: &str) -> TestResult<Raster> {
    pnmconv_io::read_raster(test_data_path(name)).map_err(|source| TestError::Fixture {
        name: name.to_string(),
        source,
    })
}

// crates/pnmconv-test -> workspace root
fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Path of a fixture in `tests/data/images`.
pub fn test_data_path(name: &str) -> PathBuf {
    workspace_root().join("tests/data/images").join(name)
}

/// Directory that display mode writes into.
pub fn regout_dir() -> PathBuf {
    workspace_root().join("tests/regout")
}
