//! Numbered regression checks

use crate::error::{TestError, TestResult};
use crate::regout_dir;
use pnmconv_core::Raster;
use std::fs;

/// Whether produced rasters are kept on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Checks only
    #[default]
    Compare,
    /// Checks, plus [`RegParams::write_raster`] saves into the regout dir
    Display,
}

impl RegTestMode {
    /// Read `REGTEST_MODE`; anything but `display` means compare.
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE") {
            Ok(v) if v.eq_ignore_ascii_case("display") => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// State of one regression test
///
/// Each `compare_*` call is one check with a 1-based index.  A failing
/// check is logged and recorded; the test keeps going.
pub struct RegParams {
    pub test_name: String,
    pub mode: RegTestMode,
    index: usize,
    failures: Vec<String>,
}

impl RegParams {
    /// Start a test named `test_name` (reported as `<test_name>_reg`).
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();
        if mode == RegTestMode::Display {
            let _ = fs::create_dir_all(regout_dir());
        }
        eprintln!("\n======== {}_reg ({:?}) ========", test_name, mode);

        Self {
            test_name: test_name.to_string(),
            mode,
            index: 0,
            failures: Vec::new(),
        }
    }

    /// Index of the most recent check.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn check(&mut self, ok: bool, what: &str, detail: impl FnOnce() -> String) -> bool {
        self.index += 1;
        if !ok {
            let msg = format!(
                "Failure in {}_reg: {} check {}: {}",
                self.test_name,
                what,
                self.index,
                detail()
            );
            eprintln!("{}", msg);
            self.failures.push(msg);
        }
        ok
    }

    /// Check `|expected - actual| <= delta`.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        let diff = (expected - actual).abs();
        self.check(diff <= delta, "value", || {
            format!(
                "expected {}, got {} (diff {} > delta {})",
                expected, actual, diff, delta
            )
        })
    }

    /// Check two rasters for equal header fields and identical samples.
    pub fn compare_raster(&mut self, expected: &Raster, actual: &Raster) -> bool {
        let header = |r: &Raster| (r.format(), r.dimensions(), r.max_sample());
        if header(expected) != header(actual) {
            return self.check(false, "raster", || {
                format!(
                    "header {:?} vs {:?}",
                    header(expected),
                    header(actual)
                )
            });
        }

        let mismatch = expected
            .samples()
            .iter()
            .zip(actual.samples())
            .position(|(a, b)| a != b);
        self.check(mismatch.is_none(), "raster", || {
            let i = mismatch.unwrap_or_default();
            let channels = expected.channels();
            let pixel = i / channels;
            let width = expected.width() as usize;
            format!(
                "sample at ({}, {}) channel {}: {} vs {}",
                pixel % width,
                pixel / width,
                i % channels,
                expected.samples()[i],
                actual.samples()[i]
            )
        })
    }

    /// Check two byte strings for equality.
    pub fn compare_strings(&mut self, expected: &[u8], actual: &[u8]) -> bool {
        self.check(expected == actual, "bytes", || {
            let first = expected
                .iter()
                .zip(actual)
                .position(|(a, b)| a != b)
                .unwrap_or(expected.len().min(actual.len()));
            format!(
                "lengths {} vs {}, first difference at byte {}",
                expected.len(),
                actual.len(),
                first
            )
        })
    }

    /// In display mode, save `raster` as `<test>.<NN>.<ext>` where `NN` is
    /// the index the next check will get.  Does nothing in compare mode.
    pub fn write_raster(&self, raster: &Raster) -> TestResult<()> {
        if !self.display() {
            return Ok(());
        }
        let path = regout_dir().join(format!(
            "{}.{:02}.{}",
            self.test_name,
            self.index + 1,
            raster.format().extension()
        ));
        pnmconv_io::write_raster(raster, &path).map_err(|source| TestError::RegOut {
            path: path.clone(),
            source,
        })?;
        eprintln!("Wrote: {}", path.display());
        Ok(())
    }

    /// Report the outcome; returns `true` if every check passed.
    pub fn cleanup(self) -> bool {
        let ok = self.failures.is_empty();
        if ok {
            eprintln!("SUCCESS: {}_reg ({} checks)\n", self.test_name, self.index);
        } else {
            eprintln!(
                "FAILURE: {}_reg ({} of {} checks failed)",
                self.test_name,
                self.failures.len(),
                self.index
            );
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
            eprintln!();
        }
        ok
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnmconv_core::SampleFormat;

    #[test]
    fn test_compare_values() {
        let mut rp = RegParams::new("values");
        assert!(rp.compare_values(100.0, 100.5, 1.0));
        assert!(rp.is_success());
        assert!(!rp.compare_values(100.0, 200.0, 0.0));
        assert!(!rp.is_success());
        assert_eq!(rp.failures().len(), 1);
        assert_eq!(rp.index(), 2);
    }

    #[test]
    fn test_compare_raster() {
        let a = Raster::from_samples(2, 1, SampleFormat::Gray, 255, vec![1, 2]).unwrap();
        let b = Raster::from_samples(2, 1, SampleFormat::Gray, 255, vec![1, 3]).unwrap();
        let c = Raster::from_samples(2, 1, SampleFormat::Gray, 15, vec![1, 2]).unwrap();
        let mut rp = RegParams::new("raster");
        assert!(rp.compare_raster(&a, &a.clone()));
        assert!(!rp.compare_raster(&a, &b));
        assert!(rp.failures()[0].contains("(1, 0)"));
        assert!(!rp.compare_raster(&a, &c));
        assert_eq!(rp.index(), 3);
    }

    #[test]
    fn test_compare_strings() {
        let mut rp = RegParams::new("strings");
        assert!(rp.compare_strings(b"P2\n", b"P2\n"));
        assert!(!rp.compare_strings(b"P2\n", b"P3\n"));
        assert!(rp.failures()[0].contains("byte 1"));
        assert!(!rp.cleanup());
    }
}
