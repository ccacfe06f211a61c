//! Decode, filter, encode
//!
//! [`run_filter_with`] applies one preset.  Shared-memory strategies write
//! one output file; the replicated strategy treats the output path as a
//! prefix and writes one file per rank.
//!
//! [`run_filters_with`] applies several presets to one input and writes
//! `<prefix>_<name>.<ext>` for each.

use crate::CoreResult;
use pnmconv_core::{Raster, SampleFormat};
use pnmconv_dist::{WorkerReport, run_local_group};
use pnmconv_filter::{Engine, FilterName, PartitionStrategy, Rounding};
use rayon::prelude::*;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// Everything one run needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub input: PathBuf,
    /// Output file, or output prefix for [`PartitionStrategy::DistributeReplicate`]
    pub output: PathBuf,
    /// One of `blur`, `laplace`, `sharpen`
    pub filter: String,
    pub strategy: PartitionStrategy,
    pub rounding: Rounding,
}

impl RunConfig {
    /// A sequential run with the default rounding rule.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, filter: &str) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            filter: filter.to_string(),
            strategy: PartitionStrategy::Sequential,
            rounding: Rounding::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: PartitionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }
}

/// What a completed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub filter: FilterName,
    pub strategy: PartitionStrategy,
    pub width: u32,
    pub height: u32,
    /// Filtering wall-clock time; the slowest rank in replicated mode
    pub elapsed: Duration,
    /// Files written, in rank order for replicated runs
    pub outputs: Vec<PathBuf>,
    /// Per-rank reports, empty unless replicated
    pub workers: Vec<WorkerReport>,
}

/// Filter `input` into `output` sequentially with the default rounding.
///
/// # Errors
///
/// Returns [`crate::CoreError`] if the filter name is unknown, the input
/// cannot be decoded, or the output cannot be written.  Nothing is written
/// unless filtering succeeded.
pub fn run_filter<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    filter_name: &str,
) -> CoreResult<()> {
    let config = RunConfig::new(input.as_ref(), output.as_ref(), filter_name);
    run_filter_with(&config).map(|_| ())
}

/// Run a configured filter pass.
pub fn run_filter_with(config: &RunConfig) -> CoreResult<RunReport> {
    if let PartitionStrategy::DistributeReplicate { workers } = config.strategy {
        let group = run_local_group(
            workers,
            &config.input,
            &config.output,
            &config.filter,
            config.rounding,
        )?;
        info!(
            workers = group.size(),
            slowest = ?group.max_elapsed(),
            "replicated run complete"
        );
        return Ok(RunReport {
            filter: group.filter,
            strategy: config.strategy,
            width: group.width,
            height: group.height,
            elapsed: group.max_elapsed(),
            outputs: group.outputs,
            workers: group.reports,
        });
    }

    let filter: FilterName = config.filter.parse()?;
    let input = pnmconv_io::read_raster(&config.input)?;
    info!(
        input = %config.input.display(),
        width = input.width(),
        height = input.height(),
        format = input.format().magic(),
        "decoded input"
    );

    let start = Instant::now();
    let output = Engine::new(filter.kernel())
        .with_rounding(config.rounding)
        .apply(&input, config.strategy)?;
    let elapsed = start.elapsed();
    info!(%filter, strategy = config.strategy.name(), ?elapsed, "filtered");

    pnmconv_io::write_raster(&output, &config.output)?;
    info!(output = %config.output.display(), "wrote output");

    Ok(RunReport {
        filter,
        strategy: config.strategy,
        width: output.width(),
        height: output.height(),
        elapsed,
        outputs: vec![config.output.clone()],
        workers: Vec::new(),
    })
}

/// A run of several presets over one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub input: PathBuf,
    /// Output prefix; each preset writes `<prefix>_<name>.<ext>`
    pub prefix: PathBuf,
    /// Presets to apply; empty means all of them
    pub filters: Vec<FilterName>,
    pub strategy: PartitionStrategy,
    pub rounding: Rounding,
}

impl BatchConfig {
    /// Every preset, sequentially, with the default rounding rule.
    pub fn new(input: impl Into<PathBuf>, prefix: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            prefix: prefix.into(),
            filters: FilterName::ALL.to_vec(),
            strategy: PartitionStrategy::Sequential,
            rounding: Rounding::default(),
        }
    }

    pub fn with_filters(mut self, filters: &[FilterName]) -> Self {
        self.filters = filters.to_vec();
        self
    }

    pub fn with_strategy(mut self, strategy: PartitionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// The presets to run, duplicates removed, in first-seen order.
    pub fn presets(&self) -> Vec<FilterName> {
        if self.filters.is_empty() {
            return FilterName::ALL.to_vec();
        }
        let mut presets = Vec::with_capacity(self.filters.len());
        for &filter in &self.filters {
            if !presets.contains(&filter) {
                presets.push(filter);
            }
        }
        presets
    }
}

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Path written for one preset of a batch: `<prefix>_<name>.<ext>`.
pub fn filter_output_path(prefix: &Path, filter: FilterName, format: SampleFormat) -> PathBuf {
    suffixed(prefix, &format!("_{}.{}", filter, format.extension()))
}

/// Apply `filters` (all presets if empty) to `input` sequentially.
///
/// Returns the written paths in preset order.
///
/// # Errors
///
/// Same as [`run_filters_with`].
pub fn run_filters<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    prefix: Q,
    filters: &[FilterName],
) -> CoreResult<Vec<PathBuf>> {
    let config = BatchConfig::new(input.as_ref(), prefix.as_ref()).with_filters(filters);
    let reports = run_filters_with(&config)?;
    Ok(reports.into_iter().flat_map(|r| r.outputs).collect())
}

/// Run a configured batch, one [`RunReport`] per preset.
///
/// The input is decoded once and the presets are filtered concurrently on
/// the rayon pool, each with the configured strategy.  Nothing is written
/// until every preset has been filtered.  With
/// [`PartitionStrategy::DistributeReplicate`] each preset instead runs its
/// own worker group with prefix `<prefix>_<name>`.
///
/// # Errors
///
/// Returns [`crate::CoreError`] if the input cannot be decoded, filtering
/// fails, or an output cannot be written.  Outputs written before a write
/// failure are left in place.
pub fn run_filters_with(config: &BatchConfig) -> CoreResult<Vec<RunReport>> {
    let presets = config.presets();

    if let PartitionStrategy::DistributeReplicate { .. } = config.strategy {
        return presets
            .iter()
            .map(|&filter| {
                let run = RunConfig::new(
                    &config.input,
                    suffixed(&config.prefix, &format!("_{}", filter)),
                    filter.as_str(),
                )
                .with_strategy(config.strategy)
                .with_rounding(config.rounding);
                run_filter_with(&run)
            })
            .collect();
    }

    let input = pnmconv_io::read_raster(&config.input)?;
    info!(
        input = %config.input.display(),
        width = input.width(),
        height = input.height(),
        format = input.format().magic(),
        presets = presets.len(),
        "decoded input"
    );

    let filtered = presets
        .par_iter()
        .map(|&filter| -> CoreResult<(FilterName, Raster, Duration)> {
            let start = Instant::now();
            let output = Engine::new(filter.kernel())
                .with_rounding(config.rounding)
                .apply(&input, config.strategy)?;
            let elapsed = start.elapsed();
            info!(%filter, strategy = config.strategy.name(), ?elapsed, "filtered");
            Ok((filter, output, elapsed))
        })
        .collect::<CoreResult<Vec<_>>>()?;

    filtered
        .into_iter()
        .map(|(filter, output, elapsed)| -> CoreResult<RunReport> {
            let path = filter_output_path(&config.prefix, filter, output.format());
            pnmconv_io::write_raster(&output, &path)?;
            info!(%filter, output = %path.display(), "wrote output");
            Ok(RunReport {
                filter,
                strategy: config.strategy,
                width: output.width(),
                height: output.height(),
                elapsed,
                outputs: vec![path],
                workers: Vec::new(),
            })
        })
        .collect()
}
