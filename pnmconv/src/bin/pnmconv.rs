//! pnmconv CLI - apply a 3×3 filter to a PGM/PPM file
//!
//! ```text
//! pnmconv input.pgm output.pgm --f blur
//! pnmconv input.ppm out --f sharpen --strategy replicate --workers 4
//! pnmconv input.ppm out            # out_blur.ppm, out_laplace.ppm, out_sharpen.ppm
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pnmconv::filter::{PartitionStrategy, Rounding};
use pnmconv::{BatchConfig, RunConfig, RunReport, run_filter_with, run_filters_with};

/// Apply a 3×3 convolution filter to a plain-text PGM (P2) or PPM (P3) image.
#[derive(Parser, Debug)]
#[command(name = "pnmconv")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input image file (P2 or P3)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file, or output prefix without --f or with --strategy replicate
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Filter to apply: blur, laplace or sharpen.  Without it every filter
    /// runs and OUTPUT is a prefix.
    #[arg(long = "f", short = 'f', visible_alias = "filter", value_name = "FILTER")]
    filter: Option<String>,

    /// How the work is divided
    #[arg(long, value_enum, default_value = "sequential")]
    strategy: StrategyArg,

    /// Number of participants for --strategy replicate
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1024))]
    workers: Option<u32>,

    /// How normalized values are rounded to integers
    #[arg(long, value_enum, default_value = "nearest")]
    rounding: RoundingArg,

    /// Show debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Single pass on one thread
    Sequential,
    /// Four quadrants, one thread each
    Quadrant,
    /// Row bands on the rayon thread pool
    Parallel,
    /// Every worker filters the whole image and writes its own copy
    Replicate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoundingArg {
    /// Drop the fractional part
    Truncate,
    /// Round half away from zero
    Nearest,
}

impl From<RoundingArg> for Rounding {
    fn from(arg: RoundingArg) -> Self {
        match arg {
            RoundingArg::Truncate => Rounding::Truncate,
            RoundingArg::Nearest => Rounding::HalfAwayFromZero,
        }
    }
}

const DEFAULT_WORKERS: usize = 4;

impl Args {
    fn strategy(&self) -> PartitionStrategy {
        match self.strategy {
            StrategyArg::Sequential => PartitionStrategy::Sequential,
            StrategyArg::Quadrant => PartitionStrategy::QuadrantSplit,
            StrategyArg::Parallel => PartitionStrategy::DataParallel,
            StrategyArg::Replicate => PartitionStrategy::DistributeReplicate {
                workers: self.workers.map_or(DEFAULT_WORKERS, |w| w as usize),
            },
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.workers.is_some() && !matches!(args.strategy, StrategyArg::Replicate) {
        warn!(strategy = ?args.strategy, "--workers only applies to --strategy replicate");
    }

    let reports = match &args.filter {
        Some(filter) => {
            let config = RunConfig::new(&args.input, &args.output, filter)
                .with_strategy(args.strategy())
                .with_rounding(args.rounding.into());
            let report = run_filter_with(&config).with_context(|| {
                format!("failed to apply {} to {}", filter, args.input.display())
            })?;
            vec![report]
        }
        None => {
            let config = BatchConfig::new(&args.input, &args.output)
                .with_strategy(args.strategy())
                .with_rounding(args.rounding.into());
            run_filters_with(&config).with_context(|| {
                format!("failed to apply the filters to {}", args.input.display())
            })?
        }
    };

    for report in &reports {
        print_report(report, &args);
    }
    Ok(())
}

fn print_report(report: &RunReport, args: &Args) {
    for path in &report.outputs {
        println!(
            "Applied {} to {} and saved to {}",
            report.filter,
            args.input.display(),
            path.display()
        );
    }
    for worker in &report.workers {
        match worker.cpu_time {
            Some(cpu) => println!(
                "Rank {}: CPU time = {:.6} s, wall time = {:.6} s",
                worker.rank,
                cpu.as_secs_f64(),
                worker.elapsed.as_secs_f64()
            ),
            None => println!(
                "Rank {}: wall time = {:.6} s",
                worker.rank,
                worker.elapsed.as_secs_f64()
            ),
        }
    }
}
