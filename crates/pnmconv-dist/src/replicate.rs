//! Replicated filtering across a worker group
//!
//! Every participant filters the whole image and writes its own copy of
//! the result.  The group synchronizes twice: once when the coordinator
//! broadcasts the decoded input, once when the per-rank timings are
//! gathered back.  No pixel data flows back to the coordinator.

use crate::collective::{Broadcast, ChannelGroup, Collective, ROOT_RANK, WorkerReport};
use crate::cputime::thread_cpu_time;
use crate::{CoordinationError, ReplicaError, ReplicaResult};
use pnmconv_core::SampleFormat;
use pnmconv_filter::{Engine, FilterName, PartitionStrategy, Rounding};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What a participant does in a replicated run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Rank 0: decodes the input and parses the filter name
    Coordinator { input: PathBuf, filter: String },
    /// Any other rank: waits for the broadcast
    Worker,
}

impl Role {
    fn name(&self) -> &'static str {
        match self {
            Role::Coordinator { .. } => "coordinator",
            Role::Worker => "worker",
        }
    }
}

/// Summary of a completed replicated run, seen by the coordinator only
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub filter: FilterName,
    pub format: SampleFormat,
    pub width: u32,
    pub height: u32,
    /// One report per rank, ordered by rank
    pub reports: Vec<WorkerReport>,
    /// One output file per rank, ordered by rank
    pub outputs: Vec<PathBuf>,
}

impl GroupReport {
    /// Number of participants.
    pub fn size(&self) -> usize {
        self.reports.len()
    }

    /// Slowest participant's wall-clock time.
    pub fn max_elapsed(&self) -> Duration {
        self.reports
            .iter()
            .map(|r| r.elapsed)
            .max()
            .unwrap_or_default()
    }
}

/// Path of the file written by `rank`: `<prefix>_rank<rank>.<ext>`.
pub fn worker_output_path(prefix: &Path, rank: usize, format: SampleFormat) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!("_rank{}.{}", rank, format.extension()));
    PathBuf::from(name)
}

/// Run one participant of a replicated filter.
///
/// The coordinator decodes `input` and parses `filter`, then broadcasts
/// both.  Every rank runs the sequential engine on the full image, writes
/// its result to [`worker_output_path`] and sends a [`WorkerReport`].
///
/// Returns `Some` at the coordinator once every rank has reported, `None`
/// on workers.
///
/// # Errors
///
/// Any decode, filter, encode or coordination failure is fatal for this
/// participant.  Its endpoint should then be dropped so that blocked peers
/// fail too.
pub fn run_replica<C: Collective + ?Sized>(
    comm: &C,
    role: Role,
    output_prefix: &Path,
    rounding: Rounding,
) -> ReplicaResult<Option<GroupReport>> {
    let rank = comm.rank();
    if comm.is_root() != matches!(role, Role::Coordinator { .. }) {
        return Err(CoordinationError::RoleMismatch {
            rank,
            role: role.name(),
        }
        .into());
    }

    let payload = match role {
        Role::Coordinator { input, filter } => {
            let filter: FilterName = filter.parse()?;
            let raster = pnmconv_io::read_raster(&input)?;
            info!(
                input = %input.display(),
                width = raster.width(),
                height = raster.height(),
                format = raster.format().magic(),
                %filter,
                workers = comm.size(),
                "coordinator decoded input"
            );
            Some(Broadcast { filter, raster })
        }
        Role::Worker => None,
    };

    let shared = comm.broadcast(payload)?;
    debug!(rank, "received input");

    let start = Instant::now();
    let cpu_start = thread_cpu_time();
    let output = Engine::new(shared.filter.kernel())
        .with_rounding(rounding)
        .apply(
            &shared.raster,
            PartitionStrategy::DistributeReplicate {
                workers: comm.size(),
            },
        )?;
    let cpu_time = thread_cpu_time()
        .zip(cpu_start)
        .map(|(end, begin)| end.saturating_sub(begin));
    let elapsed = start.elapsed();
    let path = worker_output_path(output_prefix, rank, output.format());
    pnmconv_io::write_raster(&output, &path)?;
    let report = WorkerReport {
        rank,
        elapsed,
        cpu_time,
        samples_written: output.samples().len(),
    };
    debug!(rank, path = %path.display(), elapsed = ?report.elapsed, "replica written");

    let Some(reports) = comm.gather(report)? else {
        return Ok(None);
    };
    for r in &reports {
        info!(
            rank = r.rank,
            elapsed = ?r.elapsed,
            cpu_time = ?r.cpu_time,
            samples = r.samples_written,
            "worker timing"
        );
    }
    let outputs = reports
        .iter()
        .map(|r| worker_output_path(output_prefix, r.rank, output.format()))
        .collect();
    Ok(Some(GroupReport {
        filter: shared.filter,
        format: output.format(),
        width: output.width(),
        height: output.height(),
        reports,
        outputs,
    }))
}

/// Run a whole group of `size` participants in this process.
///
/// The coordinator runs on the calling thread, workers on scoped threads.
///
/// # Errors
///
/// Returns the error that caused the group to fail:
///
/// - the coordinator's own error when it failed before gathering (decode,
///   unknown filter, encode of its copy)
/// - otherwise the lowest-ranked worker's error, in place of the
///   coordinator's resulting gather failure
///
/// Outputs already written by other ranks are left in place.
pub fn run_local_group(
    size: usize,
    input: &Path,
    output_prefix: &Path,
    filter: &str,
    rounding: Rounding,
) -> ReplicaResult<GroupReport> {
    let mut endpoints = ChannelGroup::new(size)?.into_endpoints().into_iter();
    let root = endpoints
        .next()
        .ok_or(CoordinationError::InvalidGroupSize(size))?;

    let role = Role::Coordinator {
        input: input.to_path_buf(),
        filter: filter.to_string(),
    };

    thread::scope(|s| {
        let workers: Vec<_> = endpoints
            .map(|endpoint| {
                let rank = endpoint.rank();
                let handle =
                    s.spawn(move || run_replica(&endpoint, Role::Worker, output_prefix, rounding));
                (rank, handle)
            })
            .collect();

        let root_result = run_replica(&root, role, output_prefix, rounding);
        // Workers still waiting on the broadcast unblock once this is gone.
        drop(root);

        let mut worker_error = None;
        for (rank, handle) in workers {
            let result = match handle.join() {
                Ok(result) => result,
                Err(_) => Err(ReplicaError::WorkerPanicked { rank }),
            };
            if let Err(e) = result {
                debug!(rank, error = %e, "worker failed");
                if worker_error.is_none() {
                    worker_error = Some(e);
                }
            }
        }

        let report = match (root_result, worker_error) {
            (Err(e), Some(worker)) if e.is_peer_failure() => return Err(worker),
            (Err(e), _) => return Err(e),
            (Ok(_), Some(worker)) => return Err(worker),
            (Ok(report), None) => report,
        };
        report.ok_or_else(|| {
            ReplicaError::from(CoordinationError::RoleMismatch {
                rank: ROOT_RANK,
                role: "coordinator",
            })
        })
    })
}
