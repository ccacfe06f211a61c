//! pnmconv-dist - replicated filtering across a worker group
//!
//! The coordinator decodes the input once and broadcasts it; every
//! participant filters the full image and writes its own output file; the
//! coordinator then gathers per-rank timing reports.
//!
//! - [`Collective`] - broadcast/gather seam, implemented in-process by
//!   [`ChannelGroup`] over `crossbeam-channel`
//! - [`run_replica`] - one participant of a run, given its endpoint
//! - [`run_local_group`] - a whole group on scoped threads

pub mod collective;
mod cputime;
mod error;
pub mod replicate;

pub use collective::{
    Broadcast, ChannelEndpoint, ChannelGroup, Collective, ROOT_RANK, WorkerReport,
};
pub use cputime::thread_cpu_time;
pub use error::{CoordinationError, CoordinationResult, ReplicaError, ReplicaResult};
pub use replicate::{GroupReport, Role, run_local_group, run_replica, worker_output_path};
