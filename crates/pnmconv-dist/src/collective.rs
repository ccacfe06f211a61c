//! Collective operations over a fixed group of participants
//!
//! Rank 0 is the coordinator.  It owns the only copy of the decoded input
//! until [`Collective::broadcast`] hands a shared reference to every rank,
//! and it is the only rank that sees the result of [`Collective::gather`].
//!
//! [`ChannelGroup`] implements the trait in-process over
//! `crossbeam-channel`.  A participant that fails simply drops its
//! endpoint; the peers blocked on it observe the disconnect as a
//! [`CoordinationError`] instead of waiting forever.

use crate::{CoordinationError, CoordinationResult};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use pnmconv_core::Raster;
use pnmconv_filter::FilterName;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Rank of the coordinator
pub const ROOT_RANK: usize = 0;

/// The one-to-many message: what to filter and with which preset
#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    pub filter: FilterName,
    pub raster: Raster,
}

/// Per-rank diagnostics sent back to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub rank: usize,
    /// Wall-clock time spent filtering
    pub elapsed: Duration,
    /// CPU time spent filtering, where the platform reports it per thread
    pub cpu_time: Option<Duration>,
    pub samples_written: usize,
}

/// Broadcast and gather across a group of ranks
pub trait Collective {
    /// This participant's rank, `0..size()`.
    fn rank(&self) -> usize;

    /// Number of participants, coordinator included.
    fn size(&self) -> usize;

    /// Whether this participant is the coordinator.
    fn is_root(&self) -> bool {
        self.rank() == ROOT_RANK
    }

    /// Distribute the coordinator's payload to every rank.
    ///
    /// The coordinator passes `Some`, every other rank passes `None`.  All
    /// ranks get the same shared payload back.
    fn broadcast(&self, payload: Option<Broadcast>) -> CoordinationResult<Arc<Broadcast>>;

    /// Collect one report per rank at the coordinator.
    ///
    /// The coordinator receives `Some` with all reports ordered by rank,
    /// every other rank receives `None`.
    fn gather(&self, report: WorkerReport) -> CoordinationResult<Option<Vec<WorkerReport>>>;
}

#[derive(Debug)]
enum Link {
    Root {
        payload_txs: Vec<(usize, Sender<Arc<Broadcast>>)>,
        report_rx: Receiver<WorkerReport>,
    },
    Worker {
        payload_rx: Receiver<Arc<Broadcast>>,
        report_tx: Sender<WorkerReport>,
    },
}

/// One participant's end of a [`ChannelGroup`]
#[derive(Debug)]
pub struct ChannelEndpoint {
    rank: usize,
    size: usize,
    link: Link,
}

impl Collective for ChannelEndpoint {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn broadcast(&self, payload: Option<Broadcast>) -> CoordinationResult<Arc<Broadcast>> {
        match (&self.link, payload) {
            (Link::Root { payload_txs, .. }, Some(payload)) => {
                let shared = Arc::new(payload);
                for (rank, tx) in payload_txs {
                    tx.send(Arc::clone(&shared))
                        .map_err(|_| CoordinationError::WorkerUnreachable { rank: *rank })?;
                }
                debug!(ranks = self.size, "broadcast sent");
                Ok(shared)
            }
            (Link::Worker { payload_rx, .. }, None) => payload_rx
                .recv()
                .map_err(|_| CoordinationError::BroadcastFailed { rank: self.rank }),
            (Link::Root { .. }, None) => Err(CoordinationError::RoleMismatch {
                rank: self.rank,
                role: "broadcast receiver",
            }),
            (Link::Worker { .. }, Some(_)) => Err(CoordinationError::RoleMismatch {
                rank: self.rank,
                role: "broadcast sender",
            }),
        }
    }

    fn gather(&self, report: WorkerReport) -> CoordinationResult<Option<Vec<WorkerReport>>> {
        match &self.link {
            Link::Root { report_rx, .. } => {
                let mut reports = Vec::with_capacity(self.size);
                reports.push(report);
                while reports.len() < self.size {
                    match report_rx.recv() {
                        Ok(r) => reports.push(r),
                        Err(_) => {
                            return Err(CoordinationError::GatherFailed {
                                expected: self.size,
                                received: reports.len(),
                            });
                        }
                    }
                }
                reports.sort_by_key(|r| r.rank);
                debug!(reports = reports.len(), "gather complete");
                Ok(Some(reports))
            }
            Link::Worker { report_tx, .. } => {
                report_tx
                    .send(report)
                    .map_err(|_| CoordinationError::GatherFailed {
                        expected: self.size,
                        received: 0,
                    })?;
                Ok(None)
            }
        }
    }
}

/// An in-process group of endpoints wired by channels
#[derive(Debug)]
pub struct ChannelGroup {
    endpoints: Vec<ChannelEndpoint>,
}

impl ChannelGroup {
    /// Wire up `size` endpoints.  Index `i` of the result has rank `i`.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::InvalidGroupSize`] if `size` is 0.
    pub fn new(size: usize) -> CoordinationResult<Self> {
        if size == 0 {
            return Err(CoordinationError::InvalidGroupSize(size));
        }

        // The coordinator holds no report sender, so the receiver
        // disconnects as soon as every worker is gone.
        let (report_tx, report_rx) = unbounded();
        let mut payload_txs = Vec::with_capacity(size - 1);
        let mut workers = Vec::with_capacity(size - 1);
        for rank in 1..size {
            let (tx, rx) = bounded(1);
            payload_txs.push((rank, tx));
            workers.push(ChannelEndpoint {
                rank,
                size,
                link: Link::Worker {
                    payload_rx: rx,
                    report_tx: report_tx.clone(),
                },
            });
        }
        drop(report_tx);

        let mut endpoints = Vec::with_capacity(size);
        endpoints.push(ChannelEndpoint {
            rank: ROOT_RANK,
            size,
            link: Link::Root {
                payload_txs,
                report_rx,
            },
        });
        endpoints.extend(workers);
        Ok(Self { endpoints })
    }

    /// Number of endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false: a group has at least the coordinator.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Take the endpoints, ordered by rank.
    pub fn into_endpoints(self) -> Vec<ChannelEndpoint> {
        self.endpoints
    }
}
