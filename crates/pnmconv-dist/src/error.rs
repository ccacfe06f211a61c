//! Error types for pnmconv-dist

use thiserror::Error;

/// Errors raised by the broadcast and gather steps
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinationError {
    /// The broadcast payload never reached this rank
    #[error("broadcast failed on rank {rank}: coordinator is gone")]
    BroadcastFailed { rank: usize },

    /// The coordinator could not hand the payload to a worker
    #[error("broadcast failed: worker {rank} is gone")]
    WorkerUnreachable { rank: usize },

    /// Not every participant delivered its report
    #[error("gather failed: received {received} of {expected} reports")]
    GatherFailed { expected: usize, received: usize },

    /// A group must have at least the coordinator
    #[error("invalid group size {0}: need at least one participant")]
    InvalidGroupSize(usize),

    /// A participant was asked to play the wrong part for its rank
    #[error("rank {rank} cannot act as {role}")]
    RoleMismatch { rank: usize, role: &'static str },
}

/// Errors from one participant of a replicated run
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// Decoding the input or encoding this rank's output failed
    #[error(transparent)]
    Io(#[from] pnmconv_io::IoError),

    /// Filter lookup or filtering failed
    #[error(transparent)]
    Filter(#[from] pnmconv_filter::FilterError),

    /// Broadcast or gather failed
    #[error(transparent)]
    Coordination(#[from] CoordinationError),

    /// A worker thread panicked before reporting
    #[error("worker {rank} panicked")]
    WorkerPanicked { rank: usize },
}

impl ReplicaError {
    /// Whether this participant failed only because a peer went away.
    ///
    /// True for the coordinator's broadcast to a departed worker and its
    /// gather of an incomplete report set.
    pub fn is_peer_failure(&self) -> bool {
        matches!(
            self,
            ReplicaError::Coordination(
                CoordinationError::WorkerUnreachable { .. } | CoordinationError::GatherFailed { .. }
            )
        )
    }
}

/// Result type for coordination steps
pub type CoordinationResult<T> = Result<T, CoordinationError>;

/// Result type for replicated runs
pub type ReplicaResult<T> = Result<T, ReplicaError>;
