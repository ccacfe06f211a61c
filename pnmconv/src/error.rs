//! Driver error type

use thiserror::Error;

/// Any failure of a driver run
#[derive(Debug, Error)]
pub enum CoreError {
    /// Decoding the input or encoding the output failed
    #[error(transparent)]
    Io(#[from] pnmconv_io::IoError),

    /// Filter lookup or filtering failed
    #[error(transparent)]
    Filter(#[from] pnmconv_filter::FilterError),

    /// A replicated run failed
    #[error(transparent)]
    Replica(#[from] pnmconv_dist::ReplicaError),
}

/// Result type for driver runs
pub type CoreResult<T> = Result<T, CoreError>;
