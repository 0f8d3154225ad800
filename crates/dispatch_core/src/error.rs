//! Error types for the dispatch core.
//!
//! Propagation policy: per-booking and per-station failures are isolated
//! inside a pass (logged and counted, never escalated); solver failures
//! degrade the pass (matching falls back to greedy, rebalancing skips the
//! cycle); only world-state corruption aborts the surrounding call.

use thiserror::Error;

/// Failure of the assignment or transportation solver boundary.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("solver reported the problem infeasible")]
    Infeasible,
    #[error("solver failed: {0}")]
    Failed(String),
}

/// Failure while reading a booking source.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("failed to read booking source: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed booking record: {0}")]
    Parse(String),
}

impl From<csv::Error> for IngestionError {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => IngestionError::Io(io),
            other => IngestionError::Parse(format!("{other:?}")),
        }
    }
}

/// Hard failures surfaced to the driver's caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The world handle is malformed (missing vehicles, absent positions).
    /// Raised while snapshotting, before the failing pass mutates anything.
    #[error("invalid world state: {0}")]
    InvalidWorldState(String),
    /// The booking source became unreadable. The tick still ran on the
    /// bookings already queued; the caller decides whether to continue.
    #[error(transparent)]
    BookingIngestion(#[from] IngestionError),
}
