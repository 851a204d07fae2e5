//! Error types for the hl-supervisor crate.

use crate::supervisor::SlotState;

/// Errors raised by the [`Supervisor`](crate::Supervisor).
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// The worker process could not be started. The slot stays absent.
    #[error("failed to start worker `{program}`: {source}")]
    Spawn {
        /// The launcher program.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An operation was requested from a state that doesn't allow it.
    #[error("cannot {operation} worker while {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The slot state at the time.
        state: SlotState,
    },

    /// A classpath entry contains the platform path separator.
    #[error("invalid worker classpath: {0}")]
    Classpath(#[from] std::env::JoinPathsError),

    /// A termination request could not be delivered.
    #[error("failed to terminate worker {pid}: {source}")]
    Terminate {
        /// The worker process id.
        pid: u32,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
