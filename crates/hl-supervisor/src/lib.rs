//! Process supervision for the hotloop worker.
//!
//! The [`Supervisor`] owns a single worker slot. [`Supervisor::start`]
//! launches the worker described by a [`WorkerSpec`];
//! [`Supervisor::stop`] races a graceful exit against the grace period and
//! force-terminates on timeout; [`Supervisor::wait_for_exit`] reports exits
//! the supervisor did not request.
//!
//! How termination requests are delivered depends on the host and is
//! captured by [`TerminationStrategy`].

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod supervisor;
pub mod termination;
pub mod worker;

pub use error::SupervisorError;
pub use supervisor::{DEFAULT_GRACE_PERIOD, SlotState, StopOutcome, Supervisor, WorkerExit};
pub use termination::TerminationStrategy;
pub use worker::{WorkerCommand, WorkerHandle, WorkerSpec};
