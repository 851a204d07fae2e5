//! Change orchestration for hotloop.
//!
//! [`Orchestrator::prepare`] resolves dependencies and locates the runtime
//! artifact once; [`Orchestrator::run`] then turns change events into
//! serialized rebuild-and-restart cycles:
//!
//! ```text
//!  change ──► guard free? ──no──► dropped (counted)
//!                │yes
//!                ▼
//!        reload descriptor ──► stop worker ──► build ──fail──► report, slot empty
//!                                                │ok
//!                                                ▼
//!                                  restart delay ──► start worker
//!                                                │
//!                                                ▼
//!                                          release guard
//! ```
//!
//! Worker exits that happen between cycles are reported as unexpected.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod cycle;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::OrchestratorError;
pub use orchestrator::Orchestrator;
pub use state::{CycleOutcome, OrchestratorState, RunSummary};
