//! Error types for the hl-orchestrator crate.
//!
//! Only startup preconditions are errors. Everything that can go wrong inside
//! a cycle (resolution, compilation, spawning, unexpected exits) is reported
//! through `tracing` and recovered from at the orchestrator boundary.

use hl_core::ConfigError;
use hl_deps::{LocateError, ResolveError};

/// Fatal startup failures.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The project descriptor is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The runtime artifact was not found in any search path.
    #[error(transparent)]
    ArtifactNotFound(#[from] LocateError),

    /// The dependency resolver could not be set up.
    #[error(transparent)]
    Resolver(#[from] ResolveError),
}

impl OrchestratorError {
    /// A short hint for the operator, if one applies.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Config(ConfigError::MissingDescriptor(_)) => {
                Some("create a hotloop.json in the project root, or pass --project")
            }
            Self::ArtifactNotFound(_) => Some(
                "build the runtime first, or point HOTLOOP_RUNTIME_PATH / runtime.searchPaths at it",
            ),
            _ => None,
        }
    }
}
