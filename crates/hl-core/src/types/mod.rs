//! Domain types shared across the hotloop workspace.
//!
//! - [`build`] - Build requests and results
//! - [`dependency`] - Dependency specs, repository coordinates, cached artifacts
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use hl_core::{BuildRequest, BuildResult, DependencySpec};
//! ```

mod build;
mod dependency;

pub use build::{BuildFailure, BuildRequest, BuildResult, FailureKind};
pub use dependency::{CachedArtifact, Coordinate, DependencySpec};
