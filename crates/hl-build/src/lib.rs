//! Build pipeline for the hotloop development loop.
//!
//! A build discovers every source file under the source root with
//! [`SourceWalker`] and compiles them in one invocation of the external
//! [`Compiler`]. [`BuildPipeline`] ties the two together behind the
//! [`Pipeline`] trait used by the orchestrator.
//!
//! Failures are values, not errors: [`Pipeline::build`] always returns a
//! [`BuildResult`](hl_core::BuildResult), with
//! [`FailureKind`](hl_core::FailureKind) telling an empty source tree, a
//! rejected compile, and an unusable toolchain apart.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod compiler;
pub mod error;
pub mod pipeline;
pub mod walker;

pub use compiler::Compiler;
pub use error::BuildError;
pub use pipeline::{BuildPipeline, Pipeline};
pub use walker::SourceWalker;
