//! Core types, errors, and configuration for the hotloop workspace.
//!
//! This crate provides the foundational types shared by every component of
//! the development loop:
//!
//! - [`ProjectConfig`] - the `hotloop.json` project descriptor
//! - [`ConfigError`] - descriptor loading and validation failures
//! - Build types ([`BuildRequest`], [`BuildResult`], [`BuildFailure`])
//! - Dependency types ([`DependencySpec`], [`Coordinate`], [`CachedArtifact`])
//!
//! # Crate Dependencies
//!
//! ```text
//! hl-cli ──► hl-orchestrator ──► hl-build ──────► hl-core
//!                          ├──► hl-supervisor ──►
//!                          ├──► hl-deps ────────►
//!                          └──► hl-watcher ─────►
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    DESCRIPTOR_FILE, ProjectConfig, RepositoryConfig, RuntimeConfig, WatchConfig,
};
pub use error::ConfigError;
pub use types::{
    BuildFailure, BuildRequest, BuildResult, CachedArtifact, Coordinate, DependencySpec,
    FailureKind,
};
