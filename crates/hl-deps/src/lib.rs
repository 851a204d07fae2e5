//! Runtime artifact location and dependency resolution for hotloop.
//!
//! Both run once at startup and prepare the classpath used by the build
//! pipeline and the worker:
//!
//! - [`locate`] finds the runtime jar in an ordered list of directories. Not
//!   finding it is fatal.
//! - [`Resolver`] maps the descriptor's symbolic dependency names to Maven
//!   coordinates, downloads missing jars into `.hotloop/lib`, and reports a
//!   per-dependency outcome. Failures are never fatal.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐    expand    ┌──────────────┐
//! │ dependencies (map) │ ───────────► │   registry   │
//! └────────────────────┘              └──────┬───────┘
//!                                            │ coordinates
//!                                            ▼
//!                        cache hit    ┌──────────────┐   miss   ┌──────────────┐
//!                     ◄────────────── │   Resolver   │ ───────► │ArtifactSource│
//!                                     └──────┬───────┘          └──────┬───────┘
//!                                            │                         │ stream
//!                                            ▼                         ▼
//!                                     ┌──────────────────────────────────────┐
//!                                     │ ArtifactCache (temp file + rename)   │
//!                                     └──────────────────────────────────────┘
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod locator;
pub mod registry;
pub mod resolver;
pub mod source;

pub use cache::{ArtifactCache, PendingArtifact};
pub use error::{FailureCategory, LocateError, ResolveError};
pub use locator::{ArtifactPattern, JAR_EXTENSION, RUNTIME_PATH_ENV, locate, search_paths};
pub use resolver::{Resolution, Resolutions, Resolver};
pub use source::{ArtifactSource, FetchError, HttpSource};
