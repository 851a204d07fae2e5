//! Error types for the hl-build crate.
//!
//! A [`BuildError`] means the build could not be attempted properly: the tree
//! could not be walked, the output directory could not be created, or the
//! compiler could not be launched. A compiler that runs and rejects the
//! sources is not an error here; it is a
//! [`BuildResult::Failure`](hl_core::BuildResult::Failure).

use std::path::PathBuf;

use camino::Utf8PathBuf;

/// Errors that prevent a build from running.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The source root does not exist or is not a directory.
    #[error("source directory not found: {0}")]
    MissingSourceRoot(Utf8PathBuf),

    /// Directory traversal failed.
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),

    /// A source path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    CreateOutput {
        /// The output directory.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The classpath contains an entry with the platform separator in it.
    #[error("invalid classpath: {0}")]
    Classpath(#[from] std::env::JoinPathsError),

    /// The compiler process could not be started.
    #[error("failed to run compiler `{program}`: {source}")]
    Spawn {
        /// The compiler program.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The discovery task was cancelled or panicked.
    #[error("source discovery was interrupted")]
    Interrupted,
}

impl BuildError {
    /// Returns `true` if the failure is about the source tree rather than
    /// the toolchain.
    #[must_use]
    pub const fn is_source_problem(&self) -> bool {
        matches!(self, Self::MissingSourceRoot(_) | Self::NonUtf8Path(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_display() {
        let err = BuildError::Spawn {
            program: "javac".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        insta::assert_snapshot!(err.to_string(), @"failed to run compiler `javac`: not found");
        assert!(!err.is_source_problem());
    }

    #[test]
    fn test_missing_root_is_source_problem() {
        assert!(BuildError::MissingSourceRoot(Utf8PathBuf::from("src")).is_source_problem());
    }
}
