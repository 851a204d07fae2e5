//! Error types for the hl-deps crate.
//!
//! [`LocateError`] is a fatal startup precondition. [`ResolveError`] is
//! reported per dependency and never aborts resolution of the others.

use camino::{Utf8Path, Utf8PathBuf};

/// The runtime artifact could not be found in any candidate directory.
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    /// No candidate directory contained a matching file.
    #[error("runtime artifact not found; searched {}", display_paths(.searched))]
    NotFound {
        /// Candidate directories in the order they were searched.
        searched: Vec<Utf8PathBuf>,
    },
}

fn display_paths(paths: &[Utf8PathBuf]) -> String {
    if paths.is_empty() {
        return "no candidate directories".to_owned();
    }
    paths
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// How a resolution failure is reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// The name is not in the coordinate registry. A configuration mistake.
    UnknownDependency,
    /// Transport, HTTP status, or local write failure. Not retried.
    NetworkFailure,
}

/// Failure to resolve a single dependency.
///
/// # Error Recovery Strategy
///
/// Every variant is per-dependency: the resolver records it and carries on
/// with the remaining specs. Use [`ResolveError::category`] for reporting.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The symbolic name has no registered coordinate.
    #[error("unknown dependency: {name}")]
    UnknownDependency {
        /// The unregistered name.
        name: String,
    },

    /// The request failed before a complete body was received.
    #[error("failed to download {url}: {source}")]
    Network {
        /// The requested URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The repository answered with a non-success status.
    #[error("failed to download {url}: HTTP {status}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The artifact could not be written to the cache.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The cache path being written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ResolveError {
    /// Creates a [`ResolveError::UnknownDependency`] error.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownDependency { name: name.into() }
    }

    /// Creates a [`ResolveError::Write`] error.
    pub fn write(path: &Utf8Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_owned(),
            source,
        }
    }

    /// Returns the reporting category.
    ///
    /// Write failures are reported as network failures.
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::UnknownDependency { .. } => FailureCategory::UnknownDependency,
            Self::Network { .. } | Self::Status { .. } | Self::Write { .. } | Self::Client(_) => {
                FailureCategory::NetworkFailure
            }
        }
    }

    /// Returns `true` if retrying later could succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self.category(), FailureCategory::NetworkFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_error_lists_searched_paths() {
        let err = LocateError::NotFound {
            searched: vec![
                Utf8PathBuf::from("runtime/target"),
                Utf8PathBuf::from("/opt/hotloop/lib"),
            ],
        };
        insta::assert_snapshot!(err.to_string(), @"runtime artifact not found; searched runtime/target, /opt/hotloop/lib");

        let empty = LocateError::NotFound { searched: vec![] };
        assert!(empty.to_string().contains("no candidate directories"));
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ResolveError::unknown("leftpad").category(),
            FailureCategory::UnknownDependency
        );
        let status = ResolveError::Status {
            url: "https://repo/x.jar".to_owned(),
            status: 404,
        };
        assert_eq!(status.category(), FailureCategory::NetworkFailure);

        let write = ResolveError::write(
            Utf8Path::new(".hotloop/lib/x.jar"),
            std::io::Error::other("disk full"),
        );
        assert_eq!(write.category(), FailureCategory::NetworkFailure);
        assert!(write.is_recoverable());
        assert!(!ResolveError::unknown("x").is_recoverable());
    }

    #[test]
    fn test_resolve_error_display() {
        let err = ResolveError::Status {
            url: "https://repo1.maven.org/maven2/a/b/1/b-1.jar".to_owned(),
            status: 404,
        };
        insta::assert_snapshot!(err.to_string(), @"failed to download https://repo1.maven.org/maven2/a/b/1/b-1.jar: HTTP 404");
    }
}
