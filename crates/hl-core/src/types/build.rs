//! Build requests and results.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Inputs for a single full compilation of the source tree.
///
/// Constructed per cycle from the descriptor plus the located runtime
/// artifact and resolved dependency paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Root of the source tree to compile.
    pub source_root: Utf8PathBuf,

    /// Directory that receives compiled output.
    pub output_dir: Utf8PathBuf,

    /// Classpath entries in priority order.
    pub classpath: Vec<Utf8PathBuf>,
}

impl BuildRequest {
    /// Creates a request with an empty classpath.
    #[must_use]
    pub fn new(source_root: impl Into<Utf8PathBuf>, output_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_dir: output_dir.into(),
            classpath: Vec::new(),
        }
    }

    /// Appends classpath entries, keeping their order.
    #[must_use]
    pub fn with_classpath<I, P>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.classpath.extend(entries.into_iter().map(Into::into));
        self
    }
}

/// Why a build did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The source tree contains no source files; the compiler was not run.
    NoSourceFiles,
    /// The compiler ran and exited nonzero.
    Compiler,
    /// The compiler could not be launched or its inputs could not be prepared.
    Toolchain,
}

/// A failed build with its operator-facing diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFailure {
    /// Failure category.
    pub kind: FailureKind,

    /// Diagnostics text. For [`FailureKind::Compiler`] this is the raw
    /// compiler error stream, unmodified.
    pub diagnostics: String,
}

impl BuildFailure {
    /// Creates a failure for a source tree with no source files.
    ///
    /// ```
    /// use hl_core::{BuildFailure, FailureKind};
    /// use camino::Utf8Path;
    ///
    /// let failure = BuildFailure::no_source_files(Utf8Path::new("src"));
    /// assert_eq!(failure.kind, FailureKind::NoSourceFiles);
    /// assert_eq!(failure.diagnostics, "No source files found in src");
    /// ```
    #[must_use]
    pub fn no_source_files(dir: &Utf8Path) -> Self {
        Self {
            kind: FailureKind::NoSourceFiles,
            diagnostics: format!("No source files found in {dir}"),
        }
    }

    /// Creates a failure from the compiler's diagnostic stream.
    #[must_use]
    pub fn compiler(diagnostics: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Compiler,
            diagnostics: diagnostics.into(),
        }
    }

    /// Creates a failure for a compiler that could not be run.
    #[must_use]
    pub fn toolchain(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Toolchain,
            diagnostics: message.into(),
        }
    }
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.diagnostics)
    }
}

/// Outcome of one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildResult {
    /// The compiler exited zero.
    Success,
    /// The build failed.
    Failure(BuildFailure),
}

impl BuildResult {
    /// Returns `true` for [`BuildResult::Success`].
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns the failure, if any.
    #[inline]
    #[must_use]
    pub const fn failure(&self) -> Option<&BuildFailure> {
        match self {
            Self::Success => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Returns the diagnostics text of a failed build.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&str> {
        self.failure().map(|f| f.diagnostics.as_str())
    }
}

impl From<BuildFailure> for BuildResult {
    fn from(failure: BuildFailure) -> Self {
        Self::Failure(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_classpath_order() {
        let request = BuildRequest::new("src", "build")
            .with_classpath(["runtime.jar"])
            .with_classpath([Utf8PathBuf::from("lib/gson.jar")]);
        assert_eq!(
            request.classpath,
            vec![
                Utf8PathBuf::from("runtime.jar"),
                Utf8PathBuf::from("lib/gson.jar")
            ]
        );
    }

    #[test]
    fn test_no_source_files_message() {
        let failure = BuildFailure::no_source_files(Utf8Path::new("/work/app/src"));
        insta::assert_snapshot!(failure.to_string(), @"No source files found in /work/app/src");
    }

    #[test]
    fn test_compiler_diagnostics_verbatim() {
        let raw = "Hello.java:3: error: cannot find symbol\n  symbol: class Foo\n";
        let result = BuildResult::from(BuildFailure::compiler(raw));
        assert!(!result.is_success());
        assert_eq!(result.diagnostics(), Some(raw));
        assert_eq!(result.failure().map(|f| f.kind), Some(FailureKind::Compiler));
    }

    #[test]
    fn test_success_has_no_diagnostics() {
        assert!(BuildResult::Success.is_success());
        assert!(BuildResult::Success.diagnostics().is_none());
    }
}
