//! External compiler invocation.
//!
//! The compiler runs once per build with the full file list:
//!
//! ```text
//! <program> <args...> [-cp <classpath>] -d <output_dir> <files...>
//! ```
//!
//! The classpath is joined with the platform separator (`:` or `;`). The
//! diagnostic stream is only kept when the compiler exits nonzero.

use std::ffi::OsString;
use std::process::Stdio;

use camino::{Utf8Path, Utf8PathBuf};
use hl_core::{BuildFailure, BuildResult, RuntimeConfig};
use tokio::process::Command;

use crate::error::BuildError;

/// An external compiler program plus fixed leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiler {
    program: String,
    args: Vec<String>,
}

impl Compiler {
    /// Creates a compiler with no extra arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Creates the compiler described by `runtime.compiler` and
    /// `runtime.compilerArgs`.
    #[must_use]
    pub fn from_config(runtime: &RuntimeConfig) -> Self {
        Self::new(runtime.compiler.clone()).with_args(runtime.compiler_args.iter().cloned())
    }

    /// Appends fixed arguments placed before the classpath.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Returns the program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Builds the full argument list for one invocation.
    pub fn arguments(
        &self,
        files: &[Utf8PathBuf],
        classpath: &[Utf8PathBuf],
        output_dir: &Utf8Path,
    ) -> Result<Vec<OsString>, BuildError> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();

        if !classpath.is_empty() {
            args.push("-cp".into());
            args.push(std::env::join_paths(classpath)?);
        }

        args.push("-d".into());
        args.push(output_dir.as_os_str().to_owned());
        args.extend(files.iter().map(|f| f.as_os_str().to_owned()));

        Ok(args)
    }

    /// Compiles `files` into `output_dir`, suspending until the compiler
    /// exits.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Classpath`] if the classpath can't be joined and
    /// [`BuildError::Spawn`] if the program can't be started. A compiler that
    /// runs and fails yields `Ok(BuildResult::Failure(..))`.
    pub async fn compile(
        &self,
        files: &[Utf8PathBuf],
        classpath: &[Utf8PathBuf],
        output_dir: &Utf8Path,
    ) -> Result<BuildResult, BuildError> {
        let args = self.arguments(files, classpath, output_dir)?;

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| BuildError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(BuildResult::Success);
        }

        let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
        if diagnostics.trim().is_empty() {
            diagnostics = format!("{} exited with {}", self.program, output.status);
        }

        Ok(BuildFailure::compiler(diagnostics).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_core::FailureKind;

    #[cfg(unix)]
    #[test]
    fn test_argument_order() {
        let compiler = Compiler::new("javac").with_args(["-parameters"]);
        let args = compiler
            .arguments(
                &[Utf8PathBuf::from("src/A.java"), Utf8PathBuf::from("src/b/B.java")],
                &[Utf8PathBuf::from("rt.jar"), Utf8PathBuf::from("lib/gson.jar")],
                Utf8Path::new("build"),
            )
            .expect("Arguments should build");

        let args: Vec<&str> = args.iter().filter_map(|a| a.to_str()).collect();
        assert_eq!(
            args,
            vec!["-parameters", "-cp", "rt.jar:lib/gson.jar", "-d", "build", "src/A.java", "src/b/B.java"]
        );
    }

    #[test]
    fn test_empty_classpath_omits_flag() {
        let args = Compiler::new("javac")
            .arguments(&[Utf8PathBuf::from("A.java")], &[], Utf8Path::new("out"))
            .expect("Arguments should build");
        assert!(!args.iter().any(|a| a == "-cp"));
    }

    #[test]
    fn test_from_config() {
        let runtime = RuntimeConfig {
            compiler_args: vec!["-g".to_owned()],
            ..RuntimeConfig::default()
        };
        let compiler = Compiler::from_config(&runtime);
        assert_eq!(compiler.program(), "javac");
        assert_eq!(compiler, Compiler::new("javac").with_args(["-g"]));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_captures_stderr_verbatim() {
        let compiler = Compiler::new("sh").with_args([
            "-c",
            "printf 'error: cannot find symbol' >&2; exit 1",
            "javac",
        ]);

        let result = compiler
            .compile(&[Utf8PathBuf::from("A.java")], &[], Utf8Path::new("build"))
            .await
            .expect("Compiler should run");

        let failure = result.failure().expect("Expected a failure");
        assert_eq!(failure.kind, FailureKind::Compiler);
        assert_eq!(failure.diagnostics, "error: cannot find symbol");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_exit_discards_stderr() {
        let compiler = Compiler::new("sh").with_args(["-c", "echo 'warning: deprecated' >&2", "javac"]);

        let result = compiler
            .compile(&[Utf8PathBuf::from("A.java")], &[], Utf8Path::new("build"))
            .await
            .expect("Compiler should run");

        assert!(result.is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_failure_reports_exit_status() {
        let compiler = Compiler::new("sh").with_args(["-c", "exit 2", "javac"]);

        let result = compiler
            .compile(&[Utf8PathBuf::from("A.java")], &[], Utf8Path::new("build"))
            .await
            .expect("Compiler should run");

        let diagnostics = result.diagnostics().expect("Expected diagnostics");
        assert!(diagnostics.starts_with("sh exited with"));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let result = Compiler::new("/nonexistent/bin/javac")
            .compile(&[Utf8PathBuf::from("A.java")], &[], Utf8Path::new("build"))
            .await;
        assert!(matches!(result, Err(BuildError::Spawn { .. })));
    }
}
