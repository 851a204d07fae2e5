//! The build pipeline: discover sources, then compile them all.
//!
//! There is no incremental logic. Every call walks the whole source root and
//! hands the complete file list to the compiler.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use hl_core::{BuildFailure, BuildRequest, BuildResult, ProjectConfig};
use tracing::{debug, info, warn};

use crate::compiler::Compiler;
use crate::error::BuildError;
use crate::walker::SourceWalker;

/// Something that turns a [`BuildRequest`] into a [`BuildResult`].
///
/// The orchestrator is generic over this trait; [`BuildPipeline`] is the
/// real implementation.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Runs one full build. Never fails outright: every problem is reported
    /// as a [`BuildResult::Failure`].
    async fn build(&self, request: &BuildRequest) -> BuildResult;
}

/// Walks the source root and invokes the external compiler.
#[derive(Debug, Clone)]
pub struct BuildPipeline {
    compiler: Compiler,
    extension: String,
}

impl BuildPipeline {
    /// Creates a pipeline compiling files with `extension` using `compiler`.
    pub fn new(compiler: Compiler, extension: impl Into<String>) -> Self {
        Self {
            compiler,
            extension: extension.into(),
        }
    }

    /// Creates the pipeline described by the project descriptor.
    #[must_use]
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self::new(
            Compiler::from_config(&config.runtime),
            config.watch.source_extension.clone(),
        )
    }

    async fn discover(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, BuildError> {
        let walker = SourceWalker::new(root, &self.extension)?;
        tokio::task::spawn_blocking(move || walker.collect_paths())
            .await
            .map_err(|_| BuildError::Interrupted)?
    }

    async fn try_build(&self, request: &BuildRequest) -> Result<BuildResult, BuildError> {
        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|source| BuildError::CreateOutput {
                path: request.output_dir.clone(),
                source,
            })?;

        let files = match self.discover(&request.source_root).await {
            Ok(files) => files,
            Err(BuildError::MissingSourceRoot(root)) => {
                warn!(path = %root, "Source directory does not exist");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if files.is_empty() {
            return Ok(BuildFailure::no_source_files(&request.source_root).into());
        }

        info!(files = files.len(), output = %request.output_dir, "Compiling");
        debug!(classpath = ?request.classpath, "Compiler classpath");

        self.compiler
            .compile(&files, &request.classpath, &request.output_dir)
            .await
    }
}

#[async_trait]
impl Pipeline for BuildPipeline {
    async fn build(&self, request: &BuildRequest) -> BuildResult {
        match self.try_build(request).await {
            Ok(result) => result,
            Err(e) => BuildFailure::toolchain(e.to_string()).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_core::FailureKind;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("Non-UTF8 temp dir");
        fs::create_dir_all(root.join("src")).expect("Failed to create src");
        (dir, root)
    }

    #[tokio::test]
    async fn test_no_source_files_skips_compiler() {
        let (_dir, root) = project();
        fs::write(root.join("src/README.md"), "docs").expect("Failed to write");

        // Would fail with a toolchain error if it were ever spawned
        let pipeline = BuildPipeline::new(Compiler::new("/nonexistent/bin/javac"), "java");
        let source_root = root.join("src");
        let result = pipeline
            .build(&BuildRequest::new(&source_root, root.join("build")))
            .await;

        let failure = result.failure().expect("Expected a failure");
        assert_eq!(failure.kind, FailureKind::NoSourceFiles);
        assert_eq!(failure.diagnostics, format!("No source files found in {source_root}"));
        assert!(root.join("build").is_dir());
    }

    #[tokio::test]
    async fn test_missing_source_root_is_no_source_files() {
        let (_dir, root) = project();
        let pipeline = BuildPipeline::new(Compiler::new("/nonexistent/bin/javac"), "java");

        let result = pipeline
            .build(&BuildRequest::new(root.join("app"), root.join("build")))
            .await;

        assert_eq!(
            result.failure().map(|f| f.kind),
            Some(FailureKind::NoSourceFiles)
        );
    }

    #[tokio::test]
    async fn test_unlaunchable_compiler_is_toolchain_failure() {
        let (_dir, root) = project();
        fs::write(root.join("src/App.java"), "class App {}").expect("Failed to write");
        let pipeline = BuildPipeline::new(Compiler::new("/nonexistent/bin/javac"), "java");

        let result = pipeline
            .build(&BuildRequest::new(root.join("src"), root.join("build")))
            .await;

        let failure = result.failure().expect("Expected a failure");
        assert_eq!(failure.kind, FailureKind::Toolchain);
        assert!(failure.diagnostics.contains("/nonexistent/bin/javac"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compiler_receives_every_source_and_classpath() {
        let (_dir, root) = project();
        fs::create_dir_all(root.join("src/demo")).expect("Failed to create dir");
        fs::write(root.join("src/App.java"), "class App {}").expect("Failed to write");
        fs::write(root.join("src/demo/Hello.java"), "class Hello {}").expect("Failed to write");

        // Echo the argument list back as a failure so the test can inspect it
        let compiler = Compiler::new("sh").with_args(["-c", "echo \"$@\" >&2; exit 1", "javac"]);
        let pipeline = BuildPipeline::new(compiler, "java");
        let request = BuildRequest::new(root.join("src"), root.join("build"))
            .with_classpath([root.join("rt.jar"), root.join("lib/gson.jar")]);

        let result = pipeline.build(&request).await;
        let diagnostics = result.diagnostics().expect("Expected diagnostics").trim();

        assert_eq!(
            diagnostics,
            format!(
                "-cp {root}/rt.jar:{root}/lib/gson.jar -d {root}/build {root}/src/App.java {root}/src/demo/Hello.java"
            )
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compile_failure_diagnostics() {
        let (_dir, root) = project();
        fs::write(root.join("src/App.java"), "class App { Missing m; }").expect("Failed to write");
        let compiler = Compiler::new("sh").with_args([
            "-c",
            "printf 'error: cannot find symbol' >&2; exit 1",
            "javac",
        ]);

        let result = BuildPipeline::new(compiler, "java")
            .build(&BuildRequest::new(root.join("src"), root.join("build")))
            .await;

        assert_eq!(result.diagnostics(), Some("error: cannot find symbol"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hidden_sources_are_compiled() {
        let (_dir, root) = project();
        fs::create_dir_all(root.join("src/.gen")).expect("Failed to create dir");
        fs::write(root.join("src/.gen/App.java"), "class App {}").expect("Failed to write");
        fs::write(root.join("src/.Draft.java"), "class Draft {}").expect("Failed to write");

        let compiler = Compiler::new("sh").with_args(["-c", "echo \"$@\" >&2; exit 1", "javac"]);
        let result = BuildPipeline::new(compiler, "java")
            .build(&BuildRequest::new(root.join("src"), root.join("build")))
            .await;

        let failure = result.failure().expect("Expected the echoed arguments");
        assert_eq!(failure.kind, FailureKind::Compiler);
        assert!(failure.diagnostics.trim_end().ends_with(&format!(
            "{root}/src/.Draft.java {root}/src/.gen/App.java"
        )));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_compile() {
        let (_dir, root) = project();
        fs::write(root.join("src/App.java"), "class App {}").expect("Failed to write");

        let result = BuildPipeline::new(Compiler::new("true"), "java")
            .build(&BuildRequest::new(root.join("src"), root.join("build")))
            .await;

        assert!(result.is_success());
    }
}
