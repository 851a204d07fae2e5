//! One rebuild-and-restart cycle.
//!
//! [`CycleRunner`] holds everything a cycle touches: the active
//! configuration, the prepared classpath inputs, the build pipeline and the
//! worker slot. A cycle runs strictly in order:
//!
//! 1. reload the descriptor (port changes apply, others are reported)
//! 2. stop the running worker and wait for it
//! 3. build
//! 4. on success, pause for the restart delay and start a new worker
//!
//! The caller holds the single-flight guard for the whole duration.

use camino::{Utf8Path, Utf8PathBuf};
use hl_build::Pipeline;
use hl_core::{BuildFailure, BuildRequest, BuildResult, FailureKind, ProjectConfig};
use hl_supervisor::{StopOutcome, Supervisor, WorkerExit, WorkerSpec};
use tracing::{debug, error, info, warn};

use crate::state::CycleOutcome;

/// Inputs and collaborators of a cycle.
pub(crate) struct CycleRunner<P> {
    project_root: Utf8PathBuf,
    config: ProjectConfig,
    last_descriptor: ProjectConfig,
    port_override: Option<u16>,
    reload_descriptor: bool,
    artifact: Utf8PathBuf,
    dependency_classpath: Vec<Utf8PathBuf>,
    unresolved: Vec<String>,
    pipeline: P,
    supervisor: Supervisor,
}

impl<P: Pipeline> CycleRunner<P> {
    pub(crate) fn new(
        project_root: Utf8PathBuf,
        config: ProjectConfig,
        artifact: Utf8PathBuf,
        pipeline: P,
        supervisor: Supervisor,
    ) -> Self {
        Self {
            project_root,
            last_descriptor: config.clone(),
            config,
            port_override: None,
            reload_descriptor: false,
            artifact,
            dependency_classpath: Vec::new(),
            unresolved: Vec::new(),
            pipeline,
            supervisor,
        }
    }

    pub(crate) fn set_dependencies(&mut self, classpath: Vec<Utf8PathBuf>, unresolved: Vec<String>) {
        self.dependency_classpath = classpath;
        self.unresolved = unresolved;
    }

    pub(crate) const fn set_port_override(&mut self, port: Option<u16>) {
        self.port_override = port;
    }

    pub(crate) const fn set_descriptor_reload(&mut self, enabled: bool) {
        self.reload_descriptor = enabled;
    }

    pub(crate) fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub(crate) fn supervisor_mut(&mut self) -> &mut Supervisor {
        &mut self.supervisor
    }

    pub(crate) fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub(crate) fn artifact(&self) -> &Utf8Path {
        &self.artifact
    }

    pub(crate) fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// The port the next worker receives.
    pub(crate) fn port(&self) -> u16 {
        self.port_override.unwrap_or(self.config.port)
    }

    pub(crate) fn source_root(&self) -> Utf8PathBuf {
        self.config.source_root(&self.project_root)
    }

    /// Runtime artifact first, then resolved dependencies.
    pub(crate) fn build_request(&self) -> BuildRequest {
        BuildRequest::new(self.source_root(), self.config.output_root(&self.project_root))
            .with_classpath(
                std::iter::once(&self.artifact)
                    .chain(&self.dependency_classpath)
                    .cloned(),
            )
    }

    pub(crate) fn worker_spec(&self) -> WorkerSpec {
        WorkerSpec::new(
            self.artifact.clone(),
            self.config.output_root(&self.project_root),
            self.port(),
        )
        .with_extra_classpath(self.dependency_classpath.clone())
    }

    /// Runs the build alone and reports a failure.
    pub(crate) async fn build(&self) -> BuildResult {
        let result = self.pipeline.build(&self.build_request()).await;
        match &result {
            BuildResult::Success => info!("Compiled successfully"),
            BuildResult::Failure(failure) => self.report_build_failure(failure),
        }
        result
    }

    /// Runs a full cycle.
    pub(crate) async fn run(&mut self) -> CycleOutcome {
        if self.reload_descriptor {
            self.reload();
        }

        if self.supervisor.is_running() {
            if let StopOutcome::Forced = self.supervisor.stop().await {
                warn!("Previous worker had to be killed");
            }
        }

        if let BuildResult::Failure(_) = self.build().await {
            return CycleOutcome::BuildFailed;
        }

        let delay = self.config.runtime.restart_delay();
        if !delay.is_zero() {
            debug!(?delay, "Waiting before starting worker");
            tokio::time::sleep(delay).await;
        }

        match self.supervisor.start(&self.worker_spec()) {
            Ok(handle) => {
                info!(pid = handle.pid, port = self.port(), "Server running");
                CycleOutcome::Started
            }
            Err(e) => {
                error!(error = %e, "Failed to start worker");
                CycleOutcome::SpawnFailed
            }
        }
    }

    fn report_build_failure(&self, failure: &BuildFailure) {
        match failure.kind {
            FailureKind::NoSourceFiles => error!("{}", failure.diagnostics),
            FailureKind::Compiler => error!("Compilation failed\n{}", failure.diagnostics),
            FailureKind::Toolchain => error!(error = %failure.diagnostics, "Compiler could not be run"),
        }

        if failure.kind == FailureKind::Compiler && !self.unresolved.is_empty() {
            warn!(
                unresolved = ?self.unresolved,
                "Some dependencies were not resolved at startup and are missing from the classpath"
            );
        }
    }

    /// Re-reads the descriptor and applies what can change without a restart.
    fn reload(&mut self) {
        let newer = match ProjectConfig::load(&self.project_root) {
            Ok(newer) => newer,
            Err(e) => {
                warn!(error = %e, "Keeping previous configuration");
                return;
            }
        };

        if newer.port != self.config.port {
            if self.port_override.is_some() {
                debug!(port = newer.port, "Descriptor port ignored, overridden on the command line");
            } else {
                info!(from = self.config.port, to = newer.port, "Port changed");
            }
            self.config.port = newer.port;
        }

        let changed = self.last_descriptor.restart_required_changes(&newer);
        if !changed.is_empty() {
            warn!(options = ?changed, "Descriptor changes take effect after restarting hotloop");
        }
        self.last_descriptor = newer;
    }
}

pub(crate) fn report_unexpected_exit(exit: &WorkerExit) {
    let uptime = exit.handle.uptime();
    match exit.status {
        Some(status) => error!(pid = exit.handle.pid, %status, ?uptime, "Server stopped unexpectedly"),
        None => error!(pid = exit.handle.pid, ?uptime, "Server stopped unexpectedly"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hl_core::DESCRIPTOR_FILE;
    use tempfile::TempDir;

    struct NeverBuilds;

    #[async_trait]
    impl Pipeline for NeverBuilds {
        async fn build(&self, request: &BuildRequest) -> BuildResult {
            BuildFailure::no_source_files(&request.source_root).into()
        }
    }

    fn runner(root: &Utf8Path) -> CycleRunner<NeverBuilds> {
        let config = ProjectConfig::default();
        let supervisor = Supervisor::from_config(&config.runtime);
        let mut runner = CycleRunner::new(
            root.to_owned(),
            config,
            Utf8PathBuf::from("/opt/rt/hotloop-runtime-1.0.jar"),
            NeverBuilds,
            supervisor,
        );
        runner.set_dependencies(vec![Utf8PathBuf::from("/cache/gson-2.11.0.jar")], vec![]);
        runner
    }

    #[test]
    fn test_classpaths() {
        let runner = runner(Utf8Path::new("/work/app"));

        let request = runner.build_request();
        assert_eq!(request.source_root.as_str(), "/work/app/src");
        assert_eq!(request.output_dir.as_str(), "/work/app/build");
        let classpath: Vec<&str> = request.classpath.iter().map(|p| p.as_str()).collect();
        assert_eq!(classpath, vec!["/opt/rt/hotloop-runtime-1.0.jar", "/cache/gson-2.11.0.jar"]);

        let spec = runner.worker_spec();
        let classpath: Vec<&str> = spec.classpath().map(Utf8Path::as_str).collect();
        assert_eq!(
            classpath,
            vec!["/opt/rt/hotloop-runtime-1.0.jar", "/work/app/build", "/cache/gson-2.11.0.jar"]
        );
        assert_eq!(spec.port, 8080);
    }

    #[test]
    fn test_reload_applies_port_only() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = Utf8Path::from_path(dir.path()).expect("Non-UTF8 temp dir");
        std::fs::write(root.join(DESCRIPTOR_FILE), r#"{"port": 9001, "sourceDir": "app"}"#)
            .expect("Failed to write descriptor");

        let mut runner = runner(root);
        runner.reload();

        assert_eq!(runner.port(), 9001);
        assert_eq!(runner.config().source_dir.as_str(), "src");
    }

    #[test]
    fn test_port_override_wins_over_reload() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = Utf8Path::from_path(dir.path()).expect("Non-UTF8 temp dir");
        std::fs::write(root.join(DESCRIPTOR_FILE), r#"{"port": 9001}"#)
            .expect("Failed to write descriptor");

        let mut runner = runner(root);
        runner.set_port_override(Some(7000));
        runner.reload();

        assert_eq!(runner.port(), 7000);
    }

    #[test]
    fn test_reload_failure_keeps_configuration() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = Utf8Path::from_path(dir.path()).expect("Non-UTF8 temp dir");
        std::fs::write(root.join(DESCRIPTOR_FILE), "{ not json").expect("Failed to write descriptor");

        let mut runner = runner(root);
        runner.reload();

        assert_eq!(runner.port(), 8080);
    }

    #[tokio::test]
    async fn test_failed_build_starts_nothing() {
        let mut runner = runner(Utf8Path::new("/work/app"));
        assert_eq!(runner.run().await, CycleOutcome::BuildFailed);
        assert!(!runner.supervisor().is_running());
    }
}
