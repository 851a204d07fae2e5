//! The change orchestrator.

use camino::{Utf8Path, Utf8PathBuf};
use hl_build::{BuildPipeline, Pipeline};
use hl_core::{BuildResult, ProjectConfig};
use hl_deps::{ArtifactPattern, Resolver, locate, search_paths};
use hl_supervisor::{SlotState, StopOutcome, Supervisor};
use hl_watcher::WatchEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cycle::{CycleRunner, report_unexpected_exit};
use crate::error::OrchestratorError;
use crate::state::{OrchestratorState, RunSummary};

/// Drives rebuild-and-restart cycles from a stream of change events.
///
/// Exactly one cycle is in flight at a time. Events that arrive while a
/// cycle runs are dropped and counted, never queued.
pub struct Orchestrator<P = BuildPipeline> {
    runner: CycleRunner<P>,
    state: OrchestratorState,
}

impl Orchestrator<BuildPipeline> {
    /// Prepares a development loop for `project_root`.
    ///
    /// Resolves the declared dependencies and locates the runtime artifact.
    /// Dependency failures are reported and leave the affected entries off
    /// the classpath; a missing artifact is fatal.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ArtifactNotFound`] if no search path
    /// holds the runtime artifact and [`OrchestratorError::Resolver`] if the
    /// download client cannot be built.
    pub async fn prepare(
        project_root: Utf8PathBuf,
        config: ProjectConfig,
        port_override: Option<u16>,
    ) -> Result<Self, OrchestratorError> {
        let resolver = Resolver::from_config(&project_root, &config)?;
        let resolutions = resolver.resolve(&config.dependencies).await;

        let candidates = search_paths(&config.runtime.search_paths, &project_root);
        let artifact = locate(&ArtifactPattern::new(&config.runtime.artifact_prefix), &candidates)?;

        let pipeline = BuildPipeline::from_config(&config);
        let orchestrator = Self::new(project_root, config, artifact, pipeline)
            .with_dependencies(resolutions.classpath(), resolutions.unresolved_names())
            .with_port_override(port_override)
            .with_descriptor_reload(true);

        info!(
            artifact = %orchestrator.artifact(),
            resolved = resolutions.resolved_count(),
            failed = resolutions.failed_count(),
            port = orchestrator.port(),
            "Development loop prepared"
        );
        Ok(orchestrator)
    }
}

impl<P: Pipeline> Orchestrator<P> {
    /// Creates an orchestrator from already prepared inputs.
    ///
    /// The classpath holds only `artifact` until
    /// [`with_dependencies`](Self::with_dependencies) is applied, and the
    /// descriptor is not re-read between cycles.
    #[must_use]
    pub fn new(project_root: Utf8PathBuf, config: ProjectConfig, artifact: Utf8PathBuf, pipeline: P) -> Self {
        let supervisor = Supervisor::from_config(&config.runtime);
        Self {
            runner: CycleRunner::new(project_root, config, artifact, pipeline, supervisor),
            state: OrchestratorState::default(),
        }
    }

    /// Sets the resolved dependency jars and the names that failed to resolve.
    #[must_use]
    pub fn with_dependencies(mut self, classpath: Vec<Utf8PathBuf>, unresolved: Vec<String>) -> Self {
        self.runner.set_dependencies(classpath, unresolved);
        self
    }

    /// Pins the worker port regardless of the descriptor.
    #[must_use]
    pub fn with_port_override(mut self, port: Option<u16>) -> Self {
        self.runner.set_port_override(port);
        self
    }

    /// Re-reads `hotloop.json` at the start of every cycle.
    #[must_use]
    pub fn with_descriptor_reload(mut self, enabled: bool) -> Self {
        self.runner.set_descriptor_reload(enabled);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &ProjectConfig {
        self.runner.config()
    }

    /// The source tree the cycles build.
    pub fn source_root(&self) -> Utf8PathBuf {
        self.runner.source_root()
    }

    /// The located runtime artifact.
    pub fn artifact(&self) -> &Utf8Path {
        self.runner.artifact()
    }

    /// Declared dependencies that did not resolve.
    pub fn unresolved(&self) -> &[String] {
        self.runner.unresolved()
    }

    /// The port the next worker receives.
    pub fn port(&self) -> u16 {
        self.runner.port()
    }

    /// State of the worker slot.
    pub fn worker_state(&self) -> SlotState {
        self.runner.supervisor().state()
    }

    /// Counters so far.
    pub const fn summary(&self) -> RunSummary {
        self.state.summary()
    }

    /// Builds once without starting a worker.
    pub async fn build_once(&self) -> BuildResult {
        self.runner.build().await
    }

    /// Runs the development loop until `shutdown` fires or `events` closes.
    ///
    /// Starts with one full cycle, then runs one cycle per accepted change.
    /// A shutdown request during a cycle takes effect once the cycle has
    /// finished; the live worker is then stopped.
    pub async fn run(
        &mut self,
        events: &mut mpsc::Receiver<WatchEvent>,
        shutdown: CancellationToken,
    ) -> RunSummary {
        if self.state.try_begin() {
            self.guarded_cycle(None, events).await;
        }

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    debug!("Shutdown requested");
                    break;
                }

                exit = self.runner.supervisor_mut().wait_for_exit() => {
                    report_unexpected_exit(&exit);
                    self.state.record_unexpected_exit();
                }

                event = events.recv() => match event {
                    Some(event) => {
                        if self.state.try_begin() {
                            self.guarded_cycle(Some(&event), events).await;
                        }
                    }
                    None => {
                        debug!("Change stream closed");
                        break;
                    }
                },
            }
        }

        self.teardown().await
    }

    /// Runs one cycle while holding the guard. Events received meanwhile
    /// are dropped.
    async fn guarded_cycle(&mut self, trigger: Option<&WatchEvent>, events: &mut mpsc::Receiver<WatchEvent>) {
        match trigger {
            Some(event) => {
                let source_root = self.runner.source_root();
                info!(path = %event.relative_to(&source_root), "Change detected, rebuilding");
            }
            None => info!("Initial build"),
        }

        let cycle = self.runner.run();
        tokio::pin!(cycle);
        let mut events_open = true;

        let outcome = loop {
            tokio::select! {
                biased;

                outcome = &mut cycle => break outcome,

                event = events.recv(), if events_open => match event {
                    Some(event) => {
                        if !self.state.try_begin() {
                            info!(path = %event.path, "Restart in progress, change ignored");
                        }
                    }
                    None => events_open = false,
                },
            }
        };

        self.state.finish(outcome);
    }

    async fn teardown(&mut self) -> RunSummary {
        if let StopOutcome::Forced = self.runner.supervisor_mut().stop().await {
            warn!("Worker was killed during shutdown");
        }

        let summary = self.state.summary();
        info!(
            cycles = summary.cycles,
            workers_started = summary.workers_started,
            build_failures = summary.build_failures,
            spawn_failures = summary.spawn_failures,
            dropped_events = summary.dropped_events,
            unexpected_exits = summary.unexpected_exits,
            "Development loop stopped"
        );
        summary
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hl_core::{BuildFailure, BuildRequest, RuntimeConfig};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts builds and answers with a fixed result after a delay.
    struct FakePipeline {
        builds: Arc<AtomicUsize>,
        delay: Duration,
        result: BuildResult,
    }

    #[async_trait]
    impl Pipeline for FakePipeline {
        async fn build(&self, _request: &BuildRequest) -> BuildResult {
            self.builds.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.result.clone()
        }
    }

    fn pipeline(builds: &Arc<AtomicUsize>, delay_ms: u64, result: BuildResult) -> FakePipeline {
        FakePipeline {
            builds: Arc::clone(builds),
            delay: Duration::from_millis(delay_ms),
            result,
        }
    }

    /// The worker is `sh -c <script>`.
    fn orchestrator(pipeline: FakePipeline, script: &str) -> Orchestrator<FakePipeline> {
        let config = ProjectConfig {
            runtime: RuntimeConfig {
                launcher: "sh".to_owned(),
                launcher_args: vec!["-c".to_owned(), script.to_owned(), "worker".to_owned()],
                grace_period_ms: 1000,
                restart_delay_ms: 0,
                ..RuntimeConfig::default()
            },
            ..ProjectConfig::default()
        };
        Orchestrator::new(
            Utf8PathBuf::from("/work/app"),
            config,
            Utf8PathBuf::from("rt.jar"),
            pipeline,
        )
    }

    fn sleep_ms(ms: u64) -> tokio::time::Sleep {
        tokio::time::sleep(Duration::from_millis(ms))
    }

    #[tokio::test]
    async fn test_overlapping_changes_are_dropped() {
        let builds = Arc::new(AtomicUsize::new(0));
        let mut orchestrator = orchestrator(pipeline(&builds, 300, BuildResult::Success), "exec sleep 30");
        let (tx, mut rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();

        let driver = async {
            // During the initial cycle.
            sleep_ms(50).await;
            tx.send(WatchEvent::modified("/work/app/src/A.java")).await.expect("send");

            // One accepted, four dropped.
            sleep_ms(600).await;
            for _ in 0..5 {
                tx.send(WatchEvent::modified("/work/app/src/B.java")).await.expect("send");
            }

            sleep_ms(800).await;
            shutdown.cancel();
        };

        let (summary, ()) = tokio::join!(orchestrator.run(&mut rx, shutdown.clone()), driver);

        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.workers_started, 2);
        assert_eq!(summary.dropped_events, 5);
        assert_eq!(orchestrator.worker_state(), SlotState::Absent);
    }

    #[tokio::test]
    async fn test_build_failure_leaves_slot_empty() {
        let builds = Arc::new(AtomicUsize::new(0));
        let failure = BuildFailure::compiler("A.java:1: error: ';' expected").into();
        let mut orchestrator = orchestrator(pipeline(&builds, 0, failure), "exec sleep 30");
        let (tx, mut rx) = mpsc::channel(16);

        let driver = async {
            sleep_ms(100).await;
            drop(tx);
        };

        let (summary, ()) = tokio::join!(orchestrator.run(&mut rx, CancellationToken::new()), driver);

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(summary.build_failures, 1);
        assert_eq!(summary.workers_started, 0);
        assert_eq!(orchestrator.worker_state(), SlotState::Absent);
    }

    #[tokio::test]
    async fn test_unexpected_exit_is_counted() {
        let builds = Arc::new(AtomicUsize::new(0));
        let mut orchestrator = orchestrator(pipeline(&builds, 0, BuildResult::Success), "exit 3");
        let (_tx, mut rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();

        let driver = async {
            sleep_ms(500).await;
            shutdown.cancel();
        };

        let (summary, ()) = tokio::join!(orchestrator.run(&mut rx, shutdown.clone()), driver);

        assert_eq!(summary.workers_started, 1);
        assert_eq!(summary.unexpected_exits, 1);
        assert_eq!(orchestrator.worker_state(), SlotState::Absent);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_cycle() {
        let builds = Arc::new(AtomicUsize::new(0));
        let mut orchestrator = orchestrator(pipeline(&builds, 300, BuildResult::Success), "exec sleep 30");
        let (_tx, mut rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();

        let driver = async {
            sleep_ms(50).await;
            shutdown.cancel();
        };

        let (summary, ()) = tokio::join!(orchestrator.run(&mut rx, shutdown.clone()), driver);

        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.workers_started, 1);
        assert_eq!(summary.unexpected_exits, 0);
        assert_eq!(orchestrator.worker_state(), SlotState::Absent);
    }

    #[tokio::test]
    async fn test_build_once_does_not_start_worker() {
        let builds = Arc::new(AtomicUsize::new(0));
        let orchestrator = orchestrator(pipeline(&builds, 0, BuildResult::Success), "exec sleep 30");

        assert!(orchestrator.build_once().await.is_success());
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.worker_state(), SlotState::Absent);
    }
}
