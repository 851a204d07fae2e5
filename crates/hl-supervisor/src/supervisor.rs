//! The single worker slot.
//!
//! ```text
//!            start()                 spawned
//!  Absent ───────────► Starting ───────────────► Running
//!    ▲                    │ spawn failed            │  │
//!    ├────────────────────┘                         │  │ exited on its own
//!    │                                     stop()   │  │ (wait_for_exit)
//!    │        exited / grace elapsed + killed       ▼  │
//!    └───────────────────────────────────────── Stopping
//!    └─────────────────────────────────────────────────┘
//! ```
//!
//! The supervisor never holds more than one child. A new worker can only be
//! started once the previous one has been observed to exit, or has been
//! force-killed at the end of the grace period.

use std::fmt;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use hl_core::RuntimeConfig;
use tokio::process::Child;
use tracing::{debug, info, warn};

use crate::error::SupervisorError;
use crate::termination::TerminationStrategy;
use crate::worker::{WorkerCommand, WorkerHandle, WorkerSpec};

/// Default time a worker is given to exit after a graceful request.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// How long to wait for a force-killed worker to be reaped before giving up
/// on observing its exit.
const REAP_TIMEOUT: Duration = Duration::from_millis(500);

/// State of the worker slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No worker.
    Absent,
    /// A worker is being spawned.
    Starting,
    /// A worker is live.
    Running,
    /// A worker is being terminated.
    Stopping,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "absent",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

/// How a [`Supervisor::stop`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// There was no worker to stop.
    NotRunning,
    /// The worker exited within the grace period.
    Graceful(ExitStatus),
    /// The grace period elapsed and the worker was force-terminated.
    Forced,
}

/// A worker exit the supervisor did not ask for.
#[derive(Debug, Clone, Copy)]
pub struct WorkerExit {
    /// The worker that exited.
    pub handle: WorkerHandle,
    /// Its exit status, if it could be collected.
    pub status: Option<ExitStatus>,
}

struct Worker {
    child: Child,
    handle: WorkerHandle,
}

/// Owns at most one worker process.
///
/// All operations take `&mut self`, so the slot can only be driven from one
/// place at a time.
pub struct Supervisor {
    command: WorkerCommand,
    strategy: TerminationStrategy,
    grace_period: Duration,
    state: SlotState,
    worker: Option<Worker>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("program", &self.command.program())
            .field("strategy", &self.strategy)
            .field("grace_period", &self.grace_period)
            .field("state", &self.state)
            .field("worker", &self.handle())
            .finish()
    }
}

impl Supervisor {
    /// Creates an empty slot.
    #[must_use]
    pub fn new(command: WorkerCommand, strategy: TerminationStrategy) -> Self {
        Self {
            command,
            strategy,
            grace_period: DEFAULT_GRACE_PERIOD,
            state: SlotState::Absent,
            worker: None,
        }
    }

    /// Creates an empty slot using the runtime settings and the host's
    /// termination strategy.
    #[must_use]
    pub fn from_config(runtime: &RuntimeConfig) -> Self {
        Self::new(WorkerCommand::from_config(runtime), TerminationStrategy::for_host())
            .with_grace_period(runtime.grace_period())
    }

    /// Sets the grace period.
    #[must_use]
    pub const fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Returns the slot state.
    #[must_use]
    pub const fn state(&self) -> SlotState {
        self.state
    }

    /// Returns `true` if a worker is live.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == SlotState::Running
    }

    /// Returns the live worker, if any.
    #[must_use]
    pub fn handle(&self) -> Option<WorkerHandle> {
        self.worker.as_ref().map(|w| w.handle)
    }

    /// Spawns a worker for `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::InvalidState`] unless the slot is absent,
    /// and [`SupervisorError::Spawn`] if the process could not be started
    /// (the slot is absent again afterwards).
    pub fn start(&mut self, spec: &WorkerSpec) -> Result<WorkerHandle, SupervisorError> {
        if self.state != SlotState::Absent {
            return Err(SupervisorError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        self.state = SlotState::Starting;

        let spawned = self.command.command(spec).and_then(|mut command| {
            command.spawn().map_err(|source| SupervisorError::Spawn {
                program: self.command.program().to_owned(),
                source,
            })
        });

        let child = match spawned {
            Ok(child) => child,
            Err(e) => {
                self.state = SlotState::Absent;
                return Err(e);
            }
        };

        // A freshly spawned child always has a pid until it is reaped
        let Some(pid) = child.id() else {
            self.state = SlotState::Absent;
            return Err(SupervisorError::Spawn {
                program: self.command.program().to_owned(),
                source: std::io::Error::other("worker exited before its pid was read"),
            });
        };

        let handle = WorkerHandle {
            pid,
            started_at: Instant::now(),
        };
        self.worker = Some(Worker { child, handle });
        self.state = SlotState::Running;

        info!(pid = handle.pid, port = spec.port, "Worker started");
        Ok(handle)
    }

    /// Stops the live worker.
    ///
    /// Sends a graceful termination request, then waits for the exit or for
    /// the grace period, whichever comes first. On timeout the worker is
    /// force-terminated and the slot becomes absent without waiting for the
    /// kill to be acknowledged beyond a short reap window. Always resolves
    /// within the grace period plus that window.
    pub async fn stop(&mut self) -> StopOutcome {
        let Some(mut worker) = self.worker.take() else {
            self.state = SlotState::Absent;
            return StopOutcome::NotRunning;
        };

        self.state = SlotState::Stopping;
        let pid = worker.handle.pid;
        let deadline = tokio::time::Instant::now() + self.grace_period;
        debug!(pid, grace_period = ?self.grace_period, "Stopping worker");

        match tokio::time::timeout_at(deadline, self.strategy.terminate_gracefully(pid)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(pid, error = %e, "Graceful termination request failed"),
            Err(_) => debug!(pid, "Graceful termination request timed out"),
        }

        let outcome = tokio::select! {
            status = worker.child.wait() => match status {
                Ok(status) => StopOutcome::Graceful(status),
                Err(e) => {
                    warn!(pid, error = %e, "Failed to observe worker exit");
                    self.force(&mut worker).await
                }
            },
            () = tokio::time::sleep_until(deadline) => self.force(&mut worker).await,
        };

        self.state = SlotState::Absent;
        match outcome {
            StopOutcome::Graceful(status) => info!(pid, %status, "Worker stopped"),
            _ => warn!(pid, "Worker did not exit within the grace period and was killed"),
        }
        outcome
    }

    async fn force(&self, worker: &mut Worker) -> StopOutcome {
        let pid = worker.handle.pid;
        if let Err(e) = self.strategy.terminate_forcefully(&mut worker.child).await {
            warn!(pid, error = %e, "Forced termination failed");
        }
        if tokio::time::timeout(REAP_TIMEOUT, worker.child.wait()).await.is_err() {
            warn!(pid, "Killed worker has not exited yet");
        }
        StopOutcome::Forced
    }

    /// Resolves when the live worker exits without being asked to.
    ///
    /// Pending forever while no worker is running, so it can sit in a
    /// `tokio::select!` next to other event sources. Cancel-safe. Exits
    /// caused by [`Supervisor::stop`] are never reported here because `stop`
    /// takes the worker out of the slot first.
    pub async fn wait_for_exit(&mut self) -> WorkerExit {
        let Some(worker) = self.worker.as_mut() else {
            return std::future::pending().await;
        };

        let status = match worker.child.wait().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(pid = worker.handle.pid, error = %e, "Failed to collect worker exit status");
                None
            }
        };

        let handle = worker.handle;
        self.worker = None;
        self.state = SlotState::Absent;
        WorkerExit { handle, status }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    /// A supervisor whose worker is `sh -c <script>`; the worker arguments
    /// become ignored positional parameters.
    fn supervisor(script: &str, grace: Duration) -> Supervisor {
        let runtime = RuntimeConfig {
            launcher: "sh".to_owned(),
            launcher_args: vec!["-c".to_owned(), script.to_owned(), "worker".to_owned()],
            ..RuntimeConfig::default()
        };
        Supervisor::from_config(&runtime).with_grace_period(grace)
    }

    fn spec() -> WorkerSpec {
        WorkerSpec::new(Utf8PathBuf::from("rt.jar"), Utf8PathBuf::from("build"), 8080)
    }

    /// Lets the shell install its traps before it is signalled.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    #[tokio::test]
    async fn test_graceful_exit_within_grace_period() {
        let mut supervisor = supervisor(
            "trap 'sleep 1; exit 0' TERM; while :; do sleep 0.1; done",
            Duration::from_secs(3),
        );
        supervisor.start(&spec()).expect("Worker should start");
        assert_eq!(supervisor.state(), SlotState::Running);
        settle().await;

        let started = Instant::now();
        let outcome = supervisor.stop().await;
        let elapsed = started.elapsed();

        assert!(matches!(outcome, StopOutcome::Graceful(status) if status.success()));
        assert!(elapsed >= Duration::from_millis(900), "stopped too early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "waited for the timeout: {elapsed:?}");
        assert_eq!(supervisor.state(), SlotState::Absent);
        assert!(supervisor.handle().is_none());
    }

    #[tokio::test]
    async fn test_forced_at_grace_boundary() {
        let grace = Duration::from_millis(800);
        let mut supervisor = supervisor("trap '' TERM; while :; do sleep 0.1; done", grace);
        supervisor.start(&spec()).expect("Worker should start");
        settle().await;

        let started = Instant::now();
        let outcome = supervisor.stop().await;
        let elapsed = started.elapsed();

        assert_eq!(outcome, StopOutcome::Forced);
        assert!(elapsed >= grace, "forced before the grace period: {elapsed:?}");
        assert!(elapsed < grace + REAP_TIMEOUT + Duration::from_millis(500));
        assert_eq!(supervisor.state(), SlotState::Absent);
    }

    #[tokio::test]
    async fn test_single_slot() {
        let mut supervisor = supervisor("sleep 30", Duration::from_secs(1));
        let handle = supervisor.start(&spec()).expect("Worker should start");
        assert_ne!(handle.pid, 0);

        let err = supervisor.start(&spec()).expect_err("Second start should be rejected");
        assert!(matches!(
            err,
            SupervisorError::InvalidState {
                operation: "start",
                state: SlotState::Running
            }
        ));

        supervisor.stop().await;
        supervisor.start(&spec()).expect("Start after stop should succeed");
        supervisor.stop().await;
    }

    #[tokio::test]
    async fn test_spawn_failure_leaves_slot_absent() {
        let runtime = RuntimeConfig {
            launcher: "/nonexistent/bin/java".to_owned(),
            ..RuntimeConfig::default()
        };
        let mut supervisor = Supervisor::from_config(&runtime);

        let err = supervisor.start(&spec()).expect_err("Spawn should fail");
        assert!(matches!(err, SupervisorError::Spawn { .. }));
        assert_eq!(supervisor.state(), SlotState::Absent);
    }

    #[tokio::test]
    async fn test_stop_without_worker() {
        let mut supervisor = supervisor("exit 0", Duration::from_secs(1));
        assert_eq!(supervisor.stop().await, StopOutcome::NotRunning);
    }

    #[tokio::test]
    async fn test_unexpected_exit_is_reported() {
        let mut supervisor = supervisor("exit 3", Duration::from_secs(1));
        let handle = supervisor.start(&spec()).expect("Worker should start");

        let exit = tokio::time::timeout(Duration::from_secs(5), supervisor.wait_for_exit())
            .await
            .expect("Worker should exit");

        assert_eq!(exit.handle, handle);
        assert!(exit.handle.uptime() < Duration::from_secs(5));
        assert_eq!(exit.status.and_then(|s| s.code()), Some(3));
        assert_eq!(supervisor.state(), SlotState::Absent);
    }

    #[tokio::test]
    async fn test_wait_for_exit_pending_without_worker() {
        let mut supervisor = supervisor("exit 0", Duration::from_secs(1));
        let waited =
            tokio::time::timeout(Duration::from_millis(100), supervisor.wait_for_exit()).await;
        assert!(waited.is_err());
    }
}
