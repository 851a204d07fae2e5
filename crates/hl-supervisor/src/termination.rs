//! Host-specific process termination.
//!
//! [`TerminationStrategy`] is chosen once per host and gives the supervisor a
//! uniform graceful/forceful pair:
//!
//! | Strategy       | Graceful                 | Forceful                       |
//! |----------------|--------------------------|--------------------------------|
//! | `Signal`       | `kill -TERM` the worker  | `SIGKILL` to the worker        |
//! | `ProcessTree`  | `taskkill /pid N /t`     | `taskkill /pid N /t /f`, kill  |
//!
//! Signals are delivered through the platform tools rather than raw syscalls.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::SupervisorError;

/// How termination requests reach the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStrategy {
    /// Signal the worker process itself.
    Signal,
    /// Terminate the whole process tree rooted at the worker.
    ProcessTree,
}

impl TerminationStrategy {
    /// Returns the strategy for the current platform.
    #[must_use]
    pub const fn for_host() -> Self {
        if cfg!(windows) {
            Self::ProcessTree
        } else {
            Self::Signal
        }
    }

    /// Asks the worker to exit.
    ///
    /// A pid of 0 is never signalled: `kill 0` would reach the whole process
    /// group, including hotloop itself.
    pub async fn terminate_gracefully(self, pid: u32) -> Result<(), SupervisorError> {
        if pid == 0 {
            debug!("Worker has no process id, nothing to signal");
            return Ok(());
        }

        let pid_arg = pid.to_string();
        let mut command = match self {
            Self::Signal => {
                let mut c = Command::new("kill");
                c.args(["-TERM", &pid_arg]);
                c
            }
            Self::ProcessTree => {
                let mut c = Command::new("taskkill");
                c.args(["/pid", &pid_arg, "/t"]);
                c
            }
        };

        run_quietly(&mut command, pid).await
    }

    /// Terminates the worker unconditionally. Does not wait for the exit.
    pub async fn terminate_forcefully(self, child: &mut Child) -> Result<(), SupervisorError> {
        // `None` once the child has been reaped
        let pid = child.id();

        if let (Self::ProcessTree, Some(pid)) = (self, pid) {
            let mut command = Command::new("taskkill");
            command.args(["/pid", &pid.to_string(), "/t", "/f"]);
            if let Err(e) = run_quietly(&mut command, pid).await {
                debug!(pid, error = %e, "Tree kill failed, killing worker only");
            }
        }

        let pid = pid.unwrap_or_default();
        match child.start_kill() {
            Ok(()) => Ok(()),
            // Already reaped
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(source) => Err(SupervisorError::Terminate { pid, source }),
        }
    }
}

impl Default for TerminationStrategy {
    fn default() -> Self {
        Self::for_host()
    }
}

async fn run_quietly(command: &mut Command, pid: u32) -> Result<(), SupervisorError> {
    let status = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| SupervisorError::Terminate { pid, source })?;

    if !status.success() {
        // The process may already have exited between the check and the signal
        debug!(pid, %status, "Termination command reported failure");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_host() {
        #[cfg(unix)]
        assert_eq!(TerminationStrategy::for_host(), TerminationStrategy::Signal);
        #[cfg(windows)]
        assert_eq!(TerminationStrategy::for_host(), TerminationStrategy::ProcessTree);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_graceful_signal_ends_default_process() {
        let mut child = Command::new("sleep")
            .arg("30")
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn sleep");
        let pid = child.id().expect("Child should have a pid");

        TerminationStrategy::Signal
            .terminate_gracefully(pid)
            .await
            .expect("Signal should be delivered");

        let status = tokio::time::timeout(std::time::Duration::from_secs(5), child.wait())
            .await
            .expect("Child should exit after SIGTERM")
            .expect("Wait should succeed");
        assert!(!status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_pid_is_never_signalled() {
        // `kill -TERM 0` would take down the test runner's process group
        TerminationStrategy::Signal
            .terminate_gracefully(0)
            .await
            .expect("Zero pid should be skipped");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_forceful_after_exit_is_ok() {
        let mut child = Command::new("true").spawn().expect("Failed to spawn true");
        child.wait().await.expect("Wait should succeed");

        assert!(
            TerminationStrategy::Signal
                .terminate_forcefully(&mut child)
                .await
                .is_ok()
        );
    }
}
