//! Worker launch description.
//!
//! The worker is started as
//!
//! ```text
//! <launcher> <args...> -D<portProperty>=<port> -cp <artifact>:<outputDir>:<deps...> <mainClass>
//! ```
//!
//! with the orchestrator's standard streams inherited, so worker output
//! reaches the operator unmodified.

use std::ffi::OsString;
use std::process::Stdio;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use hl_core::RuntimeConfig;
use tokio::process::Command;

use crate::error::SupervisorError;

/// Inputs for one worker launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpec {
    /// The located runtime artifact.
    pub artifact: Utf8PathBuf,
    /// The compiler output directory.
    pub output_dir: Utf8PathBuf,
    /// Port passed to the worker.
    pub port: u16,
    /// Resolved dependency jars, appended after the output directory.
    pub extra_classpath: Vec<Utf8PathBuf>,
}

impl WorkerSpec {
    /// Creates a spec with no extra classpath entries.
    pub fn new(artifact: impl Into<Utf8PathBuf>, output_dir: impl Into<Utf8PathBuf>, port: u16) -> Self {
        Self {
            artifact: artifact.into(),
            output_dir: output_dir.into(),
            port,
            extra_classpath: Vec::new(),
        }
    }

    /// Sets the extra classpath entries.
    #[must_use]
    pub fn with_extra_classpath(mut self, entries: Vec<Utf8PathBuf>) -> Self {
        self.extra_classpath = entries;
        self
    }

    /// Artifact, output directory, then extras.
    pub fn classpath(&self) -> impl Iterator<Item = &Utf8Path> {
        [self.artifact.as_path(), self.output_dir.as_path()]
            .into_iter()
            .chain(self.extra_classpath.iter().map(Utf8PathBuf::as_path))
    }
}

/// How to turn a [`WorkerSpec`] into a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    launcher: String,
    args: Vec<String>,
    port_property: String,
    main_class: String,
}

impl WorkerCommand {
    /// Creates the command described by the runtime settings.
    #[must_use]
    pub fn from_config(runtime: &RuntimeConfig) -> Self {
        Self {
            launcher: runtime.launcher.clone(),
            args: runtime.launcher_args.clone(),
            port_property: runtime.port_property.clone(),
            main_class: runtime.main_class.clone(),
        }
    }

    /// Returns the launcher program.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.launcher
    }

    /// Builds the argument list for `spec`.
    pub fn arguments(&self, spec: &WorkerSpec) -> Result<Vec<OsString>, SupervisorError> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.push(format!("-D{}={}", self.port_property, spec.port).into());
        args.push("-cp".into());
        args.push(std::env::join_paths(spec.classpath())?);
        args.push(self.main_class.clone().into());
        Ok(args)
    }

    /// Builds a ready-to-spawn command for `spec`.
    pub fn command(&self, spec: &WorkerSpec) -> Result<Command, SupervisorError> {
        let mut command = Command::new(&self.launcher);
        command
            .args(self.arguments(spec)?)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        Ok(command)
    }
}

/// Identity of the live worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerHandle {
    /// OS process id.
    pub pid: u32,
    /// When the process was spawned.
    pub started_at: Instant,
}

impl WorkerHandle {
    /// Time since the worker was spawned.
    #[must_use]
    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_worker_arguments() {
        let runtime = RuntimeConfig {
            launcher_args: vec!["-Xmx256m".to_owned()],
            ..RuntimeConfig::default()
        };
        let spec = WorkerSpec::new("rt/hotloop-runtime-1.0.jar", "build", 9000)
            .with_extra_classpath(vec![Utf8PathBuf::from(".hotloop/lib/gson-2.11.0.jar")]);

        let args = WorkerCommand::from_config(&runtime)
            .arguments(&spec)
            .expect("Arguments should build");
        let args: Vec<&str> = args.iter().filter_map(|a| a.to_str()).collect();

        assert_eq!(
            args,
            vec![
                "-Xmx256m",
                "-Dhotloop.port=9000",
                "-cp",
                "rt/hotloop-runtime-1.0.jar:build:.hotloop/lib/gson-2.11.0.jar",
                "dev.hotloop.runtime.Main",
            ]
        );
    }

    #[test]
    fn test_classpath_order() {
        let spec = WorkerSpec::new("rt.jar", "build", 8080)
            .with_extra_classpath(vec![Utf8PathBuf::from("a.jar"), Utf8PathBuf::from("b.jar")]);
        let entries: Vec<&str> = spec.classpath().map(Utf8Path::as_str).collect();
        assert_eq!(entries, vec!["rt.jar", "build", "a.jar", "b.jar"]);
    }
}
