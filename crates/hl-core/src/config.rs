//! Project descriptor for the hotloop development loop.
//!
//! The descriptor lives in `hotloop.json` at the project root. Every field is
//! optional; missing fields fall back to the defaults below:
//!
//! ```json
//! {
//!   "port": 8080,
//!   "sourceDir": "src",
//!   "outputDir": "build",
//!   "dependencies": { "jackson": "2.17.0" },
//!   "runtime": { "gracePeriodMs": 3000, "restartDelayMs": 500 },
//!   "repository": { "cacheDir": ".hotloop/lib", "timeoutSecs": 30 },
//!   "watch": { "debounceMs": 100, "sourceExtension": "java" }
//! }
//! ```
//!
//! - [`ProjectConfig`] - Root descriptor
//! - [`RuntimeConfig`] - Compiler, worker launcher, and runtime artifact settings
//! - [`RepositoryConfig`] - Remote artifact repository and local cache
//! - [`WatchConfig`] - File watcher settings (debouncing, recursion)

use std::collections::BTreeMap;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the project descriptor.
pub const DESCRIPTOR_FILE: &str = "hotloop.json";

/// Root project descriptor.
///
/// # Examples
///
/// ```
/// use hl_core::ProjectConfig;
///
/// let config = ProjectConfig::from_json(r#"{"port": 9000}"#).unwrap();
/// assert_eq!(config.port, 9000);
/// assert_eq!(config.source_dir.as_str(), "src");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Port handed to the worker process.
    pub port: u16,

    /// Source tree to watch and compile, relative to the project root.
    pub source_dir: Utf8PathBuf,

    /// Compiler output directory, relative to the project root.
    pub output_dir: Utf8PathBuf,

    /// Declared dependencies (symbolic name to version).
    pub dependencies: BTreeMap<String, String>,

    /// Compiler and worker settings.
    pub runtime: RuntimeConfig,

    /// Artifact repository settings.
    pub repository: RepositoryConfig,

    /// File watcher settings.
    pub watch: WatchConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            source_dir: Utf8PathBuf::from("src"),
            output_dir: Utf8PathBuf::from("build"),
            dependencies: BTreeMap::new(),
            runtime: RuntimeConfig::default(),
            repository: RepositoryConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Returns the descriptor path for a project root.
    #[must_use]
    pub fn descriptor_path(project_root: &Utf8Path) -> Utf8PathBuf {
        project_root.join(DESCRIPTOR_FILE)
    }

    /// Loads and validates the descriptor from `project_root`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDescriptor`] if `hotloop.json` does not
    /// exist, [`ConfigError::Io`] if it cannot be read, and
    /// [`ConfigError::Parse`] / [`ConfigError::InvalidOption`] if its content
    /// is not a valid descriptor.
    pub fn load(project_root: &Utf8Path) -> Result<Self, ConfigError> {
        let path = Self::descriptor_path(project_root);
        if !path.is_file() {
            return Err(ConfigError::MissingDescriptor(path));
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        let config = Self::from_json(&content)?;
        tracing::debug!(path = %path, port = config.port, "Loaded project descriptor");
        Ok(config)
    }

    /// Parses and validates a descriptor from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::InvalidOption`] if validation fails.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks option values that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] naming the first invalid option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::invalid_option("port", "must be nonzero"));
        }
        if self.source_dir.as_str().is_empty() {
            return Err(ConfigError::invalid_option("sourceDir", "must not be empty"));
        }
        if self.output_dir.as_str().is_empty() {
            return Err(ConfigError::invalid_option("outputDir", "must not be empty"));
        }
        if self.watch.source_extension.is_empty() || self.watch.source_extension.starts_with('.')
        {
            return Err(ConfigError::invalid_option(
                "watch.sourceExtension",
                "must be a bare extension such as \"java\"",
            ));
        }
        if self.runtime.grace_period_ms == 0 {
            return Err(ConfigError::invalid_option(
                "runtime.gracePeriodMs",
                "must be nonzero",
            ));
        }
        if self.repository.timeout_secs == 0 {
            return Err(ConfigError::invalid_option(
                "repository.timeoutSecs",
                "must be nonzero",
            ));
        }
        // Versions become part of cache file names and repository URLs
        for (name, version) in &self.dependencies {
            if version.is_empty()
                || version == "."
                || version == ".."
                || version.contains(['/', '\\'])
            {
                return Err(ConfigError::invalid_option(
                    format!("dependencies.{name}"),
                    format!("invalid version {version:?}"),
                ));
            }
        }
        Ok(())
    }

    /// Resolves the source tree against the project root.
    #[must_use]
    pub fn source_root(&self, project_root: &Utf8Path) -> Utf8PathBuf {
        project_root.join(&self.source_dir)
    }

    /// Resolves the compiler output directory against the project root.
    #[must_use]
    pub fn output_root(&self, project_root: &Utf8Path) -> Utf8PathBuf {
        project_root.join(&self.output_dir)
    }

    /// Resolves the dependency cache directory against the project root.
    #[must_use]
    pub fn cache_root(&self, project_root: &Utf8Path) -> Utf8PathBuf {
        project_root.join(&self.repository.cache_dir)
    }

    /// Lists the options that changed between `self` and `newer` but only
    /// take effect after the development loop is restarted.
    #[must_use]
    pub fn restart_required_changes(&self, newer: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.source_dir != newer.source_dir {
            changed.push("sourceDir");
        }
        if self.output_dir != newer.output_dir {
            changed.push("outputDir");
        }
        if self.dependencies != newer.dependencies {
            changed.push("dependencies");
        }
        if self.runtime != newer.runtime {
            changed.push("runtime");
        }
        if self.repository != newer.repository {
            changed.push("repository");
        }
        if self.watch != newer.watch {
            changed.push("watch");
        }
        changed
    }
}

/// Compiler, worker launcher, and runtime artifact settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// External compiler program.
    pub compiler: String,

    /// Arguments passed to the compiler ahead of the classpath, e.g.
    /// `["-parameters", "-Xlint:unchecked"]`.
    pub compiler_args: Vec<String>,

    /// External program that runs the worker.
    pub launcher: String,

    /// Arguments passed to the launcher ahead of the port property, e.g.
    /// `["-Xmx512m"]`.
    pub launcher_args: Vec<String>,

    /// Entry point class passed to the launcher.
    pub main_class: String,

    /// System property name that receives the port.
    pub port_property: String,

    /// Required file name prefix of the runtime artifact.
    pub artifact_prefix: String,

    /// Extra runtime artifact search paths, highest priority first.
    pub search_paths: Vec<Utf8PathBuf>,

    /// Time a worker is given to exit after a graceful termination request.
    pub grace_period_ms: u64,

    /// Pause between a successful compile and the worker launch.
    pub restart_delay_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            compiler: "javac".to_owned(),
            compiler_args: Vec::new(),
            launcher: "java".to_owned(),
            launcher_args: Vec::new(),
            main_class: "dev.hotloop.runtime.Main".to_owned(),
            port_property: "hotloop.port".to_owned(),
            artifact_prefix: "hotloop-runtime".to_owned(),
            search_paths: Vec::new(),
            grace_period_ms: 3000,
            restart_delay_ms: 500,
        }
    }
}

impl RuntimeConfig {
    /// Grace period as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Restart delay as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

/// Remote artifact repository and local cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryConfig {
    /// Base URL of the remote repository.
    pub base_url: String,

    /// Cache directory, relative to the project root.
    pub cache_dir: Utf8PathBuf,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://repo1.maven.org/maven2".to_owned(),
            cache_dir: Utf8PathBuf::from(".hotloop/lib"),
            timeout_secs: 30,
        }
    }
}

impl RepositoryConfig {
    /// Request timeout as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for the file watcher.
///
/// # Examples
///
/// ```
/// use hl_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.debounce_ms, 100);
/// assert!(config.recursive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatchConfig {
    /// Debounce window in milliseconds.
    ///
    /// Multiple notifications for one file within this window collapse into
    /// a single event.
    pub debounce_ms: u64,

    /// Whether to watch subdirectories recursively.
    pub recursive: bool,

    /// Source file extension (without the leading dot).
    pub source_extension: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            recursive: true,
            source_extension: "java".to_owned(),
        }
    }
}
