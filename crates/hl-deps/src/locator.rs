//! Runtime artifact location.
//!
//! The worker needs a prebuilt runtime jar. [`locate`] scans an ordered list
//! of candidate directories and returns the first file matching an
//! [`ArtifactPattern`]. Order encodes priority: project-local build output
//! comes before a global install.
//!
//! # Default Search Order
//!
//! 1. `runtime.searchPaths` from the descriptor (relative to the project root)
//! 2. Entries of the `HOTLOOP_RUNTIME_PATH` environment variable
//! 3. `../../runtime/target`, `../runtime/target`, `runtime/target` under the
//!    project root
//! 4. `../runtime/target` next to the `hotloop` executable

use std::ffi::OsStr;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use crate::error::LocateError;

/// Environment variable holding extra locator directories.
pub const RUNTIME_PATH_ENV: &str = "HOTLOOP_RUNTIME_PATH";

/// File extension of runtime artifacts and cached dependencies.
pub const JAR_EXTENSION: &str = "jar";

/// Suffixes of companion archives that are never the runtime itself.
const EXCLUDED_SUFFIXES: &[&str] = &["-sources.jar", "-javadoc.jar"];

/// Project-relative fallbacks, nearest checkout layout last.
const RELATIVE_CANDIDATES: &[&str] = &["../../runtime/target", "../runtime/target", "runtime/target"];

/// Filename pattern for the runtime artifact: a required prefix and the
/// `.jar` suffix, excluding source and javadoc archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPattern {
    prefix: String,
}

impl ArtifactPattern {
    /// Creates a pattern requiring `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns `true` if `file_name` is a runtime artifact.
    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.starts_with(&self.prefix)
            && Utf8Path::new(file_name).extension() == Some(JAR_EXTENSION)
            && !EXCLUDED_SUFFIXES.iter().any(|s| file_name.ends_with(s))
    }
}

/// Returns the first matching artifact across `candidates`, in order.
///
/// Missing or unreadable candidate directories are skipped. Within one
/// directory, matches are compared by file name so the result doesn't depend
/// on the platform's listing order.
///
/// # Errors
///
/// Returns [`LocateError::NotFound`] if no candidate contains a match.
pub fn locate(pattern: &ArtifactPattern, candidates: &[Utf8PathBuf]) -> Result<Utf8PathBuf, LocateError> {
    for dir in candidates {
        if let Some(found) = first_match(pattern, dir) {
            info!(artifact = %found, "Found runtime artifact");
            return Ok(found);
        }
    }

    Err(LocateError::NotFound {
        searched: candidates.to_vec(),
    })
}

fn first_match(pattern: &ArtifactPattern, dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let entries = match dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir, error = %e, "Skipping locator candidate");
            return None;
        }
    };

    entries
        .filter_map(Result::ok)
        .filter(|entry| pattern.matches(entry.file_name()))
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.path().to_owned())
        .min_by(|a, b| a.file_name().cmp(&b.file_name()))
}

/// Builds the candidate list for a project.
///
/// Reads [`RUNTIME_PATH_ENV`] and the current executable location.
pub fn search_paths(configured: &[Utf8PathBuf], project_root: &Utf8Path) -> Vec<Utf8PathBuf> {
    let env_value = std::env::var_os(RUNTIME_PATH_ENV);
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| Utf8PathBuf::from_path_buf(exe).ok())
        .and_then(|exe| exe.parent().map(Utf8Path::to_path_buf));

    assemble_search_paths(configured, env_value.as_deref(), project_root, exe_dir.as_deref())
}

fn assemble_search_paths(
    configured: &[Utf8PathBuf],
    env_value: Option<&OsStr>,
    project_root: &Utf8Path,
    exe_dir: Option<&Utf8Path>,
) -> Vec<Utf8PathBuf> {
    let mut paths: Vec<Utf8PathBuf> = configured.iter().map(|p| project_root.join(p)).collect();

    if let Some(value) = env_value {
        paths.extend(
            std::env::split_paths(value)
                .filter(|p| !p.as_os_str().is_empty())
                .filter_map(|p| Utf8PathBuf::from_path_buf(p).ok()),
        );
    }

    paths.extend(RELATIVE_CANDIDATES.iter().map(|c| project_root.join(c)));

    if let Some(exe_dir) = exe_dir {
        paths.push(exe_dir.join("../runtime/target"));
    }

    paths
}
