//! Change events emitted by the watcher.
//!
//! ```text
//! File System Change
//!        │
//!        ▼
//! notify-debouncer-mini (100ms debounce)
//!        │
//!        ▼
//!   filter + "still a file?" + "seen before?" checks
//!        │
//!        ▼
//!   WatchEvent { kind: Modified }
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Kind of change observed.
///
/// The orchestrator only reacts to modifications of existing source files;
/// creations and removals are never forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ChangeKind {
    /// File content changed.
    Modified,
}

/// A debounced change to one source file.
///
/// Ephemeral: events are consumed by the orchestrator and never stored.
///
/// # Examples
///
/// ```
/// use hl_watcher::{ChangeKind, WatchEvent};
/// use camino::Utf8PathBuf;
///
/// let event = WatchEvent::modified(Utf8PathBuf::from("src/demo/Hello.java"));
/// assert_eq!(event.kind, ChangeKind::Modified);
/// assert_eq!(event.file_name(), Some("Hello.java"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Absolute path of the changed file.
    pub path: Utf8PathBuf,

    /// What happened to the file.
    pub kind: ChangeKind,
}

impl WatchEvent {
    /// Creates a [`ChangeKind::Modified`] event.
    #[inline]
    #[must_use]
    pub fn modified(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Modified,
        }
    }

    /// Returns the file name without the directory path.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }

    /// Returns the path relative to `root`, or the full path when it lies
    /// outside of `root`.
    #[must_use]
    pub fn relative_to<'a>(&'a self, root: &Utf8Path) -> &'a Utf8Path {
        self.path.strip_prefix(root).unwrap_or(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modified_event() {
        let event = WatchEvent::modified("/work/src/App.java");
        assert_eq!(event.kind, ChangeKind::Modified);
        assert_eq!(event.path.as_str(), "/work/src/App.java");
    }

    #[test]
    fn test_relative_to_root() {
        let event = WatchEvent::modified("/work/src/demo/App.java");
        assert_eq!(event.relative_to(Utf8Path::new("/work/src")).as_str(), "demo/App.java");
        assert_eq!(
            event.relative_to(Utf8Path::new("/elsewhere")).as_str(),
            "/work/src/demo/App.java"
        );
    }
}
