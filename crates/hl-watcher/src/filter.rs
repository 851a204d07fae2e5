//! Path filtering for watch events.
//!
//! Filters run on the blocking watcher thread, before events reach the
//! channel. The orchestrator uses [`SourceFilter`], which accepts files with
//! the configured source extension and rejects anything below a hidden
//! (dot-prefixed) path component of the watch root.
//!
//! # Examples
//!
//! ```
//! use hl_watcher::{FileFilter, SourceFilter};
//! use camino::Utf8Path;
//!
//! let filter = SourceFilter::new(Utf8Path::new("/work/src"), "java");
//!
//! assert!(filter.should_process(Utf8Path::new("/work/src/demo/Hello.java")));
//! assert!(!filter.should_process(Utf8Path::new("/work/src/demo/notes.txt")));
//! assert!(!filter.should_process(Utf8Path::new("/work/src/.cache/Gen.java")));
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use smallvec::SmallVec;

/// A predicate deciding which changed paths reach the event channel.
///
/// Filters must be [`Send`], [`Sync`] and `'static` because they are moved
/// into the blocking watcher task.
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if a change to `path` should be forwarded.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// Accepts files whose extension is in a fixed set.
///
/// ```
/// use hl_watcher::{FileFilter, ExtensionFilter};
/// use camino::Utf8Path;
///
/// let filter = ExtensionFilter::new(&["java", "kt"]);
/// assert!(filter.should_process(Utf8Path::new("src/App.java")));
/// assert!(!filter.should_process(Utf8Path::new("src/App.class")));
/// ```
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: SmallVec<[String; 2]>,
}

impl ExtensionFilter {
    /// Creates a filter for the given extensions (without the leading dot).
    #[must_use]
    pub fn new(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl FileFilter for ExtensionFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// Rejects paths with a dot-prefixed component below `root`.
///
/// Components above the root are not inspected, so a project living under
/// `~/.projects/app` is still watched.
#[derive(Debug, Clone)]
pub struct HiddenPathFilter {
    root: Utf8PathBuf,
}

impl HiddenPathFilter {
    /// Creates a filter relative to `root`.
    #[must_use]
    pub fn new(root: &Utf8Path) -> Self {
        Self {
            root: root.to_owned(),
        }
    }

    /// Returns `true` if any component of `path` below the root starts with a dot.
    #[must_use]
    pub fn is_hidden(&self, path: &Utf8Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .any(|c| c.as_str().starts_with('.') && c.as_str() != "." && c.as_str() != "..")
    }
}

impl FileFilter for HiddenPathFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        !self.is_hidden(path)
    }
}

/// The orchestrator's filter: source extension and no hidden components.
///
/// The build pipeline still compiles hidden sources; edits to them just do
/// not trigger a rebuild.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    extension: ExtensionFilter,
    hidden: HiddenPathFilter,
}

impl SourceFilter {
    /// Creates a filter for `extension` (without the leading dot) under `root`.
    #[must_use]
    pub fn new(root: &Utf8Path, extension: &str) -> Self {
        Self {
            extension: ExtensionFilter::new(&[extension]),
            hidden: HiddenPathFilter::new(root),
        }
    }
}

impl FileFilter for SourceFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        self.extension.should_process(path) && self.hidden.should_process(path)
    }
}
