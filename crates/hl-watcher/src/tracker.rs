//! Telling modifications apart from creations.
//!
//! The debouncer reports a new file and a write to an existing one the same
//! way. [`ChangeTracker`] remembers which source files exist: it is seeded
//! from the tree when the subscription starts, the first event for any other
//! file only records it, and later events for it are forwarded. A file that
//! disappears is forgotten, so recreating it counts as a creation again.

use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};

use crate::error::WatchError;
use crate::events::WatchEvent;
use crate::filter::FileFilter;

pub(crate) struct ChangeTracker<F> {
    filter: F,
    known: FxHashSet<Utf8PathBuf>,
}

impl<F: FileFilter> ChangeTracker<F> {
    pub(crate) fn new(filter: F) -> Self {
        Self {
            filter,
            known: FxHashSet::default(),
        }
    }

    /// Records every file under `root` the filter accepts.
    pub(crate) fn seed(&mut self, root: &Utf8Path, recursive: bool) {
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .max_depth(if recursive { None } else { Some(1) })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "Skipping entry while seeding known files");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            match Utf8Path::from_path(entry.path()) {
                Some(path) if self.filter.should_process(path) => {
                    self.known.insert(path.to_owned());
                }
                _ => {}
            }
        }

        debug!(root = %root, files = self.known.len(), "Seeded known source files");
    }

    /// Converts a debounced notification into a [`WatchEvent`], or `None`
    /// when it is filtered out, is not a file, or is the first sighting of
    /// a new file.
    pub(crate) fn observe(&mut self, path: PathBuf) -> Option<WatchEvent> {
        let path = match Utf8PathBuf::try_from(path) {
            Ok(p) => p,
            Err(e) => {
                let err = WatchError::NonUtf8Path(e.into_path_buf());
                warn!(error = %err, "Skipping file event");
                return None;
            }
        };

        if !self.filter.should_process(&path) {
            trace!(path = %path, "Filtered out file event");
            return None;
        }

        // Removals and directory renames are not modifications
        if !path.is_file() {
            trace!(path = %path, "Ignoring event for a path that is not a file");
            self.known.remove(&path);
            return None;
        }

        if self.known.insert(path.clone()) {
            debug!(path = %path, "New source file, waiting for a modification");
            return None;
        }

        Some(WatchEvent::modified(path))
    }
}
