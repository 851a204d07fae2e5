//! Watch subscription bridged to the tokio runtime.
//!
//! [`FileWatcher`] runs the `notify` debouncer on a blocking thread and
//! forwards filtered [`WatchEvent`]s through a bounded mpsc channel. Dropping
//! the watcher or calling [`FileWatcher::shutdown`] releases the subscription.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use hl_core::WatchConfig;

use crate::error::WatchError;
use crate::events::WatchEvent;
use crate::filter::FileFilter;
use crate::tracker::ChangeTracker;

/// Channel capacity for change events.
const CHANNEL_CAPACITY: usize = 100;

/// A recursive watch subscription on a source tree.
///
/// # Lifecycle
///
/// 1. [`FileWatcher::new`] validates and canonicalizes the root, then spawns
///    the blocking notify task.
/// 2. [`FileWatcher::recv`] (or [`FileWatcher::events`] inside
///    `tokio::select!`) yields filtered events.
/// 3. [`FileWatcher::shutdown`] stops the task and awaits it. Dropping the
///    watcher sends the stop signal without waiting.
pub struct FileWatcher {
    /// Set to `None` once shutdown has been requested.
    shutdown_tx: Option<oneshot::Sender<()>>,

    task_handle: Option<JoinHandle<Result<(), WatchError>>>,

    event_rx: mpsc::Receiver<WatchEvent>,

    /// Canonical watch root.
    watch_path: Utf8PathBuf,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("watch_path", &self.watch_path)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Subscribes to changes under `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::PathNotFound`] if the root doesn't exist,
    /// [`WatchError::NotADirectory`] if it is a file, and
    /// [`WatchError::Io`] if it cannot be canonicalized. Backend
    /// registration failures surface from [`FileWatcher::shutdown`].
    #[allow(clippy::unused_async)] // Async for API consistency with shutdown()
    pub async fn new<F: FileFilter>(
        path: &Utf8Path,
        config: &WatchConfig,
        filter: F,
    ) -> Result<Self, WatchError> {
        if !path.exists() {
            return Err(WatchError::path_not_found(path));
        }
        if !path.is_dir() {
            return Err(WatchError::NotADirectory(path.to_owned()));
        }

        let watch_path = path.canonicalize_utf8()?;

        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task_path = watch_path.clone();
        let debounce = Duration::from_millis(config.debounce_ms);
        let recursive = config.recursive;

        let task_handle = tokio::task::spawn_blocking(move || {
            run_watcher_loop(&task_path, debounce, recursive, event_tx, shutdown_rx, filter)
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
            event_rx,
            watch_path,
        })
    }

    /// Receives the next change event.
    ///
    /// Returns `None` once the watcher task has stopped.
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.event_rx.recv().await
    }

    /// Returns the event receiver for use with `tokio::select!`.
    pub fn events(&mut self) -> &mut mpsc::Receiver<WatchEvent> {
        &mut self.event_rx
    }

    /// Returns the canonical watch root.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        &self.watch_path
    }

    /// Returns `true` while the blocking task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the subscription and waits for the watcher task to exit.
    ///
    /// # Errors
    ///
    /// Returns the error the watcher task ended with, or
    /// [`WatchError::ChannelClosed`] if it panicked.
    pub async fn shutdown(mut self) -> Result<(), WatchError> {
        if let Some(tx) = self.shutdown_tx.take() {
            // The task may already have exited on its own
            let _ = tx.send(());
        }

        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => result?,
                Err(_join_error) => return Err(WatchError::ChannelClosed),
            }
        }

        Ok(())
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Runs the notify debouncer until the shutdown signal arrives.
///
/// Files present before the subscription starts are seeded as known, so
/// their first write is forwarded.
fn run_watcher_loop<F: FileFilter>(
    path: &Utf8Path,
    debounce: Duration,
    recursive: bool,
    event_tx: mpsc::Sender<WatchEvent>,
    shutdown_rx: oneshot::Receiver<()>,
    filter: F,
) -> Result<(), WatchError> {
    let mut tracker = ChangeTracker::new(filter);
    tracker.seed(path, recursive);
    let mode = if recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };

    let debouncer_result: Result<Debouncer<notify::RecommendedWatcher>, notify::Error> =
        new_debouncer(debounce, move |res: DebounceEventResult| match res {
            Ok(events) => {
                for event in events {
                    let Some(watch_event) = tracker.observe(event.path) else {
                        continue;
                    };
                    if event_tx.blocking_send(watch_event).is_err() {
                        tracing::debug!("Event channel closed, stopping watcher");
                        break;
                    }
                }
            }
            Err(error) => tracing::warn!(error = ?error, "Debouncer error"),
        });

    let mut debouncer = debouncer_result?;
    debouncer.watcher().watch(path.as_std_path(), mode)?;

    tracing::info!(path = %path, "Watching for changes");

    let _ = shutdown_rx.blocking_recv();

    tracing::info!(path = %path, "File watcher stopped");

    Ok(())
}
