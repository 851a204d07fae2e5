//! Error types for the hl-watcher crate.

use camino::Utf8PathBuf;

/// Errors raised while establishing or running the watch subscription.
///
/// Only [`WatchError::NonUtf8Path`] is recoverable: the offending event is
/// skipped and watching continues. Everything else ends the subscription,
/// and the orchestrator treats a failure to subscribe as fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The notify backend failed to initialize or to register the root.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The watch root does not exist.
    #[error("watch root does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// The watch root exists but is a file.
    #[error("watch root is not a directory: {0}")]
    NotADirectory(Utf8PathBuf),

    /// The blocking watcher task went away before shutdown completed.
    #[error("watcher task ended unexpectedly")]
    ChannelClosed,

    /// A changed path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// Canonicalizing the watch root failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Creates a new [`WatchError::PathNotFound`] error.
    #[inline]
    pub fn path_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Returns `true` if watching can continue after this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NonUtf8Path(_))
    }

    /// Returns `true` if the subscription cannot continue.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the watch root associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::PathNotFound(path) | Self::NotADirectory(path) => Some(path),
            Self::Notify(_) | Self::ChannelClosed | Self::NonUtf8Path(_) | Self::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_path_not_found_is_fatal() {
        let err = WatchError::path_not_found("app/src");
        assert!(err.is_fatal());
        assert_eq!(err.path().map(|p| p.as_str()), Some("app/src"));
        insta::assert_snapshot!(err.to_string(), @"watch root does not exist: app/src");
    }

    #[test]
    fn test_not_a_directory_reports_path() {
        let err = WatchError::NotADirectory(Utf8PathBuf::from("app/hotloop.json"));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_non_utf8_is_recoverable() {
        let err = WatchError::NonUtf8Path(PathBuf::from("odd"));
        assert!(err.is_recoverable());
        assert!(err.path().is_none());
    }

    #[test]
    fn test_channel_closed_display() {
        assert_eq!(
            WatchError::ChannelClosed.to_string(),
            "watcher task ended unexpectedly"
        );
    }
}
