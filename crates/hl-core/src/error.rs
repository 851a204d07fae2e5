//! Error types for the hl-core crate.
//!
//! This module provides the [`ConfigError`] type for project descriptor
//! failures. Every variant is fatal: the development loop cannot start
//! without a valid descriptor.

use camino::Utf8PathBuf;

/// Errors that can occur while loading and validating the project descriptor.
///
/// # Examples
///
/// ```
/// use hl_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::MissingDescriptor(Utf8PathBuf::from("app/hotloop.json"));
/// assert!(error.to_string().contains("app/hotloop.json"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No descriptor file exists in the project root.
    #[error("no project descriptor found at {0}")]
    MissingDescriptor(Utf8PathBuf),

    /// A descriptor option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// The descriptor could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The descriptor path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor is not valid JSON or has fields of the wrong type.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Returns the path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::MissingDescriptor(path) | Self::Io { path, .. } => Some(path),
            Self::InvalidOption { .. } | Self::Parse(_) => None,
        }
    }
}
