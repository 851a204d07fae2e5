//! Source file discovery.
//!
//! [`SourceWalker`] uses the `ignore` crate to walk the source root and
//! collect every file with the configured extension, hidden files and
//! directories included. Ignore files (`.gitignore` and friends) are not
//! consulted. Symbolic links are not followed.
//!
//! Traversal is sorted by file name, so the file list is stable across runs.

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;

use crate::error::BuildError;

/// Discovers source files under a root directory.
///
/// # Examples
///
/// ```ignore
/// use hl_build::SourceWalker;
/// use camino::Utf8Path;
///
/// let walker = SourceWalker::new(Utf8Path::new("./src"), "java")?;
/// let files = walker.collect_paths()?;
/// println!("Found {} source files", files.len());
/// ```
#[derive(Debug, Clone)]
pub struct SourceWalker {
    root: Utf8PathBuf,
    extension: String,
}

impl SourceWalker {
    /// Creates a walker for files ending in `.{extension}` under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingSourceRoot`] if `root` is not a directory.
    pub fn new(root: &Utf8Path, extension: &str) -> Result<Self, BuildError> {
        if !root.is_dir() {
            return Err(BuildError::MissingSourceRoot(root.to_owned()));
        }

        Ok(Self {
            root: root.to_owned(),
            extension: extension.to_owned(),
        })
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Collects every matching source file.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Walk`] if traversal fails and
    /// [`BuildError::NonUtf8Path`] for a non-UTF-8 path.
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, BuildError> {
        let mut paths = Vec::new();

        for result in self.build_walker() {
            let entry = result?;

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let utf8_path =
                Utf8Path::from_path(path).ok_or_else(|| BuildError::NonUtf8Path(path.to_owned()))?;

            if self.is_source_file(utf8_path) {
                paths.push(utf8_path.to_owned());
            }
        }

        Ok(paths)
    }

    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            .standard_filters(false)
            .hidden(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build()
    }

    fn is_source_file(&self, path: &Utf8Path) -> bool {
        path.extension() == Some(self.extension.as_str())
    }
}
