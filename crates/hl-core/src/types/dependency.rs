//! Dependency specs, repository coordinates, and cached artifacts.

use std::fmt;

use camino::Utf8PathBuf;
use serde::Serialize;

/// A declared dependency: symbolic name plus version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DependencySpec {
    /// Symbolic name, e.g. `gson`.
    pub name: String,
    /// Version string, e.g. `2.10.1`.
    pub version: String,
}

impl DependencySpec {
    /// Creates a new spec.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Group/artifact coordinate in a remote repository.
///
/// # Examples
///
/// ```
/// use hl_core::Coordinate;
///
/// let gson = Coordinate::new("com.google.code.gson", "gson");
/// assert_eq!(gson.group_path(), "com/google/code/gson");
/// assert_eq!(gson.file_name("2.10.1", "jar"), "gson-2.10.1.jar");
/// assert_eq!(
///     gson.url("https://repo.example/m2", "2.10.1", "jar"),
///     "https://repo.example/m2/com/google/code/gson/gson/2.10.1/gson-2.10.1.jar",
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    /// Dotted group id.
    pub group_id: &'static str,
    /// Artifact id.
    pub artifact_id: &'static str,
}

impl Coordinate {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(group_id: &'static str, artifact_id: &'static str) -> Self {
        Self {
            group_id,
            artifact_id,
        }
    }

    /// Group id with dots replaced by path separators.
    #[must_use]
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// Cache file name: `{artifactId}-{version}.{ext}`.
    #[must_use]
    pub fn file_name(&self, version: &str, ext: &str) -> String {
        format!("{}-{version}.{ext}", self.artifact_id)
    }

    /// Remote URL: `{base}/{groupPath}/{artifactId}/{version}/{artifactId}-{version}.{ext}`.
    #[must_use]
    pub fn url(&self, base: &str, version: &str, ext: &str) -> String {
        format!(
            "{}/{}/{}/{version}/{}",
            base.trim_end_matches('/'),
            self.group_path(),
            self.artifact_id,
            self.file_name(version, ext),
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// An artifact present in the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedArtifact {
    /// Repository coordinate.
    pub coordinate: Coordinate,
    /// Version.
    pub version: String,
    /// Location on disk.
    pub path: Utf8PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_display() {
        assert_eq!(DependencySpec::new("jackson", "2.17.0").to_string(), "jackson@2.17.0");
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let coord = Coordinate::new("org.postgresql", "postgresql");
        assert_eq!(
            coord.url("https://repo1.maven.org/maven2/", "42.7.3", "jar"),
            "https://repo1.maven.org/maven2/org/postgresql/postgresql/42.7.3/postgresql-42.7.3.jar"
        );
    }

    #[test]
    fn test_coordinate_display() {
        let coord = Coordinate::new("com.auth0", "java-jwt");
        assert_eq!(coord.to_string(), "com.auth0:java-jwt");
    }
}
