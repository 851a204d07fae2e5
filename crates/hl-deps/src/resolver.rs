//! Dependency resolution.
//!
//! [`Resolver::resolve`] expands the declared dependencies, then resolves
//! every spec concurrently and independently: a registry miss, a failed
//! download or a failed write only affects its own [`Resolution`].

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use futures_util::future::join_all;
use hl_core::{CachedArtifact, DependencySpec, ProjectConfig};
use tracing::{debug, info, warn};

use crate::cache::ArtifactCache;
use crate::error::ResolveError;
use crate::locator::JAR_EXTENSION;
use crate::registry;
use crate::source::{ArtifactSource, HttpSource};

/// Outcome for one expanded spec.
#[derive(Debug)]
pub struct Resolution {
    /// The spec that was resolved.
    pub spec: DependencySpec,
    /// The cached artifact, or why it is unavailable.
    pub result: Result<CachedArtifact, ResolveError>,
}

/// Per-spec outcomes, in expanded-spec order.
#[derive(Debug, Default)]
pub struct Resolutions {
    entries: Vec<Resolution>,
}

impl Resolutions {
    /// Returns the outcomes in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Resolution> {
        self.entries.iter()
    }

    /// Returns the number of expanded specs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths of every successfully resolved artifact, in spec order.
    #[must_use]
    pub fn classpath(&self) -> Vec<Utf8PathBuf> {
        self.entries
            .iter()
            .filter_map(|r| r.result.as_ref().ok())
            .map(|artifact| artifact.path.clone())
            .collect()
    }

    /// Specs that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&DependencySpec, &ResolveError)> {
        self.entries
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|e| (&r.spec, e)))
    }

    /// Names of the specs that failed to resolve.
    #[must_use]
    pub fn unresolved_names(&self) -> Vec<String> {
        self.failures().map(|(spec, _)| spec.name.clone()).collect()
    }

    /// Number of successfully resolved specs.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|r| r.result.is_ok()).count()
    }

    /// Number of failed specs.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.len() - self.resolved_count()
    }
}

impl IntoIterator for Resolutions {
    type Item = Resolution;
    type IntoIter = std::vec::IntoIter<Resolution>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Resolutions {
    type Item = &'a Resolution;
    type IntoIter = std::slice::Iter<'a, Resolution>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Resolves declared dependencies into cached jars.
///
/// # Example
///
/// ```ignore
/// use hl_deps::Resolver;
///
/// let resolver = Resolver::from_config(&project_root, &config)?;
/// let resolutions = resolver.resolve(&config.dependencies).await;
/// for (spec, error) in resolutions.failures() {
///     eprintln!("{spec}: {error}");
/// }
/// let classpath = resolutions.classpath();
/// ```
#[derive(Debug)]
pub struct Resolver<S = HttpSource> {
    source: S,
    cache: ArtifactCache,
    base_url: String,
}

impl Resolver<HttpSource> {
    /// Creates an HTTP-backed resolver from the project's repository settings.
    pub fn from_config(project_root: &Utf8Path, config: &ProjectConfig) -> Result<Self, ResolveError> {
        let source = HttpSource::new(config.repository.timeout())?;
        let cache = ArtifactCache::new(config.cache_root(project_root));
        Ok(Self::new(source, cache, config.repository.base_url.clone()))
    }
}

impl<S: ArtifactSource> Resolver<S> {
    /// Creates a resolver over an arbitrary source.
    pub fn new(source: S, cache: ArtifactCache, base_url: impl Into<String>) -> Self {
        Self {
            source,
            cache,
            base_url: base_url.into(),
        }
    }

    /// Returns the artifact cache.
    #[must_use]
    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Expands and resolves `declared`, one outcome per expanded spec.
    pub async fn resolve(&self, declared: &BTreeMap<String, String>) -> Resolutions {
        let specs = registry::expand(declared);
        let results = join_all(specs.iter().map(|spec| self.resolve_one(spec))).await;

        let entries = specs
            .into_iter()
            .zip(results)
            .map(|(spec, result)| {
                match &result {
                    Ok(artifact) => info!(dependency = %spec, path = %artifact.path, "Resolved dependency"),
                    Err(e) => warn!(dependency = %spec, error = %e, "Failed to resolve dependency"),
                }
                Resolution { spec, result }
            })
            .collect();

        Resolutions { entries }
    }

    /// Resolves a single spec without expansion.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownDependency`] without touching the
    /// network if the name isn't registered, otherwise a network, status or
    /// write error if the download fails.
    pub async fn resolve_one(&self, spec: &DependencySpec) -> Result<CachedArtifact, ResolveError> {
        let coordinate = registry::lookup(&spec.name).ok_or_else(|| ResolveError::unknown(&spec.name))?;
        let path = self.cache.path_for(&coordinate, &spec.version);
        let artifact = CachedArtifact {
            coordinate,
            version: spec.version.clone(),
            path: path.clone(),
        };

        if self.cache.contains(&path).await {
            debug!(dependency = %spec, "Cache hit");
            return Ok(artifact);
        }

        let url = coordinate.url(&self.base_url, &spec.version, JAR_EXTENSION);
        debug!(dependency = %spec, url = %url, "Downloading");

        let mut pending = self
            .cache
            .begin(&path)
            .await
            .map_err(|e| ResolveError::write(&path, e))?;
        let bytes = self
            .source
            .fetch(&url, pending.writer())
            .await
            .map_err(|e| e.into_resolve_error(&url, &path))?;
        pending.commit().await.map_err(|e| ResolveError::write(&path, e))?;

        debug!(dependency = %spec, bytes, "Downloaded");
        Ok(artifact)
    }
}
