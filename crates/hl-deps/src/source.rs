//! Remote artifact sources.
//!
//! The resolver downloads through the [`ArtifactSource`] trait so that the
//! transport can be swapped out. [`HttpSource`] streams response bodies from
//! a Maven-layout HTTP repository.

use std::time::Duration;

use async_trait::async_trait;
use camino::Utf8Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::ResolveError;

/// Failure while streaming an artifact into a sink.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request or body transfer failed.
    #[error(transparent)]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// The server answered with a non-success status.
    #[error("HTTP {0}")]
    Status(u16),

    /// Writing to the sink failed.
    #[error(transparent)]
    Sink(std::io::Error),
}

impl FetchError {
    /// Attaches the URL and cache path to produce a [`ResolveError`].
    pub(crate) fn into_resolve_error(self, url: &str, path: &Utf8Path) -> ResolveError {
        match self {
            Self::Transport(source) => ResolveError::Network {
                url: url.to_owned(),
                source,
            },
            Self::Status(status) => ResolveError::Status {
                url: url.to_owned(),
                status,
            },
            Self::Sink(source) => ResolveError::write(path, source),
        }
    }
}

/// Something that can stream the artifact at a URL into a writer.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Streams the body at `url` into `sink`, returning the byte count.
    ///
    /// The sink is only committed to the cache if this returns `Ok`.
    async fn fetch(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<usize, FetchError>;
}

/// HTTP(S) artifact source backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Creates a source whose requests (including the body transfer) are
    /// bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hotloop/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ResolveError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ArtifactSource for HttpSource {
    async fn fetch(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<usize, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let mut written = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Transport(Box::new(e)))?
        {
            sink.write_all(&chunk).await.map_err(FetchError::Sink)?;
            written += chunk.len();
        }

        Ok(written)
    }
}
