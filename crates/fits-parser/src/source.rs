//! Byte sources and sinks: where raw FITS bytes come from and go to.
//!
//! The codec itself never touches I/O. Loading asks a [`ByteSource`] for the
//! bytes at a location and only checks whether it got any; saving hands a
//! fully assembled buffer to a [`ByteSink`].

use std::io;
use std::path::Path;
#[cfg(feature = "http")]
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Something that can produce the raw bytes stored at a location.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Fetch the bytes at `location`, reporting why it failed.
    async fn try_fetch(&self, location: &str) -> Result<Vec<u8>>;

    /// Fetch the bytes at `location`. Any failure is logged and reported as
    /// an empty buffer.
    async fn fetch(&self, location: &str) -> Vec<u8> {
        match self.try_fetch(location).await {
            Ok(bytes) => {
                debug!(location, len = bytes.len(), "fetched bytes");
                bytes
            }
            Err(e) => {
                warn!(location, error = %e, "failed to fetch bytes");
                Vec::new()
            }
        }
    }
}

/// Something that can store a byte buffer at a path.
#[async_trait]
pub trait ByteSink: Send + Sync {
    async fn persist(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

/// Reads locations as local filesystem paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSource;

#[async_trait]
impl ByteSource for LocalFileSource {
    async fn try_fetch(&self, location: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(location).await?)
    }
}

/// Writes buffers to local filesystem paths, replacing existing files.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSink;

#[async_trait]
impl ByteSink for LocalFileSink {
    async fn persist(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(path, bytes).await?;
        debug!(path = %path.display(), len = bytes.len(), "wrote FITS file");
        Ok(())
    }
}

/// Settings for [`HttpSource`].
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout: Duration::from_secs(30),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// Fetches locations over HTTP(S). Non-success status codes are failures.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new() -> Result<Self> {
        Self::with_config(HttpConfig::default())
    }

    pub fn with_config(config: HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;
        Ok(HttpSource { client })
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl ByteSource for HttpSource {
    async fn try_fetch(&self, location: &str) -> Result<Vec<u8>> {
        let response = self.client.get(location).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Returns `true` when the first five characters of `location`, lower-cased,
/// contain `http`.
pub fn looks_like_http(location: &str) -> bool {
    let prefix: String = location.chars().take(5).collect();
    prefix.to_lowercase().contains("http")
}

/// Dispatches to HTTP or the local filesystem based on [`looks_like_http`].
#[derive(Debug, Clone)]
pub struct AutoSource {
    local: LocalFileSource,
    #[cfg(feature = "http")]
    http: HttpSource,
}

impl AutoSource {
    pub fn new() -> Result<Self> {
        Ok(AutoSource {
            local: LocalFileSource,
            #[cfg(feature = "http")]
            http: HttpSource::new()?,
        })
    }

    #[cfg(feature = "http")]
    pub fn with_http(http: HttpSource) -> Self {
        AutoSource {
            local: LocalFileSource,
            http,
        }
    }
}

#[async_trait]
impl ByteSource for AutoSource {
    async fn try_fetch(&self, location: &str) -> Result<Vec<u8>> {
        if !looks_like_http(location) {
            return self.local.try_fetch(location).await;
        }

        #[cfg(feature = "http")]
        {
            self.http.try_fetch(location).await
        }
        #[cfg(not(feature = "http"))]
        {
            Err(Error::Io(io::Error::new(
                io::ErrorKind::Unsupported,
                "HTTP locations need the `http` feature",
            )))
        }
    }
}

/// A source that always fails, for locations nothing can serve.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSource;

#[async_trait]
impl ByteSource for NullSource {
    async fn try_fetch(&self, location: &str) -> Result<Vec<u8>> {
        Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no source for {location}"),
        )))
    }
}
