//! Byte sources: local files, remote URLs, and in-memory uploads

use crate::session::Handle;
use pixpack_core::{PixpackError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const RETRY_BASE_DELAY_MS: u64 = 500;

/// A named byte buffer selected for ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Read a whole file into memory, named by its final path component
pub async fn read_full_buffer(path: &Path) -> Result<RawFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            PixpackError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("no file name in {}", path.display()),
            ))
        })?
        .to_string();
    let bytes = tokio::fs::read(path).await?;
    Ok(RawFile { name, bytes })
}

/// HTTP fetch settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_retries: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

/// Where an archive comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    /// A local file; yields a handle for saving back
    File(PathBuf),
    /// A remote URL; no handle
    Url(String),
    /// Bytes already in memory; no handle
    Bytes(RawFile),
}

/// Bytes obtained from a source
#[derive(Debug, Clone)]
pub struct Acquired {
    pub name: String,
    pub bytes: Vec<u8>,
    pub handle: Option<Handle>,
}

impl ArchiveSource {
    /// Interpret a command-line argument as a URL or a file path
    pub fn parse(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            ArchiveSource::Url(arg.to_string())
        } else {
            ArchiveSource::File(PathBuf::from(arg))
        }
    }

    /// Obtain the full archive buffer
    pub async fn acquire(self, fetch: &FetchOptions) -> Result<Acquired> {
        let acquired = match self {
            ArchiveSource::File(path) => {
                let file = read_full_buffer(&path).await?;
                Acquired {
                    name: file.name,
                    bytes: file.bytes,
                    handle: Some(Handle::new(path)),
                }
            }
            ArchiveSource::Url(url) => {
                if url.trim().is_empty() {
                    return Err(PixpackError::NoSourceSelected);
                }
                let opts = fetch.clone();
                let target = url.clone();
                let bytes = tokio::task::spawn_blocking(move || download_with_retry(&target, &opts))
                    .await
                    .map_err(|e| PixpackError::FetchFailed(format!("fetch task failed: {}", e)))??;
                Acquired {
                    name: url_file_name(&url),
                    bytes,
                    handle: None,
                }
            }
            ArchiveSource::Bytes(file) => Acquired {
                name: file.name,
                bytes: file.bytes,
                handle: None,
            },
        };

        if acquired.bytes.is_empty() {
            return Err(PixpackError::NoBytesAvailable(acquired.name));
        }
        debug!(name = %acquired.name, len = acquired.bytes.len(), "acquired archive bytes");
        Ok(acquired)
    }
}

fn url_file_name(url: &str) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').find(|segment| !segment.is_empty()))
        .unwrap_or(url)
        .to_string()
}

fn download_with_retry(url: &str, opts: &FetchOptions) -> Result<Vec<u8>> {
    let attempts = opts.max_retries.max(1);
    for attempt in 0..attempts {
        let agent = build_agent(opts.timeout);
        match agent.get(url).call() {
            Ok(response) => {
                let mut reader = response.into_body().into_reader();
                let mut bytes = Vec::new();
                std::io::Read::read_to_end(&mut reader, &mut bytes).map_err(|e| {
                    PixpackError::FetchFailed(format!("Failed to read {}: {}", url, e))
                })?;
                return Ok(bytes);
            }
            Err(e) => {
                if attempt + 1 < attempts && is_retryable_error(&e) {
                    warn!(%url, attempt, error = %e, "retrying fetch");
                    sleep_backoff(attempt);
                    continue;
                }
                return Err(PixpackError::FetchFailed(format!(
                    "Failed to download {}: {}",
                    url, e
                )));
            }
        }
    }

    Err(PixpackError::FetchFailed(format!(
        "Failed to download {} after retries",
        url
    )))
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    config.into()
}

fn is_retryable_error(e: &ureq::Error) -> bool {
    match e {
        ureq::Error::Timeout(_)
        | ureq::Error::Io(_)
        | ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound => true,
        ureq::Error::StatusCode(code) => matches!(code, 429 | 500 | 502 | 503 | 504),
        _ => false,
    }
}

fn sleep_backoff(attempt: usize) {
    let delay_ms = RETRY_BASE_DELAY_MS.saturating_mul(1u64 << attempt);
    std::thread::sleep(Duration::from_millis(delay_ms));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pixpack_source_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_source() {
        assert_eq!(
            ArchiveSource::parse("https://example.com/a.tar"),
            ArchiveSource::Url("https://example.com/a.tar".to_string())
        );
        assert_eq!(
            ArchiveSource::parse("designs/a.tar"),
            ArchiveSource::File(PathBuf::from("designs/a.tar"))
        );
    }

    #[test]
    fn test_url_file_name() {
        assert_eq!(url_file_name("https://example.com/x/design.tar?v=2"), "design.tar");
        assert_eq!(url_file_name("https://example.com/x/"), "x");
    }

    #[tokio::test]
    async fn test_read_full_buffer() {
        let dir = temp_dir();
        let path = dir.join("a.png");
        std::fs::write(&path, b"pixels").unwrap();

        let file = read_full_buffer(&path).await.unwrap();
        assert_eq!(file, RawFile::new("a.png", b"pixels".to_vec()));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_file_source_yields_handle() {
        let dir = temp_dir();
        let path = dir.join("design.tar");
        std::fs::write(&path, b"archive bytes").unwrap();

        let acquired = ArchiveSource::File(path.clone())
            .acquire(&FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(acquired.name, "design.tar");
        assert_eq!(acquired.handle, Some(Handle::new(&path)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let path = temp_dir().join("missing.tar");
        let err = ArchiveSource::File(path)
            .acquire(&FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PixpackError::IoError(_)));
    }

    #[tokio::test]
    async fn test_empty_sources_are_cancellations() {
        let err = ArchiveSource::Bytes(RawFile::new("empty.tar", Vec::new()))
            .acquire(&FetchOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_cancellation());

        let err = ArchiveSource::Url(String::new())
            .acquire(&FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PixpackError::NoSourceSelected));
    }
}
