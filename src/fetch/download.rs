//! Single-package download with mirror failover
//!
//! Mirrors are tried in list order. The first 2xx response wins and its body
//! is streamed to the destination in small chunks, reporting progress after
//! every write. Network and file I/O runs on tokio's blocking pool while the
//! task holds one permit of the shared limiter.

use super::error::FetchError;
use super::mirror;
use super::transport::{HttpResponse, Transport};
use crate::core::output;
use crate::core::progress::{NoProgress, ProgressSink, ProgressTracker};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Body chunk size. Small on purpose so progress moves smoothly.
pub const CHUNK_SIZE: usize = 512;

/// One unit of download work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRequest {
    repository: String,
    file: String,
    destination: PathBuf,
}

impl PackageRequest {
    pub fn new(
        repository: impl Into<String>,
        file: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repository: repository.into(),
            file: file.into(),
            destination: destination.into(),
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Package archive file name, also the last URL segment.
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// Result of one package download. Never mutated after creation.
#[derive(Debug)]
pub enum DownloadOutcome {
    Success { url: String, bytes: u64 },
    Failure(FetchError),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }

    /// Bytes written to the destination. Zero for failures.
    pub fn bytes_transferred(&self) -> u64 {
        match self {
            DownloadOutcome::Success { bytes, .. } => *bytes,
            DownloadOutcome::Failure(_) => 0,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            DownloadOutcome::Success { .. } => None,
            DownloadOutcome::Failure(e) => Some(e),
        }
    }
}

/// Downloads packages from an ordered list of mirror templates.
///
/// Cheap to clone; every clone shares the transport and progress sink.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    progress: Arc<dyn ProgressSink>,
    mirrors: Arc<[String]>,
    arch: String,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, mirrors: Vec<String>, arch: impl Into<String>) -> Self {
        Self {
            transport,
            progress: Arc::new(NoProgress),
            mirrors: mirrors.into(),
            arch: arch.into(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Download one package, holding a limiter permit for the whole
    /// network phase.
    pub async fn download(&self, request: PackageRequest, limiter: Arc<Semaphore>) -> DownloadOutcome {
        let package = request.file().to_string();
        let permit = match limiter.acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                return DownloadOutcome::Failure(FetchError::Task {
                    package,
                    message: e.to_string(),
                });
            }
        };
        output::debug(&format!("{}: acquired download slot", package));

        let fetcher = self.clone();
        let task = tokio::task::spawn_blocking(move || {
            // Released when the blocking I/O is done, whatever the result
            let _permit = permit;
            fetcher.fetch_blocking(&request)
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => DownloadOutcome::Failure(FetchError::Task {
                package,
                message: e.to_string(),
            }),
        }
    }

    /// The blocking body of [`Fetcher::download`], without the limiter.
    pub fn fetch_blocking(&self, request: &PackageRequest) -> DownloadOutcome {
        let (url, response) = match self.open_first_mirror(request) {
            Ok(found) => found,
            Err(e) => return DownloadOutcome::Failure(e),
        };

        let tracker = self.progress.track(request.file());
        tracker.set_total(response.content_length.unwrap_or(0));
        let result = stream_to_file(&url, response, request.destination(), tracker.as_ref());
        tracker.finish();

        match result {
            Ok(bytes) => {
                output::debug(&format!(
                    "{}: wrote {} bytes to {}",
                    request.file(),
                    bytes,
                    request.destination().display()
                ));
                DownloadOutcome::Success { url, bytes }
            }
            Err(e) => DownloadOutcome::Failure(e),
        }
    }

    /// Walk the mirror list in order and return the first successful response.
    fn open_first_mirror(&self, request: &PackageRequest) -> Result<(String, HttpResponse), FetchError> {
        let mut tried = Vec::with_capacity(self.mirrors.len());

        for template in self.mirrors.iter() {
            let base = mirror::resolve(template, request.repository(), &self.arch);
            let url = mirror::package_url(&base, request.file());

            let reason = match self.transport.get(&url) {
                Ok(response) if response.is_success() => {
                    output::debug(&format!(
                        "GET {} returned {}: {}",
                        url, response.status, response.reason
                    ));
                    return Ok((url, response));
                }
                Ok(response) => format!("{} {}", response.status, response.reason),
                Err(message) => message,
            };

            let failure = FetchError::MirrorUnreachable {
                url: url.clone(),
                reason,
            };
            output::warning(&failure.to_string());
            tried.push(url);
        }

        Err(FetchError::DownloadExhausted {
            package: request.file().to_string(),
            tried,
        })
    }
}

/// Ensure a file's parent directory exists.
fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Open the destination for exclusive writing, truncated only once locked.
fn open_destination(dest: &Path) -> Result<File, FetchError> {
    let write_err = |source| FetchError::Write {
        path: dest.to_path_buf(),
        source,
    };

    ensure_parent_dir(dest).map_err(write_err)?;
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(dest)
        .map_err(write_err)?;
    if file.try_lock_exclusive().is_err() {
        return Err(FetchError::DestinationLocked(dest.to_path_buf()));
    }
    file.set_len(0).map_err(write_err)?;
    Ok(file)
}

/// Stream a response body into `dest`, returning the bytes written.
///
/// A partially written file is removed on error.
fn stream_to_file(
    url: &str,
    response: HttpResponse,
    dest: &Path,
    tracker: &dyn ProgressTracker,
) -> Result<u64, FetchError> {
    let mut file = open_destination(dest)?;
    let mut reader = response.body;
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut total_bytes = 0u64;

    let result = loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break Ok(total_bytes),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                break Err(FetchError::Stream {
                    url: url.to_string(),
                    source,
                });
            }
        };

        if let Err(source) = file.write_all(&buffer[..bytes_read]) {
            break Err(FetchError::Write {
                path: dest.to_path_buf(),
                source,
            });
        }

        total_bytes += bytes_read as u64;
        tracker.advance(bytes_read as u64);
    };

    if result.is_err() {
        drop(file);
        let _ = std::fs::remove_file(dest);
    }
    result
}
