//! Fetch error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while downloading packages.
#[derive(Error, Debug)]
pub enum FetchError {
    /// One mirror attempt failed. Recovered by trying the next mirror.
    #[error("GET {url} failed: {reason}")]
    MirrorUnreachable { url: String, reason: String },

    /// Every mirror failed for one package.
    #[error("no mirror could serve {package} (tried {})", .tried.join(", "))]
    DownloadExhausted { package: String, tried: Vec<String> },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is locked by another download", .0.display())]
    DestinationLocked(PathBuf),

    #[error("error reading body of {url}: {source}")]
    Stream {
        url: String,
        source: std::io::Error,
    },

    #[error("download task for {package} did not complete: {message}")]
    Task { package: String, message: String },

    #[error("{} package(s) failed to download: {}", .0.len(), .0.join(", "))]
    BatchFailed(Vec<String>),
}
