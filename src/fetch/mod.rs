//! FETCH half - getting package archives onto disk
//!
//! - **mirror**: `$repo`/`$arch` template resolution
//! - **transport**: the HTTP GET seam and its ureq implementation
//! - **download**: one package, mirrors tried in order, streamed to disk
//! - **batch**: every package concurrently under one limiter

pub mod batch;
pub mod download;
pub mod error;
pub mod mirror;
pub mod transport;

pub use batch::BatchReport;
pub use download::{CHUNK_SIZE, DownloadOutcome, Fetcher, PackageRequest};
pub use error::FetchError;
pub use transport::{HttpResponse, Transport, UreqTransport};
