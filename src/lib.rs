//! Concurrent package fetcher and installer for LevitateOS
//!
//! Downloads pacman-style package archives (`.pkg.tar.zst`) from an ordered
//! list of mirrors, several at a time, then unpacks them into an install root.
//!
//! # Fetching
//!
//! Mirrors are URL templates containing `$repo` and `$arch`:
//!
//! ```text
//! https://mirror.pkgbuild.com/$repo/os/$arch
//! ```
//!
//! For every package the mirrors are tried in order until one answers with a
//! success status. The body is streamed to disk in 512-byte chunks while a
//! progress bar advances. All packages download concurrently, but at most
//! `max_concurrent_downloads` (default 3) transfer at any moment.
//!
//! If any package cannot be fetched from any mirror, nothing is installed.
//!
//! # Installing
//!
//! Each package is decompressed to a scratch file and its tar entries are
//! listed. Entries whose name starts with "." (`.PKGINFO`, `.MTREE`, ...) are
//! never extracted. With overwrite off, entries that already exist are left
//! alone. The remaining entries are extracted into the root with permissions,
//! timestamps, and (when running as root) numeric ownership preserved.
//!
//! # Example
//!
//! ```no_run
//! use levitate_pkgfetch::core::progress::NoProgress;
//! use levitate_pkgfetch::fetch::{Fetcher, PackageRequest, UreqTransport};
//! use levitate_pkgfetch::install::{InstallOptions, install};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let fetcher = Fetcher::new(
//!     Arc::new(UreqTransport::new()),
//!     vec!["https://mirror.pkgbuild.com/$repo/os/$arch".to_string()],
//!     "x86_64",
//! );
//! let file = "tar-1.34-1-x86_64.pkg.tar.zst";
//! let request = PackageRequest::new("core", file, Path::new("download").join(file));
//! let downloaded = fetcher.download_all(vec![request], 3).await.into_result()?;
//!
//! for request in downloaded {
//!     install(request.destination(), Path::new("install"), &InstallOptions::default(), &NoProgress)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod fetch;
pub mod install;

pub use crate::core::config::{PackageSpec, Settings};
pub use crate::core::output;
pub use fetch::{BatchReport, DownloadOutcome, FetchError, Fetcher, PackageRequest};
pub use install::{InstallError, InstallOptions, InstallOutcome, install};
