//! pkgfetch CLI - download packages from mirrors and install them
//!
//! Usage:
//!   pkgfetch core/tar-1.34-1-x86_64.pkg.tar.zst extra/zstd-1.5.0-1-x86_64.pkg.tar.zst
//!   pkgfetch --mirror 'https://example.org/$repo/os/$arch' -j 5 --root /mnt core/tar-1.34-1-x86_64.pkg.tar.zst
//!
//! Packages can also be listed in `pkgfetch/config.toml`.

use anyhow::{Context, Result, bail};
use clap::Parser;
use levitate_pkgfetch::core::config::{self, Overrides, PackageSpec, Settings};
use levitate_pkgfetch::core::lock::acquire_root_lock;
use levitate_pkgfetch::core::output;
use levitate_pkgfetch::core::progress::BarProgress;
use levitate_pkgfetch::fetch::{Fetcher, UreqTransport};
use levitate_pkgfetch::install::{InstallOptions, install};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pkgfetch")]
#[command(about = "Download packages from mirrors concurrently and install them into a root")]
#[command(version)]
struct Cli {
    /// Packages as <repository>/<file>, e.g. core/tar-1.34-1-x86_64.pkg.tar.zst
    packages: Vec<PackageSpec>,

    /// Mirror URL template with $repo and $arch (repeatable, tried in order)
    #[arg(short, long = "mirror")]
    mirrors: Vec<String>,

    /// Target architecture substituted for $arch
    #[arg(long)]
    arch: Option<String>,

    /// Maximum number of downloads in flight
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Directory packages are installed into
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Directory downloaded package files are written to
    #[arg(short, long)]
    download_dir: Option<PathBuf>,

    /// Leave files that already exist untouched
    #[arg(long)]
    no_overwrite: bool,

    /// Config file to use instead of the XDG search
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print debug output
    #[arg(short, long, env = "PKGFETCH_VERBOSE")]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            arch: self.arch.clone(),
            max_concurrent_downloads: self.jobs,
            overwrite: self.no_overwrite.then_some(false),
            root: self.root.clone(),
            download_dir: self.download_dir.clone(),
            mirrors: self.mirrors.clone(),
            packages: self.packages.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    output::set_verbose(cli.verbose);

    let file = config::load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let settings = Settings::resolve(file, cli.overrides())?;
    output::debug(&format!("{:?}", settings));

    let requests = settings.requests();
    output::action(&format!("Downloading {} package(s)...", requests.len()));

    let fetcher = Fetcher::new(
        Arc::new(UreqTransport::new()),
        settings.mirrors.clone(),
        settings.arch.clone(),
    )
    .with_progress(Arc::new(BarProgress));

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to initialize tokio runtime")?;
    let report = rt.block_on(fetcher.download_all(requests, settings.max_concurrent_downloads));

    let total_bytes = report.total_bytes();
    let downloaded = match report.into_result() {
        Ok(downloaded) => downloaded,
        Err(e) => bail!("{}; nothing was installed", e),
    };
    output::success(&format!(
        "Downloaded {} package(s), {} bytes",
        downloaded.len(),
        total_bytes
    ));

    std::fs::create_dir_all(&settings.root).with_context(|| {
        format!("Failed to create install root: {}", settings.root.display())
    })?;
    let _lock = acquire_root_lock(&settings.root)?;

    let options = InstallOptions::new(settings.overwrite);
    let total = downloaded.len();
    let names: Vec<_> = downloaded.iter().map(|r| r.file()).collect();
    output::info(&format!("Installing {} package(s): {}", total, names.join(", ")));
    let mut failed = Vec::new();

    for (i, request) in downloaded.iter().enumerate() {
        output::action_numbered(i + 1, total, &format!("Installing {}", request.file()));
        match install(request.destination(), &settings.root, &options, &BarProgress) {
            Ok(outcome) => {
                output::detail(&format!(
                    "{} entries, {} bytes extracted",
                    outcome.entries, outcome.bytes
                ));
                if !outcome.skipped.is_empty() {
                    output::skip(&format!(
                        "{} existing entries left untouched",
                        outcome.skipped.len()
                    ));
                }
            }
            Err(e) => {
                output::error(&format!("{}: {}", request.file(), e));
                failed.push(request.file().to_string());
            }
        }
    }

    if !failed.is_empty() {
        bail!(
            "{} package(s) failed to install: {}",
            failed.len(),
            failed.join(", ")
        );
    }

    output::success(&format!(
        "Installed {} package(s) into {}",
        total,
        settings.root.display()
    ));
    Ok(())
}
