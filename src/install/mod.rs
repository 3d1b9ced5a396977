//! INSTALL half - unpacking a downloaded package into a root directory
//!
//! - **decompress**: package file -> scratch tar stream
//! - **archive**: list and extract tar entries
//! - **plan**: which entries get written
//!
//! An install decompresses the whole package to an anonymous scratch file,
//! lists its entries, plans, then extracts the planned entries into the root.
//! The existence check used for planning looks at each entry's stored path
//! relative to the existence base (the working directory unless told
//! otherwise), not relative to the root.

pub mod archive;
pub mod decompress;
pub mod error;
pub mod plan;

pub use archive::{ArchiveEntry, ArchiveReader};
pub use decompress::{Compression, decompress_to_scratch};
pub use error::InstallError;
pub use plan::{ExtractionPlan, is_reserved, plan_extraction};

use crate::core::output;
use crate::core::progress::ProgressSink;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub overwrite: bool,
    /// Directory that stored entry paths are checked against
    pub existence_base: PathBuf,
}

impl InstallOptions {
    pub fn new(overwrite: bool) -> Self {
        Self {
            overwrite,
            existence_base: PathBuf::from("."),
        }
    }

    pub fn with_existence_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.existence_base = base.into();
        self
    }
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self::new(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Entries actually written
    pub entries: usize,
    /// Sum of the written entries' sizes
    pub bytes: u64,
    /// Entries left alone because they already existed
    pub skipped: Vec<String>,
}

/// Install one package file into `root`.
pub fn install(
    package: &Path,
    root: &Path,
    options: &InstallOptions,
    progress: &dyn ProgressSink,
) -> Result<InstallOutcome, InstallError> {
    if !package.is_file() {
        return Err(InstallError::InvalidInput(format!(
            "{} is not a file",
            package.display()
        )));
    }
    if !root.is_dir() {
        return Err(InstallError::InvalidInput(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let archive_err = |source| InstallError::Archive {
        path: package.to_path_buf(),
        source,
    };

    output::sub_action("decompressing");
    let scratch = decompress_to_scratch(package)?;
    let mut reader = ArchiveReader::new(scratch);

    output::sub_action("reading entries");
    let entries = reader.entries().map_err(archive_err)?;
    output::debug(&format!("{} entries in {}", entries.len(), package.display()));

    let base = &options.existence_base;
    let plan = plan_extraction(&entries, options.overwrite, |path| base.join(path).exists());

    let file_name = package
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| package.display().to_string());
    let tracker = progress.track(&format!("Installing {}", file_name));
    tracker.set_total(plan.total_size);

    let mut outcome = InstallOutcome {
        skipped: plan.skipped.clone(),
        ..Default::default()
    };

    output::sub_action("extracting");
    let extracted = reader.extract(&plan.entries, root, |entry, result| match result {
        Ok(true) => {
            tracker.advance(entry.size);
            outcome.entries += 1;
            outcome.bytes += entry.size;
        }
        Ok(false) => {
            output::warning(&format!("{} points outside the root, not extracted", entry.name));
        }
        Err(e) => {
            output::warning(&format!("failed to extract {}: {}", entry.name, e));
        }
    });
    tracker.finish();
    extracted.map_err(archive_err)?;

    Ok(outcome)
}
