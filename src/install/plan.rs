//! Extraction planning
//!
//! Decides, per archive entry, whether it gets written. Entries whose name
//! starts with "." are package metadata (`.PKGINFO`, `.MTREE`, ...) and are
//! never extracted.

use super::archive::ArchiveEntry;
use crate::core::output;
use std::path::Path;

/// Entries chosen for extraction, in archive order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionPlan {
    pub entries: Vec<ArchiveEntry>,
    pub total_size: u64,
    /// Names left alone because they already exist and overwrite is off
    pub skipped: Vec<String>,
}

impl ExtractionPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

pub fn is_reserved(name: &str) -> bool {
    name.starts_with('.')
}

/// Build the plan. `exists` is asked about the entry's stored path.
pub fn plan_extraction(
    entries: &[ArchiveEntry],
    overwrite: bool,
    exists: impl Fn(&Path) -> bool,
) -> ExtractionPlan {
    let mut plan = ExtractionPlan::default();

    for entry in entries {
        if is_reserved(&entry.name) {
            continue;
        }
        if exists(&entry.path) && !overwrite {
            output::warning(&format!(
                "{} already exists in the filesystem (won't extract)",
                entry.name
            ));
            plan.skipped.push(entry.name.clone());
            continue;
        }
        output::debug(&format!("{} will be extracted", entry.name));
        plan.total_size += entry.size;
        plan.entries.push(entry.clone());
    }

    plan
}
