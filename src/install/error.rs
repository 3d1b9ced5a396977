//! Install error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort one install call.
///
/// An existing file that is left alone because overwrite is off is not an
/// error; it is reported in `InstallOutcome::skipped`.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot create scratch file: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("cannot decompress {}: {source}", .path.display())]
    Decompress {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        source: std::io::Error,
    },
}
