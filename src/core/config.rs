//! Run configuration
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! `pkgfetch/config.toml` files (every `XDG_CONFIG_DIRS` entry, then
//! `XDG_CONFIG_HOME`), and command-line overrides.
//!
//! ```toml
//! arch = "x86_64"
//! max_concurrent_downloads = 3
//! overwrite = true
//! root = "install"
//! download_dir = "download"
//! mirrors = ["https://mirror.pkgbuild.com/$repo/os/$arch"]
//!
//! [[packages]]
//! repository = "core"
//! file = "tar-1.34-1-x86_64.pkg.tar.zst"
//! ```

use crate::fetch::PackageRequest;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 3;
pub const DEFAULT_ROOT: &str = "install";
pub const DEFAULT_DOWNLOAD_DIR: &str = "download";
pub const DEFAULT_MIRROR: &str = "https://mirror.pkgbuild.com/$repo/os/$arch";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid package '{0}': expected <repository>/<file>")]
    PackageSpec(String),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct ConfigToml {
    pub arch: Option<String>,
    pub max_concurrent_downloads: Option<usize>,
    pub overwrite: Option<bool>,
    pub root: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub mirrors: Option<Vec<String>>,
    pub packages: Option<Vec<PackageSpec>>,
}

impl ConfigToml {
    fn merge(&mut self, other: ConfigToml) {
        if other.arch.is_some() {
            self.arch = other.arch;
        }
        if other.max_concurrent_downloads.is_some() {
            self.max_concurrent_downloads = other.max_concurrent_downloads;
        }
        if other.overwrite.is_some() {
            self.overwrite = other.overwrite;
        }
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.download_dir.is_some() {
            self.download_dir = other.download_dir;
        }
        if other.mirrors.is_some() {
            self.mirrors = other.mirrors;
        }
        if other.packages.is_some() {
            self.packages = other.packages;
        }
    }
}

/// A package named by repository and archive file name.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackageSpec {
    pub repository: String,
    pub file: String,
}

impl PackageSpec {
    fn validate(&self) -> Result<(), ConfigError> {
        let bad = |s: &str| {
            s.is_empty() || s == "." || s == ".." || s.contains('/') || s.contains('\\')
        };
        if bad(&self.repository) || bad(&self.file) {
            return Err(ConfigError::PackageSpec(format!(
                "{}/{}",
                self.repository, self.file
            )));
        }
        Ok(())
    }
}

impl FromStr for PackageSpec {
    type Err = ConfigError;

    /// Parse `core/tar-1.34-1-x86_64.pkg.tar.zst`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (repository, file) = s
            .split_once('/')
            .ok_or_else(|| ConfigError::PackageSpec(s.to_string()))?;
        let spec = PackageSpec {
            repository: repository.to_string(),
            file: file.to_string(),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub arch: Option<String>,
    pub max_concurrent_downloads: Option<usize>,
    pub overwrite: Option<bool>,
    pub root: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub mirrors: Vec<String>,
    pub packages: Vec<PackageSpec>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub arch: String,
    pub max_concurrent_downloads: usize,
    pub overwrite: bool,
    pub root: PathBuf,
    pub download_dir: PathBuf,
    pub mirrors: Vec<String>,
    pub packages: Vec<PackageSpec>,
}

impl Settings {
    /// Resolve defaults, file values, and overrides, then validate.
    pub fn resolve(file: ConfigToml, overrides: Overrides) -> Result<Self, ConfigError> {
        let mirrors = if !overrides.mirrors.is_empty() {
            overrides.mirrors
        } else {
            file.mirrors
                .unwrap_or_else(|| vec![DEFAULT_MIRROR.to_string()])
        };
        let packages = if !overrides.packages.is_empty() {
            overrides.packages
        } else {
            file.packages.unwrap_or_default()
        };

        let settings = Settings {
            arch: overrides
                .arch
                .or(file.arch)
                .unwrap_or_else(|| std::env::consts::ARCH.to_string()),
            max_concurrent_downloads: overrides
                .max_concurrent_downloads
                .or(file.max_concurrent_downloads)
                .unwrap_or(DEFAULT_MAX_CONCURRENT_DOWNLOADS),
            overwrite: overrides.overwrite.or(file.overwrite).unwrap_or(true),
            root: overrides
                .root
                .or(file.root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT)),
            download_dir: overrides
                .download_dir
                .or(file.download_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
            mirrors,
            packages,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.packages.is_empty() {
            return Err(ConfigError::Invalid(
                "no packages given (pass <repository>/<file> or add [[packages]] to config.toml)"
                    .to_string(),
            ));
        }
        if self.mirrors.is_empty() {
            return Err(ConfigError::Invalid("no mirrors configured".to_string()));
        }
        if self.max_concurrent_downloads == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_downloads must be at least 1".to_string(),
            ));
        }
        if self.arch.trim().is_empty() {
            return Err(ConfigError::Invalid("arch must not be empty".to_string()));
        }
        // Every package lands at download_dir/<file>, so file names must be unique
        let mut seen = HashSet::new();
        for package in &self.packages {
            package.validate()?;
            if !seen.insert(package.file.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "package file '{}' is requested more than once",
                    package.file
                )));
            }
        }
        Ok(())
    }

    /// One download request per package, each landing in the download dir.
    pub fn requests(&self) -> Vec<PackageRequest> {
        self.packages
            .iter()
            .map(|p| {
                PackageRequest::new(
                    p.repository.clone(),
                    p.file.clone(),
                    self.download_dir.join(&p.file),
                )
            })
            .collect()
    }
}

fn split_xdg_config_dirs() -> Vec<PathBuf> {
    let raw = std::env::var("XDG_CONFIG_DIRS").unwrap_or_else(|_| "/etc/xdg".to_owned());
    raw.split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn xdg_config_home() -> PathBuf {
    if let Ok(raw) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".").join(".config"))
}

/// Candidate config files, lowest precedence first.
pub fn find_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    for dir in split_xdg_config_dirs() {
        paths.push(dir.join("pkgfetch").join("config.toml"));
    }
    paths.push(xdg_config_home().join("pkgfetch").join("config.toml"));

    paths
}

pub fn read_toml(path: &Path) -> Result<ConfigToml, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<ConfigToml>(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the config layer.
///
/// An explicit path must exist and replaces the search. Otherwise every
/// existing candidate is merged; finding none is fine.
pub fn load_config(explicit: Option<&Path>) -> Result<ConfigToml, ConfigError> {
    if let Some(path) = explicit {
        return read_toml(path);
    }

    let mut merged = ConfigToml::default();
    for path in find_config_files() {
        if !path.exists() {
            continue;
        }
        merged.merge(read_toml(&path)?);
    }
    Ok(merged)
}
