//! Host configuration.
//!
//! The host reads these values once at startup (on Android they are app
//! resources) and hands them to [`XapkReader`](crate::XapkReader) as one
//! explicit value.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use xapk_obb::ExpansionKind;

use crate::{Error, RepresentationMode, Result};

/// Version codes of the main and patch expansion files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpansionVersion {
    pub main: u32,
    pub patch: u32,
}

impl ExpansionVersion {
    pub const fn new(main: u32, patch: u32) -> Self {
        Self { main, patch }
    }

    /// Both files share one version code.
    pub const fn single(version_code: u32) -> Self {
        Self::new(version_code, version_code)
    }

    /// Version code of one of the two files.
    pub fn of(self, kind: ExpansionKind) -> u32 {
        match kind {
            ExpansionKind::Main => self.main,
            ExpansionKind::Patch => self.patch,
        }
    }
}

/// Reader configuration supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Whether lookups are namespaced under the main (rather than patch)
    /// file's name.
    pub main_file: bool,
    /// Version code of the main expansion file.
    pub version_code: u32,
    /// Version code of the patch file. Defaults to `version_code`.
    pub patch_version_code: Option<u32>,
    /// Expected archive size, used by download management only.
    pub file_size: u64,
    /// Whether the user may start a download, used by download management only.
    pub download_option: bool,
    /// Application package id, part of every expansion file name.
    pub package_id: String,
    /// Directory holding the expansion files.
    pub expansion_dir: PathBuf,
    /// Worker threads serving requests.
    pub workers: usize,
    /// Representation produced by [`XapkReader::get`](crate::XapkReader::get).
    pub result_mode: RepresentationMode,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            main_file: true,
            version_code: 1,
            patch_version_code: None,
            file_size: 0,
            download_option: true,
            package_id: String::new(),
            expansion_dir: PathBuf::new(),
            workers: default_workers(),
            result_mode: RepresentationMode::RawBuffer,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(4))
        .unwrap_or(2)
}

impl ReaderConfig {
    /// Configuration for one package with every other value defaulted.
    pub fn new(expansion_dir: impl Into<PathBuf>, package_id: impl Into<String>, version_code: u32) -> Self {
        Self {
            expansion_dir: expansion_dir.into(),
            package_id: package_id.into(),
            version_code,
            ..Self::default()
        }
    }

    /// Load a JSON configuration file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Version pair to open.
    pub fn version(&self) -> ExpansionVersion {
        ExpansionVersion::new(
            self.version_code,
            self.patch_version_code.unwrap_or(self.version_code),
        )
    }

    /// Which file names the lookup subdirectory.
    pub fn kind(&self) -> ExpansionKind {
        if self.main_file {
            ExpansionKind::Main
        } else {
            ExpansionKind::Patch
        }
    }

    /// Reject configurations that can never open an archive.
    pub fn validate(&self) -> Result<()> {
        if self.package_id.is_empty() {
            return Err(Error::Config("package_id must not be empty".to_string()));
        }
        if self.package_id.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "package_id contains a path separator: {}",
                self.package_id
            )));
        }
        let version = self.version();
        if version.main == 0 && version.patch == 0 {
            return Err(Error::Config(
                "at least one of version_code and patch_version_code must be non-zero".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        Ok(())
    }
}
