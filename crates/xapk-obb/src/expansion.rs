//! Main/patch expansion file sets.
//!
//! An application ships up to two expansion files, named
//! `<main|patch>.<versionCode>.<packageId>.obb`. [`ExpansionSet`] opens
//! whichever of them exist and merges their entries into one namespace in
//! which patch entries shadow main entries of the same path.

use std::fmt;
use std::path::PathBuf;

use rustc_hash::FxHashMap;

use crate::{Error, ObbArchive, ObbEntry, Result};

/// Which of the two expansion files a container is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpansionKind {
    Main,
    Patch,
}

impl ExpansionKind {
    /// File name prefix used by the platform.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Patch => "patch",
        }
    }

    /// Conventional file name, e.g. `main.3.com.example.game.obb`.
    pub fn file_name(self, version_code: u32, package_id: &str) -> String {
        format!("{}.{}.{}.obb", self.prefix(), version_code, package_id)
    }
}

impl fmt::Display for ExpansionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.prefix())
    }
}

/// Where expansion files for one package live.
#[derive(Debug, Clone)]
pub struct ExpansionDir {
    root: PathBuf,
    package_id: String,
}

impl ExpansionDir {
    pub fn new(root: impl Into<PathBuf>, package_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            package_id: package_id.into(),
        }
    }

    /// Conventional file name of one expansion file.
    pub fn file_name(&self, kind: ExpansionKind, version_code: u32) -> String {
        kind.file_name(version_code, &self.package_id)
    }

    /// Full path of one expansion file.
    pub fn path(&self, kind: ExpansionKind, version_code: u32) -> PathBuf {
        self.root.join(self.file_name(kind, version_code))
    }

    /// Paths of the files present for a version pair. A version of zero
    /// means that file is not expected.
    pub fn existing_files(&self, main_version: u32, patch_version: u32) -> Vec<(ExpansionKind, PathBuf)> {
        [
            (ExpansionKind::Main, main_version),
            (ExpansionKind::Patch, patch_version),
        ]
        .into_iter()
        .filter(|&(_, version)| version > 0)
        .map(|(kind, version)| (kind, self.path(kind, version)))
        .filter(|(_, path)| path.is_file())
        .collect()
    }
}

/// The opened expansion files for one version pair.
pub struct ExpansionSet {
    archives: Vec<(ExpansionKind, ObbArchive)>,
    /// Raw path to (archive slot, entry index), patch entries written last.
    index: FxHashMap<Box<[u8]>, (usize, usize)>,
}

impl ExpansionSet {
    /// Open every expansion file that exists for the given versions.
    ///
    /// Fails with [`Error::ExpansionNotFound`] when neither file exists.
    pub fn open(dir: &ExpansionDir, main_version: u32, patch_version: u32) -> Result<Self> {
        let files = dir.existing_files(main_version, patch_version);
        if files.is_empty() {
            return Err(Error::ExpansionNotFound {
                main_version,
                patch_version,
            });
        }

        let archives = files
            .into_iter()
            .map(|(kind, path)| ObbArchive::open(path).map(|archive| (kind, archive)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_archives(archives))
    }

    /// Build a set from already opened containers. Order does not matter;
    /// patch containers always shadow main ones.
    pub fn from_archives(mut archives: Vec<(ExpansionKind, ObbArchive)>) -> Self {
        archives.sort_by_key(|(kind, _)| *kind == ExpansionKind::Patch);

        let capacity = archives.iter().map(|(_, a)| a.entry_count()).sum();
        let mut index = FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        for (slot, (_, archive)) in archives.iter().enumerate() {
            for (i, entry) in archive.iter().enumerate() {
                index.insert(entry.raw_name().into(), (slot, i));
            }
        }

        Self { archives, index }
    }

    /// Look up a path in the merged namespace.
    pub fn find(&self, path: &str) -> Option<(&ObbArchive, &ObbEntry)> {
        self.find_raw(path.as_bytes())
    }

    /// Look up a path by its name bytes as stored in the containers.
    pub fn find_raw(&self, path: &[u8]) -> Option<(&ObbArchive, &ObbEntry)> {
        let &(slot, i) = self.index.get(path)?;
        let archive = &self.archives[slot].1;
        archive.get(i).map(|entry| (archive, entry))
    }

    /// Containers in shadowing order (main first).
    pub fn archives(&self) -> impl Iterator<Item = (ExpansionKind, &ObbArchive)> + '_ {
        self.archives.iter().map(|(kind, archive)| (*kind, archive))
    }

    /// The container of a given kind, if it was opened.
    pub fn archive(&self, kind: ExpansionKind) -> Option<&ObbArchive> {
        self.archives
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, archive)| archive)
    }

    /// Number of distinct paths in the merged namespace.
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    /// Iterate the merged namespace, sorted by path.
    pub fn entries(&self) -> Vec<(&ObbArchive, &ObbEntry)> {
        let mut names: Vec<&[u8]> = self.index.keys().map(|name| &name[..]).collect();
        names.sort_unstable();
        names.into_iter().filter_map(|name| self.find_raw(name)).collect()
    }
}

impl fmt::Debug for ExpansionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpansionSet")
            .field("archives", &self.archives)
            .field("entries", &self.index.len())
            .finish()
    }
}
