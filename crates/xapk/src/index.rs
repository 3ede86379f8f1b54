//! Archive index: opened expansion sets, cached per version pair.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use xapk_obb::{ExpansionDir, ExpansionKind, ExpansionSet, ObbArchive, ObbEntry};

use crate::{ExpansionVersion, Result};

/// Shared handle to the opened containers of one version pair.
pub type ArchiveHandle = Arc<ExpansionSet>;

/// Opens expansion sets on demand and keeps them for reuse.
///
/// Each version pair is opened at most once. The first caller opens while
/// holding the cache lock; callers racing it block and then receive the same
/// handle.
#[derive(Debug)]
pub struct ArchiveIndex {
    dir: ExpansionDir,
    handles: Mutex<FxHashMap<ExpansionVersion, ArchiveHandle>>,
    opened: AtomicUsize,
}

impl ArchiveIndex {
    pub fn new(dir: ExpansionDir) -> Self {
        Self {
            dir,
            handles: Mutex::new(FxHashMap::default()),
            opened: AtomicUsize::new(0),
        }
    }

    /// Open (or reuse) the containers for `version`.
    ///
    /// Fails with [`Error::ArchiveNotFound`](crate::Error::ArchiveNotFound)
    /// when no expansion file exists. Failures are not cached.
    pub fn open(&self, version: ExpansionVersion) -> Result<ArchiveHandle> {
        let mut handles = self.handles.lock();
        if let Some(handle) = handles.get(&version) {
            return Ok(Arc::clone(handle));
        }

        let set = ExpansionSet::open(&self.dir, version.main, version.patch)?;
        self.opened.fetch_add(1, Ordering::Relaxed);

        let handle = Arc::new(set);
        handles.insert(version, Arc::clone(&handle));
        Ok(handle)
    }

    /// Drop the cached handle for `version`. Outstanding clones stay valid.
    pub fn close(&self, version: ExpansionVersion) -> bool {
        self.handles.lock().remove(&version).is_some()
    }

    /// Number of times a container set was actually opened.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// File name whose stem namespaces entries, e.g. `main.3.com.example.game.obb`.
    pub fn container_name(&self, kind: ExpansionKind, version: ExpansionVersion) -> String {
        self.dir.file_name(kind, version.of(kind))
    }
}

/// A path that is known to exist in an opened expansion set.
#[derive(Debug, Clone, Copy)]
pub struct EntryLocator<'a> {
    archive: &'a ObbArchive,
    entry: &'a ObbEntry,
}

impl<'a> EntryLocator<'a> {
    /// Internal path of the entry.
    #[inline]
    pub fn path(&self) -> &'a str {
        self.entry.name()
    }

    /// Container holding the entry (main or patch).
    #[inline]
    pub fn archive(&self) -> &'a ObbArchive {
        self.archive
    }

    #[inline]
    pub fn entry(&self) -> &'a ObbEntry {
        self.entry
    }
}

/// Existence check for `path`. Reads no entry data.
///
/// Directory entries never resolve.
pub fn get_entry<'a>(handle: &'a ExpansionSet, path: &str) -> Option<EntryLocator<'a>> {
    handle
        .find(path)
        .filter(|(_, entry)| !entry.is_dir())
        .map(|(archive, entry)| EntryLocator { archive, entry })
}
