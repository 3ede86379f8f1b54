//! Fixture expansion files for unit tests.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use xapk_obb::{ExpansionDir, ExpansionKind};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub(crate) const PACKAGE: &str = "com.example.game";

fn write(
    root: &Path,
    kind: ExpansionKind,
    version: u32,
    files: &[(&str, &[u8])],
    method: CompressionMethod,
) -> PathBuf {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        let options = SimpleFileOptions::default().compression_method(method);
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }

    let path = ExpansionDir::new(root, PACKAGE).path(kind, version);
    std::fs::write(&path, writer.finish().unwrap().into_inner()).unwrap();
    path
}

/// Write `<kind>.<version>.com.example.game.obb` with stored entries.
/// Names ending in `/` become directory entries.
pub(crate) fn write_expansion(
    root: &Path,
    kind: ExpansionKind,
    version: u32,
    files: &[(&str, &[u8])],
) -> PathBuf {
    write(root, kind, version, files, CompressionMethod::Stored)
}

/// Same as [`write_expansion`] with DEFLATE entries.
pub(crate) fn write_expansion_deflated(
    root: &Path,
    kind: ExpansionKind,
    version: u32,
    files: &[(&str, &[u8])],
) -> PathBuf {
    write(root, kind, version, files, CompressionMethod::Deflated)
}
