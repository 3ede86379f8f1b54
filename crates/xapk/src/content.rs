//! Content reader: drains an entry stream into memory.

use std::io::{self, Read};

use crate::index::EntryLocator;
use crate::Result;

/// Bytes requested from the stream per read call.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Cap on the capacity reserved from the size the container reports.
const MAX_SIZE_HINT: u64 = 64 * 1024 * 1024;

/// Fully buffered content of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    name: String,
    bytes: Vec<u8>,
}

impl Payload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Path of the entry the bytes came from.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Read an entry to the end of its stream.
///
/// The reported size only sizes the initial allocation; the stream's end
/// decides the length. On any fault the partial buffer is dropped.
pub fn read(locator: &EntryLocator<'_>) -> Result<Payload> {
    let stream = locator
        .archive()
        .open_entry(locator.entry())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let hint = locator.entry().uncompressed_size().min(MAX_SIZE_HINT) as usize;
    let bytes = drain(stream, hint)?;

    Ok(Payload::new(locator.path(), bytes))
}

/// Drain `reader` in [`CHUNK_SIZE`] reads until it reports end of stream.
pub fn drain<R: Read>(mut reader: R, size_hint: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(size_hint);
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(out),
            Ok(n) => out.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{get_entry, ArchiveIndex};
    use crate::test_support::{write_expansion, write_expansion_deflated};
    use crate::{Error, ExpansionVersion};
    use xapk_obb::{ExpansionDir, ExpansionKind};

    /// Yields data in uneven pieces, with an interruption and an optional fault.
    struct Choppy {
        data: Vec<u8>,
        pos: usize,
        calls: usize,
        fail_at: Option<usize>,
    }

    impl Read for Choppy {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls == 2 {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if self.fail_at.is_some_and(|at| self.pos >= at) {
                return Err(io::Error::new(io::ErrorKind::Other, "device fault"));
            }
            let n = buf.len().min(7).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_drain_ignores_size_hint() {
        let data: Vec<u8> = (0..100).collect();
        let reader = Choppy { data: data.clone(), pos: 0, calls: 0, fail_at: None };
        // Hint both below and above the real length.
        assert_eq!(drain(reader, 3).unwrap(), data);
        let reader = Choppy { data: data.clone(), pos: 0, calls: 0, fail_at: None };
        assert_eq!(drain(reader, 4096).unwrap(), data);
    }

    #[test]
    fn test_drain_propagates_fault() {
        let reader = Choppy { data: vec![1; 100], pos: 0, calls: 0, fail_at: Some(20) };
        let err = drain(reader, 0).unwrap_err();
        assert_eq!(err.to_string(), "device fault");
    }

    #[test]
    fn test_read_stored_and_deflated() {
        let tmp = tempfile::tempdir().unwrap();
        let big: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        write_expansion(tmp.path(), ExpansionKind::Main, 3, &[("stored.bin", &big[..])]);
        write_expansion_deflated(tmp.path(), ExpansionKind::Patch, 3, &[("deflated.bin", &big[..])]);

        let index = ArchiveIndex::new(ExpansionDir::new(tmp.path(), "com.example.game"));
        let handle = index.open(ExpansionVersion::single(3)).unwrap();

        for name in ["stored.bin", "deflated.bin"] {
            let payload = read(&get_entry(&handle, name).unwrap()).unwrap();
            assert_eq!(payload.name(), name);
            assert_eq!(payload.bytes(), &big[..]);
        }
    }

    #[test]
    fn test_read_empty_entry() {
        let tmp = tempfile::tempdir().unwrap();
        write_expansion(tmp.path(), ExpansionKind::Main, 3, &[("empty.txt", b"")]);

        let index = ArchiveIndex::new(ExpansionDir::new(tmp.path(), "com.example.game"));
        let handle = index.open(ExpansionVersion::single(3)).unwrap();

        let payload = read(&get_entry(&handle, "empty.txt").unwrap()).unwrap();
        assert!(payload.into_bytes().is_empty());
    }

    #[test]
    fn test_corrupt_entry_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ExpansionDir::new(tmp.path(), "com.example.game");
        write_expansion_deflated(tmp.path(), ExpansionKind::Main, 3, &[("x.txt", &[b'x'; 4096])]);

        // Overwrite the first byte of the compressed data with an invalid
        // DEFLATE block type.
        let path = dir.path(ExpansionKind::Main, 3);
        let mut bytes = std::fs::read(&path).unwrap();
        let name_len = u16::from_le_bytes([bytes[26], bytes[27]]) as usize;
        let extra_len = u16::from_le_bytes([bytes[28], bytes[29]]) as usize;
        bytes[30 + name_len + extra_len] = 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let index = ArchiveIndex::new(dir);
        let handle = index.open(ExpansionVersion::single(3)).unwrap();
        let err = read(&get_entry(&handle, "x.txt").unwrap()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_unknown_method_fails_only_that_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ExpansionDir::new(tmp.path(), "com.example.game");
        let path = write_expansion(
            tmp.path(),
            ExpansionKind::Main,
            3,
            &[("odd.bin", b"odd"), ("good.txt", b"good")],
        );

        // Method field of the first central directory record.
        let mut bytes = std::fs::read(&path).unwrap();
        let cd = bytes.windows(4).position(|w| w == b"PK\x01\x02").unwrap();
        bytes[cd + 10..cd + 12].copy_from_slice(&12u16.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        let index = ArchiveIndex::new(dir);
        let handle = index.open(ExpansionVersion::single(3)).unwrap();

        let payload = read(&get_entry(&handle, "good.txt").unwrap()).unwrap();
        assert_eq!(payload.bytes(), b"good");

        match read(&get_entry(&handle, "odd.bin").unwrap()) {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }
}
