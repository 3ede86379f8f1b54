//! Forward-only readers over entry data.

use std::io::{self, Read};

use flate2::read::DeflateDecoder;

/// Forward-only byte stream over one entry.
///
/// Borrows the container's memory map, so it is cheap to create and can be
/// created from many threads at once.
pub enum EntryStream<'a> {
    /// Stored entry, read straight from the map.
    Stored(&'a [u8]),
    /// DEFLATE entry, inflated on the fly.
    Deflate(DeflateDecoder<&'a [u8]>),
}

impl<'a> EntryStream<'a> {
    pub(crate) fn stored(data: &'a [u8]) -> Self {
        Self::Stored(data)
    }

    pub(crate) fn deflate(data: &'a [u8]) -> Self {
        Self::Deflate(DeflateDecoder::new(data))
    }
}

impl Read for EntryStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Stored(data) => data.read(buf),
            Self::Deflate(decoder) => decoder.read(buf),
        }
    }
}

impl std::fmt::Debug for EntryStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stored(data) => f.debug_tuple("Stored").field(&data.len()).finish(),
            Self::Deflate(_) => f.write_str("Deflate"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_stream_drains() {
        let mut stream = EntryStream::stored(b"plain bytes");
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"plain bytes");
    }

    #[test]
    fn test_deflate_stream_inflates() {
        use flate2::write::DeflateEncoder;
        use flate2::Compression;
        use std::io::Write;

        let original = b"Hello, World! Hello, World! Hello, World!";
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut stream = EntryStream::deflate(&compressed);
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn test_corrupt_deflate_is_io_error() {
        let garbage = [0xFFu8; 16];
        let mut stream = EntryStream::deflate(&garbage);
        let mut out = Vec::new();
        assert!(stream.read_to_end(&mut out).is_err());
    }
}
