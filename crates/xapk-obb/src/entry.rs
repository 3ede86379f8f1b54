//! Expansion container entry metadata.

use crate::zip::{CompressionMethod, FLAG_ENCRYPTED};

/// An entry (file or directory) within an expansion container.
///
/// This is metadata only. Use [`ObbArchive::open_entry`](crate::ObbArchive::open_entry)
/// to stream the contents.
#[derive(Debug, Clone)]
pub struct ObbEntry {
    name: String,
    raw_name: Box<[u8]>,
    compressed_size: u64,
    uncompressed_size: u64,
    method: u16,
    flags: u16,
    local_header_offset: u64,
    crc32: u32,
}

impl ObbEntry {
    pub(crate) fn new(
        raw_name: &[u8],
        compressed_size: u64,
        uncompressed_size: u64,
        method: u16,
        flags: u16,
        local_header_offset: u64,
        crc32: u32,
    ) -> Self {
        Self {
            name: String::from_utf8_lossy(raw_name).into_owned(),
            raw_name: raw_name.into(),
            compressed_size,
            uncompressed_size,
            method,
            flags,
            local_header_offset,
            crc32,
        }
    }

    /// Slash-separated path within the container.
    ///
    /// Names that are not valid UTF-8 are shown with replacement characters
    /// and can only be looked up through [`raw_name`](Self::raw_name).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name bytes exactly as stored in the central directory.
    #[inline]
    pub fn raw_name(&self) -> &[u8] {
        &self.raw_name
    }

    /// Whether the stored name is valid UTF-8.
    #[inline]
    pub fn has_utf8_name(&self) -> bool {
        *self.raw_name == *self.name.as_bytes()
    }

    /// Stored size in bytes.
    #[inline]
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Size reported by the central directory. Only a hint for readers.
    #[inline]
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Compression method, or `None` if this reader cannot decode it.
    #[inline]
    pub fn compression_method(&self) -> Option<CompressionMethod> {
        CompressionMethod::try_from(self.method).ok()
    }

    /// Method code as stored in the central directory.
    #[inline]
    pub fn method_code(&self) -> u16 {
        self.method
    }

    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    #[inline]
    pub(crate) fn local_header_offset(&self) -> u64 {
        self.local_header_offset
    }

    #[inline]
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Check if this entry represents a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}
