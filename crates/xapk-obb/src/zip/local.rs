//! Local file header.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Fixed part of a local file header, read after its signature.
///
/// Only the two length fields are used: they locate the entry data, and they
/// may differ from the central directory copy of the same entry.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_modified: u32,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    pub const SIGNATURE: u32 = 0x04034b50;

    /// Bytes between the end of this header and the entry data.
    pub fn variable_data_size(&self) -> usize {
        self.file_name_length as usize + self.extra_field_length as usize
    }
}
