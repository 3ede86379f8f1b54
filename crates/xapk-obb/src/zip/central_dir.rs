//! Central directory records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Fixed part of a central directory record, read after its signature.
///
/// The name, extra field and comment follow, with the lengths given here.
/// Sizes and the local header offset saturate at `u32::MAX` when the real
/// value lives in the ZIP64 extra field.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    /// General purpose flags; bit 0 marks encryption.
    pub flags: u16,
    pub compression_method: u16,
    pub last_modified: u32,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    pub disk_number_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub local_header_offset: u32,
}

impl CentralDirectoryHeader {
    pub const SIGNATURE: u32 = 0x02014b50;

    /// Whether any field defers to the ZIP64 extra field.
    pub fn needs_zip64(&self) -> bool {
        self.compressed_size == u32::MAX
            || self.uncompressed_size == u32::MAX
            || self.local_header_offset == u32::MAX
            || self.disk_number_start == u16::MAX
    }
}

/// Extra field header IDs.
pub mod extra_field {
    pub const ZIP64: u16 = 0x0001;
}
