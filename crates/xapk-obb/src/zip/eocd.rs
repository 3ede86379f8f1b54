//! End-of-central-directory records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Classic end-of-central-directory record, read after its signature.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct EocdRecord {
    pub disk_number: u16,
    pub central_dir_disk: u16,
    pub central_dir_count_disk: u16,
    pub central_dir_count_total: u16,
    pub central_dir_size: u32,
    pub central_dir_offset: u32,
    pub comment_length: u16,
}

impl EocdRecord {
    pub const MAGIC: [u8; 4] = *b"PK\x05\x06";

    /// Largest span from the end of the file that can hold the record: the
    /// record itself plus a maximal comment.
    pub const MAX_SEARCH: usize = 22 + u16::MAX as usize;

    /// Saturated counts or offsets mean the ZIP64 record holds the real values.
    pub fn is_zip64(&self) -> bool {
        self.central_dir_count_total == u16::MAX
            || self.central_dir_offset == u32::MAX
            || self.central_dir_size == u32::MAX
    }
}

/// ZIP64 locator, directly in front of the classic record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Eocd64Locator {
    pub zip64_eocd_disk: u32,
    pub zip64_eocd_offset: u64,
    pub total_disks: u32,
}

impl Eocd64Locator {
    pub const SIGNATURE: u32 = 0x07064b50;
}

/// ZIP64 end-of-central-directory record. Only the entry count and the
/// central directory offset are read.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Eocd64Record {
    pub record_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub central_dir_disk: u32,
    pub central_dir_count_disk: u64,
    pub central_dir_count_total: u64,
    pub central_dir_size: u64,
    pub central_dir_offset: u64,
}

impl Eocd64Record {
    pub const SIGNATURE: u32 = 0x06064b50;
}
