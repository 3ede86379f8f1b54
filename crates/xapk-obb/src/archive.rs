//! Expansion container reader.
//!
//! The container is memory-mapped once at open time and the central directory
//! is parsed into a name index. Entry data is never copied by the archive
//! itself; [`ObbArchive::open_entry`] hands out streams that borrow the map.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use rustc_hash::FxHashMap;
use xapk_common::BinaryReader;

use crate::stream::EntryStream;
use crate::zip::central_dir::extra_field;
use crate::zip::{
    CentralDirectoryHeader, CompressionMethod, Eocd64Locator, Eocd64Record, EocdRecord,
    LocalFileHeader,
};
use crate::{Error, ObbEntry, Result};

/// A single opened expansion container.
///
/// Immutable after [`open`](Self::open), so it can be shared across threads
/// behind an `Arc` and read concurrently.
pub struct ObbArchive {
    /// Memory-mapped file data
    mmap: Mmap,
    /// Path the archive was opened from
    path: PathBuf,
    /// Archive file name
    name: String,
    /// Entries in central directory order
    entries: Vec<ObbEntry>,
    /// Raw entry name to index into `entries`
    index: FxHashMap<Box<[u8]>, usize>,
}

impl ObbArchive {
    /// Open and index a container.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: expansion files are read-only assets; the map is never
        // written through and outlives every slice handed out.
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let entries = Self::parse_entries(&mmap)?;

        // Later duplicates win, matching how ZIP tools treat repeated names.
        let mut index = FxHashMap::with_capacity_and_hasher(entries.len(), Default::default());
        for (i, entry) in entries.iter().enumerate() {
            index.insert(entry.raw_name().into(), i);
        }

        Ok(Self {
            mmap,
            path: path.to_path_buf(),
            name,
            entries,
            index,
        })
    }

    /// Get the archive file name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the path the archive was opened from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the container in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Get the number of entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over entries in central directory order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ObbEntry> + '_ {
        self.entries.iter()
    }

    /// Get entry by index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&ObbEntry> {
        self.entries.get(index)
    }

    /// Find an entry by its exact (case-sensitive) path.
    pub fn find(&self, name: &str) -> Option<&ObbEntry> {
        self.find_raw(name.as_bytes())
    }

    /// Find an entry by its name bytes as stored in the container.
    pub fn find_raw(&self, name: &[u8]) -> Option<&ObbEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Open a forward-only stream over an entry's uncompressed bytes.
    ///
    /// Encrypted entries and unknown compression methods fail here, not at
    /// [`open`](Self::open). Locating the data requires reading the local
    /// header, so a corrupt container can also fail before any byte is
    /// streamed.
    pub fn open_entry(&self, entry: &ObbEntry) -> Result<EntryStream<'_>> {
        if entry.is_encrypted() {
            return Err(Error::Encrypted(entry.name().to_string()));
        }

        let method = match entry.compression_method() {
            Some(method) => method,
            // Directories carry no data, whatever method they claim.
            None if entry.is_dir() => CompressionMethod::Store,
            None => {
                return Err(Error::UnsupportedCompression {
                    name: entry.name().to_string(),
                    method: entry.method_code(),
                })
            }
        };

        let data = self.entry_data(entry)?;
        match method {
            CompressionMethod::Store => Ok(EntryStream::stored(data)),
            CompressionMethod::Deflate => Ok(EntryStream::deflate(data)),
        }
    }

    /// Raw (still compressed) bytes of an entry.
    fn entry_data(&self, entry: &ObbEntry) -> Result<&[u8]> {
        let offset = usize::try_from(entry.local_header_offset())
            .map_err(|_| Error::OutOfBounds("local header offset"))?;

        let mut reader = BinaryReader::new_at(&self.mmap, offset)
            .map_err(|_| Error::OutOfBounds("local header offset"))?;

        let sig = reader.read_u32()?;
        if sig != LocalFileHeader::SIGNATURE {
            return Err(Error::InvalidSignature {
                expected: LocalFileHeader::SIGNATURE,
                actual: sig,
            });
        }

        let local_header: LocalFileHeader = reader.read_struct()?;
        reader
            .skip(local_header.variable_data_size())
            .map_err(|_| Error::OutOfBounds("local header"))?;

        let size = usize::try_from(entry.compressed_size())
            .map_err(|_| Error::OutOfBounds("entry data"))?;
        reader
            .read_bytes(size)
            .map_err(|_| Error::OutOfBounds("entry data"))
    }

    fn parse_entries(data: &[u8]) -> Result<Vec<ObbEntry>> {
        let eocd_offset = Self::find_eocd(data)?;
        let mut reader = BinaryReader::new_at(data, eocd_offset)?;

        reader.expect_magic(&EocdRecord::MAGIC)?;
        let eocd: EocdRecord = reader.read_struct()?;

        let (total_entries, central_dir_offset) = if eocd.is_zip64() {
            Self::read_zip64_eocd(data, eocd_offset)?
        } else {
            (
                eocd.central_dir_count_total as u64,
                eocd.central_dir_offset as u64,
            )
        };

        let central_dir_offset = usize::try_from(central_dir_offset)
            .map_err(|_| Error::OutOfBounds("central directory"))?;
        let mut reader = BinaryReader::new_at(data, central_dir_offset)
            .map_err(|_| Error::OutOfBounds("central directory"))?;

        // Each record is at least 46 bytes; don't trust the count for capacity.
        let capacity = (total_entries as usize).min(reader.remaining() / 46);
        let mut entries = Vec::with_capacity(capacity);

        for _ in 0..total_entries {
            entries.push(Self::read_cd_entry(&mut reader)?);
        }

        Ok(entries)
    }

    fn read_cd_entry(reader: &mut BinaryReader<'_>) -> Result<ObbEntry> {
        let sig = reader.read_u32()?;
        if sig != CentralDirectoryHeader::SIGNATURE {
            return Err(Error::InvalidSignature {
                expected: CentralDirectoryHeader::SIGNATURE,
                actual: sig,
            });
        }

        let header: CentralDirectoryHeader = reader.read_struct()?;

        let name = reader.read_bytes(header.file_name_length as usize)?;

        let mut compressed_size = header.compressed_size as u64;
        let mut uncompressed_size = header.uncompressed_size as u64;
        let mut local_header_offset = header.local_header_offset as u64;

        let extra_data = reader.read_bytes(header.extra_field_length as usize)?;
        if header.needs_zip64() {
            let mut extra_reader = BinaryReader::new(extra_data);

            while extra_reader.remaining() >= 4 {
                let id = extra_reader.read_u16()?;
                let size = extra_reader.read_u16()? as usize;
                let field = extra_reader.read_bytes(size)?;
                if id != extra_field::ZIP64 {
                    continue;
                }

                // Only the fields whose header value is saturated are present,
                // always in this order.
                let mut field_reader = BinaryReader::new(field);
                if header.uncompressed_size == u32::MAX {
                    uncompressed_size = field_reader.read_u64()?;
                }
                if header.compressed_size == u32::MAX {
                    compressed_size = field_reader.read_u64()?;
                }
                if header.local_header_offset == u32::MAX {
                    local_header_offset = field_reader.read_u64()?;
                }
                break;
            }
        }

        reader.skip(header.file_comment_length as usize)?;

        Ok(ObbEntry::new(
            name,
            compressed_size,
            uncompressed_size,
            header.compression_method,
            header.flags,
            local_header_offset,
            header.crc32,
        ))
    }

    /// Find the EOCD by scanning backwards over the region that may hold it.
    fn find_eocd(data: &[u8]) -> Result<usize> {
        let search_start = data.len().saturating_sub(EocdRecord::MAX_SEARCH);

        memchr::memmem::rfind(&data[search_start..], &EocdRecord::MAGIC)
            .map(|pos| search_start + pos)
            .ok_or(Error::EocdNotFound)
    }

    fn read_zip64_eocd(data: &[u8], eocd_offset: usize) -> Result<(u64, u64)> {
        let locator_size = std::mem::size_of::<Eocd64Locator>() + 4;
        let locator_offset = eocd_offset
            .checked_sub(locator_size)
            .ok_or(Error::Zip64EocdNotFound)?;

        let mut reader = BinaryReader::new_at(data, locator_offset)?;
        if reader.peek_u32()? != Eocd64Locator::SIGNATURE {
            return Err(Error::Zip64EocdNotFound);
        }
        reader.skip(4)?;
        let locator: Eocd64Locator = reader.read_struct()?;

        let eocd64_offset = usize::try_from(locator.zip64_eocd_offset)
            .map_err(|_| Error::Zip64EocdNotFound)?;
        let mut reader =
            BinaryReader::new_at(data, eocd64_offset).map_err(|_| Error::Zip64EocdNotFound)?;

        let sig = reader.read_u32()?;
        if sig != Eocd64Record::SIGNATURE {
            return Err(Error::InvalidSignature {
                expected: Eocd64Record::SIGNATURE,
                actual: sig,
            });
        }

        let eocd64: Eocd64Record = reader.read_struct()?;

        Ok((eocd64.central_dir_count_total, eocd64.central_dir_offset))
    }
}

impl std::fmt::Debug for ObbArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObbArchive")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish()
    }
}
