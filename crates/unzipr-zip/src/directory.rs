//! Central directory parsing.
//!
//! ZIP archives are indexed from the end: an End of Central Directory
//! (EOCD) record sits at the tail of the buffer, followed only by an
//! optional comment, and points at the central directory - one fixed
//! 46-byte header plus variable name/extra/comment data per entry.
//!
//! The central directory is authoritative. Sizes and offsets are taken
//! from it (with ZIP64 extra-field overrides), never from local file
//! headers or trailing data descriptors, so archives written in streaming
//! mode parse the same as ordinary ones.
//!
//! Parsing is all-or-nothing: any truncated or malformed entry fails the
//! whole parse. A silently shortened entry list would make extraction
//! silently omit files.

use unzipr_common::BinaryReader;

use crate::format::central::extra_field;
use crate::format::{CentralDirectoryHeader, EocdRecord};
use crate::{Error, Result};

/// A single entry parsed from the central directory.
///
/// Size and offset fields are u64: the 32-bit on-disk fields may carry the
/// 0xFFFFFFFF sentinel, in which case the real value comes from the ZIP64
/// extra field.
#[derive(Debug, Clone)]
pub struct CentralDirectoryEntry {
    /// Declared path within the archive (forward-slash separated,
    /// attacker-controlled; empty if the name bytes were undecodable).
    pub name: String,
    /// Raw compression method (0 = stored, 8 = deflate).
    pub compression_method: u16,
    /// Compressed payload size in bytes.
    pub compressed_size: u64,
    /// Uncompressed size in bytes.
    pub uncompressed_size: u64,
    /// Offset of the entry's local file header from the buffer start.
    pub local_header_offset: u64,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// General purpose bit flags.
    pub flags: u16,
}

impl CentralDirectoryEntry {
    /// Whether this entry is a directory placeholder (name ends in `/`).
    #[inline]
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Whether the payload is encrypted (general purpose flag bit 0).
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.flags & crate::format::central::flags::ENCRYPTED != 0
    }
}

/// The parsed central directory: the ordered entry list plus the
/// EOCD-derived metadata.
///
/// Constructed once per call, read-only thereafter. Nothing is cached
/// between calls.
#[derive(Debug, Clone)]
pub struct CentralDirectory {
    /// Total entry count declared by the EOCD.
    pub entry_count: u64,
    /// Byte offset of the central directory within the archive.
    pub offset: u64,
    /// Byte size of the central directory.
    pub size: u64,
    /// Trailing archive comment, if any.
    pub comment: Vec<u8>,
    /// Entries in central directory order.
    pub entries: Vec<CentralDirectoryEntry>,
}

impl CentralDirectory {
    /// Parse the central directory from a complete in-memory archive.
    ///
    /// # Errors
    ///
    /// Any structural problem (no EOCD, out-of-range directory metadata,
    /// truncated or malformed entries, entry count mismatch) fails the
    /// whole parse.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let eocd_offset = find_eocd(data)?;

        let mut reader = BinaryReader::new_at(data, eocd_offset + 4);
        let eocd: EocdRecord = reader.read_struct()?;

        let total_entries = eocd.central_dir_count_total as u64;
        let cd_offset = eocd.central_dir_offset as u64;
        let cd_size = eocd.central_dir_size as u64;
        let comment_length = eocd.comment_length as usize;

        if cd_offset + cd_size > data.len() as u64 {
            return Err(Error::DirectoryOutOfBounds(
                "directory extends past end of buffer",
            ));
        }
        if eocd_offset + EocdRecord::SIZE + comment_length > data.len() {
            return Err(Error::DirectoryOutOfBounds(
                "comment extends past end of buffer",
            ));
        }

        let comment_start = eocd_offset + EocdRecord::SIZE;
        let comment = data[comment_start..comment_start + comment_length].to_vec();

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut reader = BinaryReader::new_at(data, cd_offset as usize);

        for index in 0..total_entries {
            match parse_entry(&mut reader, index as usize) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    log::debug!("central directory entry {index} failed to parse: {err}");
                    break;
                }
            }
        }

        // A short list means a corrupt or truncated central directory.
        if entries.len() as u64 != total_entries {
            return Err(Error::EntryCountMismatch {
                expected: total_entries,
                parsed: entries.len() as u64,
            });
        }

        Ok(Self {
            entry_count: total_entries,
            offset: cd_offset,
            size: cd_size,
            comment,
            entries,
        })
    }
}

/// Locate the EOCD record by scanning backward from the end of the buffer.
///
/// The signature value can legitimately appear inside a comment or a
/// compressed payload, so a candidate is accepted only when its implied
/// record end (`offset + 22 + comment_length`) lands exactly on the end of
/// the buffer. The scan runs from `len - 22` all the way down to 0.
fn find_eocd(data: &[u8]) -> Result<usize> {
    if data.len() < EocdRecord::SIZE {
        return Err(Error::EocdNotFound);
    }

    let limit = data.len() - EocdRecord::SIZE;
    for offset in memchr::memmem::rfind_iter(data, &EocdRecord::MAGIC) {
        if offset > limit {
            continue;
        }
        let comment_len =
            u16::from_le_bytes([data[offset + 20], data[offset + 21]]) as usize;
        if offset + EocdRecord::SIZE + comment_len == data.len() {
            return Ok(offset);
        }
    }

    Err(Error::EocdNotFound)
}

/// Parse one central directory entry at the reader's current position and
/// advance past its variable-length data.
fn parse_entry(reader: &mut BinaryReader, index: usize) -> Result<CentralDirectoryEntry> {
    let signature = reader.read_u32()?;
    if signature != CentralDirectoryHeader::SIGNATURE {
        return Err(Error::InvalidSignature {
            expected: CentralDirectoryHeader::SIGNATURE,
            actual: signature,
        });
    }

    let header: CentralDirectoryHeader = reader.read_struct()?;

    if header.file_name_length == 0 {
        return Err(Error::MalformedEntry {
            index,
            reason: "empty file name",
        });
    }

    // These reads also enforce that name + extra + comment fit in the buffer.
    let name_bytes = reader.read_bytes(header.file_name_length as usize)?;
    let extra_data = reader.read_bytes(header.extra_field_length as usize)?;
    reader.read_bytes(header.file_comment_length as usize)?;

    let mut compressed_size = header.compressed_size as u64;
    let mut uncompressed_size = header.uncompressed_size as u64;
    let mut local_header_offset = header.local_header_offset as u64;

    if header.compressed_size == u32::MAX
        || header.uncompressed_size == u32::MAX
        || header.local_header_offset == u32::MAX
    {
        if let Some(zip64) = find_zip64_block(extra_data) {
            let mut block = BinaryReader::new(zip64);
            // Fixed field order; each is present only if its 32-bit
            // counterpart carried the sentinel.
            if header.uncompressed_size == u32::MAX && block.remaining() >= 8 {
                uncompressed_size = block.read_u64()?;
            }
            if header.compressed_size == u32::MAX && block.remaining() >= 8 {
                compressed_size = block.read_u64()?;
            }
            if header.local_header_offset == u32::MAX && block.remaining() >= 8 {
                local_header_offset = block.read_u64()?;
            }
            // Disk start number would follow; single-disk archives only.
        }
    }

    // UTF-8 with an ASCII fallback. ASCII is a subset of UTF-8, so a name
    // that fails both is recorded empty and rejected at extraction time.
    let name = match std::str::from_utf8(name_bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::new(),
    };

    Ok(CentralDirectoryEntry {
        name,
        compression_method: header.compression_method,
        compressed_size,
        uncompressed_size,
        local_header_offset,
        crc32: header.crc32,
        flags: header.flags,
    })
}

/// Scan extra-field blocks for the ZIP64 extended information block
/// (header ID 0x0001) and return its payload.
///
/// Tolerant of trailing garbage: a block whose declared size overruns the
/// extra field ends the scan rather than failing the entry.
pub(crate) fn find_zip64_block(extra_data: &[u8]) -> Option<&[u8]> {
    let mut reader = BinaryReader::new(extra_data);
    while reader.remaining() >= 4 {
        let id = reader.read_u16().ok()?;
        let size = reader.read_u16().ok()? as usize;
        if size > reader.remaining() {
            return None;
        }
        let block = reader.read_bytes(size).ok()?;
        if id == extra_field::ZIP64 {
            return Some(block);
        }
    }
    None
}
