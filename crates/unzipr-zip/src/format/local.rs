//! Local File Header structures.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Local File Header (without signature).
///
/// Precedes each entry's compressed payload. Only the name and extra field
/// lengths are trusted from this header (to find where the payload starts);
/// sizes come from the central directory, which is authoritative for a
/// well-formed archive.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct LocalFileHeader {
    /// Version needed to extract
    pub version_needed: u16,
    /// General purpose bit flag
    pub flags: u16,
    /// Compression method
    pub compression_method: u16,
    /// File last modification time and date (DOS format)
    pub last_modified: u32,
    /// CRC-32 of uncompressed data
    pub crc32: u32,
    /// Compressed size
    pub compressed_size: u32,
    /// Uncompressed size
    pub uncompressed_size: u32,
    /// File name length
    pub file_name_length: u16,
    /// Extra field length
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    /// Local File Header signature bytes.
    pub const MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

    /// Local File Header signature as u32.
    pub const SIGNATURE: u32 = 0x04034b50;

    /// Total size of the fixed header including the signature.
    pub const SIZE: usize = 30;

    /// Total variable-length data size following this header.
    pub fn variable_data_size(&self) -> usize {
        self.file_name_length as usize + self.extra_field_length as usize
    }
}

/// Data descriptor signature (0x08074b50).
///
/// Follows the payload of entries written in streaming mode (general
/// purpose flag bit 3). Never scanned for: the same byte sequence can
/// occur inside compressed data, so sizes are always taken from the
/// central directory instead.
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;
