//! ZIP format structures.
//!
//! Low-level on-disk structures for parsing ZIP archives, modeled as
//! packed zerocopy structs with their 4-byte signatures read separately.

pub mod central;
mod eocd;
mod local;

pub use central::CentralDirectoryHeader;
pub use eocd::EocdRecord;
pub use local::{LocalFileHeader, DATA_DESCRIPTOR_SIGNATURE};

/// Compression methods supported for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CompressionMethod {
    /// No compression (stored).
    Stored = 0,
    /// DEFLATE compression.
    Deflate = 8,
}

impl TryFrom<u16> for CompressionMethod {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Stored),
            8 => Ok(Self::Deflate),
            other => Err(other),
        }
    }
}
