//! Error types for the ZIP crate.

use thiserror::Error;

/// Errors that can occur when working with ZIP archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] unzipr_common::Error),

    /// Invalid ZIP magic bytes.
    #[error("invalid ZIP signature: expected {expected:#010x}, got {actual:#010x}")]
    InvalidSignature { expected: u32, actual: u32 },

    /// Could not find the end of central directory record.
    #[error("could not find end of central directory record")]
    EocdNotFound,

    /// EOCD or central directory metadata points outside the buffer.
    #[error("central directory out of bounds: {0}")]
    DirectoryOutOfBounds(&'static str),

    /// A central directory entry is truncated or malformed.
    ///
    /// This aborts the whole parse: a silently truncated entry list would
    /// cause extraction to silently omit files.
    #[error("malformed central directory entry at index {index}: {reason}")]
    MalformedEntry { index: usize, reason: &'static str },

    /// Fewer entries parsed than the EOCD declared.
    #[error("central directory entry count mismatch: expected {expected}, parsed {parsed}")]
    EntryCountMismatch { expected: u64, parsed: u64 },

    /// Unsupported compression method.
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    /// Entry payload is encrypted.
    #[error("encrypted entry: {0}")]
    EncryptedEntry(String),

    /// Entry payload lies outside the buffer.
    #[error("entry payload out of bounds: {0}")]
    PayloadOutOfBounds(String),

    /// Decompression error.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// CRC-32 of the decompressed data does not match the directory value.
    #[error("CRC-32 mismatch for {name}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    /// Entry name escapes the destination directory (zip slip).
    #[error("unsafe entry path rejected: {0}")]
    UnsafePath(String),
}

/// Result type for ZIP operations.
pub type Result<T> = std::result::Result<T, Error>;
