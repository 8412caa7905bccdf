//! Central-directory-driven ZIP archive reader.
//!
//! Parses the End of Central Directory record from the tail of an
//! in-memory archive, walks the central directory, and extracts entries
//! to a destination directory. Supported entry encodings:
//!
//! - Stored (method 0) and DEFLATE (method 8) payloads
//! - ZIP64 extra-field overrides for >4 GiB sizes and offsets
//! - Streamed entries (data descriptor flag): sizes are always taken from
//!   the central directory, never recovered by scanning for the
//!   descriptor signature
//!
//! Encrypted entries are detected and skipped. Extraction verifies each
//! entry's CRC-32 and rejects entry names that would escape the
//! destination directory (zip slip), while malformed sibling entries are
//! skipped individually rather than failing the whole archive.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let data = std::fs::read("archive.zip")?;
//!
//! if let Some(directory) = unzipr_zip::parse_central_directory(&data) {
//!     for entry in &directory.entries {
//!         println!("{}: {} bytes", entry.name, entry.uncompressed_size);
//!     }
//! }
//!
//! let summary = unzipr_zip::extract_archive(&data, Path::new("out"));
//! println!("{} extracted, {} skipped", summary.extracted, summary.skipped);
//! # Ok::<(), std::io::Error>(())
//! ```

mod decompress;
mod directory;
mod error;
mod extract;
pub mod format;

pub use directory::{CentralDirectory, CentralDirectoryEntry};
pub use error::{Error, Result};
pub use extract::{
    extract_archive, extract_archive_with_options, ExtractOptions, ExtractSummary,
};
pub use format::CompressionMethod;

/// Parse the central directory of an in-memory ZIP archive.
///
/// Read-only introspection: returns `None` for any structural failure (no
/// EOCD, out-of-range directory metadata, truncated or malformed entries).
/// Use [`CentralDirectory::parse`] for the underlying error detail.
pub fn parse_central_directory(data: &[u8]) -> Option<CentralDirectory> {
    match CentralDirectory::parse(data) {
        Ok(directory) => Some(directory),
        Err(err) => {
            log::debug!("central directory parse failed: {err}");
            None
        }
    }
}
