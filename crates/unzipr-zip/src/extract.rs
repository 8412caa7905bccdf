//! Archive extraction.
//!
//! Walks the parsed central directory in order and writes each entry under
//! a destination directory. Extraction never fails as a whole once a valid
//! central directory exists: every per-entry problem (unsupported method,
//! bad local header, payload out of bounds, decompression failure, CRC
//! mismatch, encrypted entry, rejected path) is logged and the entry is
//! skipped, so a partially-malformed archive still yields as many valid
//! files as possible.
//!
//! Entry names are attacker-controlled. The path sanitizer rejects
//! absolute paths and any `..` component outright, and after parent
//! directories exist the canonicalized parent is required to resolve
//! inside the canonicalized destination, closing the symlink variant of
//! zip slip. Rejected entries are skipped, never rewritten to a "safe"
//! location.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use unzipr_common::{crc, BinaryReader};

use crate::decompress;
use crate::directory::{find_zip64_block, CentralDirectory, CentralDirectoryEntry};
use crate::format::{CompressionMethod, LocalFileHeader};
use crate::{Error, Result};

/// Options for [`extract_archive_with_options`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Verify each entry's CRC-32 against the central directory value and
    /// skip the entry on mismatch. Defaults to true.
    pub verify_checksum: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            verify_checksum: true,
        }
    }
}

/// Tally of an extraction run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Files written to the destination.
    pub extracted: usize,
    /// Entries skipped after a logged per-entry failure.
    pub skipped: usize,
}

/// Extract an in-memory ZIP archive into `destination`, verifying checksums.
///
/// See [`extract_archive_with_options`].
pub fn extract_archive(data: &[u8], destination: &Path) -> ExtractSummary {
    extract_archive_with_options(data, destination, &ExtractOptions::default())
}

/// Extract an in-memory ZIP archive into `destination`.
///
/// Never returns an error. If the buffer holds no valid central directory
/// the failure is logged, nothing is written and the destination directory
/// is not created. Otherwise the destination is created and each entry is
/// extracted or skipped-and-logged individually; the returned summary
/// tallies both outcomes.
pub fn extract_archive_with_options(
    data: &[u8],
    destination: &Path,
    options: &ExtractOptions,
) -> ExtractSummary {
    let directory = match CentralDirectory::parse(data) {
        Ok(directory) => directory,
        Err(err) => {
            log::error!("extraction aborted, no valid central directory: {err}");
            return ExtractSummary::default();
        }
    };

    if let Err(err) = fs::create_dir_all(destination) {
        log::error!(
            "failed to create destination directory {}: {err}",
            destination.display()
        );
        return ExtractSummary::default();
    }

    // Resolved once; every entry's parent must land under this.
    let canonical_dest = match destination.canonicalize() {
        Ok(path) => path,
        Err(err) => {
            log::error!(
                "failed to resolve destination directory {}: {err}",
                destination.display()
            );
            return ExtractSummary::default();
        }
    };

    let mut summary = ExtractSummary::default();

    for entry in &directory.entries {
        // Directory placeholders carry no payload.
        if entry.is_directory() {
            continue;
        }

        match extract_entry(data, entry, destination, &canonical_dest, options) {
            Ok(()) => summary.extracted += 1,
            Err(err) => {
                log::error!("skipping entry {:?}: {err}", entry.name);
                summary.skipped += 1;
            }
        }
    }

    summary
}

fn extract_entry(
    data: &[u8],
    entry: &CentralDirectoryEntry,
    destination: &Path,
    canonical_dest: &Path,
    options: &ExtractOptions,
) -> Result<()> {
    if entry.is_encrypted() {
        return Err(Error::EncryptedEntry(entry.name.clone()));
    }

    let out_path = sanitize_entry_path(destination, &entry.name)?;

    // Re-locate the local file header; only its variable-length field
    // sizes are needed to find the payload.
    let header_offset = usize::try_from(entry.local_header_offset)
        .map_err(|_| Error::PayloadOutOfBounds(entry.name.clone()))?;

    let mut reader = BinaryReader::new_at(data, header_offset);
    let signature = reader
        .read_u32()
        .map_err(|_| Error::PayloadOutOfBounds(entry.name.clone()))?;
    if signature != LocalFileHeader::SIGNATURE {
        return Err(Error::InvalidSignature {
            expected: LocalFileHeader::SIGNATURE,
            actual: signature,
        });
    }
    let local: LocalFileHeader = reader.read_struct()?;

    reader.read_bytes(local.file_name_length as usize)?;
    let local_extra = reader.read_bytes(local.extra_field_length as usize)?;

    // Central directory values are authoritative, but the local header may
    // independently carry ZIP64 sizes when its own 32-bit fields are
    // sentineled.
    let mut compressed_size = entry.compressed_size;
    let mut uncompressed_size = entry.uncompressed_size;
    if local.compressed_size == u32::MAX || local.uncompressed_size == u32::MAX {
        if let Some(zip64) = find_zip64_block(local_extra) {
            let mut block = BinaryReader::new(zip64);
            if local.uncompressed_size == u32::MAX && block.remaining() >= 8 {
                uncompressed_size = block.read_u64()?;
            }
            if local.compressed_size == u32::MAX && block.remaining() >= 8 {
                compressed_size = block.read_u64()?;
            }
        }
    }

    let payload_start = reader.position();
    let payload_len = usize::try_from(compressed_size)
        .map_err(|_| Error::PayloadOutOfBounds(entry.name.clone()))?;
    let payload_end = payload_start
        .checked_add(payload_len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| Error::PayloadOutOfBounds(entry.name.clone()))?;
    let payload = &data[payload_start..payload_end];

    let method = CompressionMethod::try_from(entry.compression_method)
        .map_err(Error::UnsupportedCompression)?;

    let out_data: Cow<'_, [u8]> = match method {
        CompressionMethod::Stored => Cow::Borrowed(payload),
        CompressionMethod::Deflate => {
            Cow::Owned(decompress::inflate(payload, uncompressed_size)?)
        }
    };

    // Never write a file whose integrity cannot be confirmed.
    if options.verify_checksum {
        let actual = crc::hash_bytes(&out_data);
        if actual != entry.crc32 {
            return Err(Error::ChecksumMismatch {
                name: entry.name.clone(),
                expected: entry.crc32,
                actual,
            });
        }
    }

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
        // The lexical check above cannot see symlinks; the resolved parent
        // must still land inside the destination.
        let canonical_parent = parent.canonicalize()?;
        if !canonical_parent.starts_with(canonical_dest) {
            return Err(Error::UnsafePath(entry.name.clone()));
        }
    }

    fs::write(&out_path, &out_data)?;
    Ok(())
}

/// Validate an entry name and resolve it against the destination directory.
///
/// Backslashes are normalized to forward slashes, empty and `.` segments
/// are dropped, and the name is rejected outright if it is empty
/// (undecodable), absolute, contains a `..` segment, or smuggles a drive
/// prefix. Rejection is an error, never a rewrite.
fn sanitize_entry_path(destination: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() {
        return Err(Error::UnsafePath("<undecodable name>".to_string()));
    }

    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') {
        return Err(Error::UnsafePath(name.to_string()));
    }

    let mut relative = PathBuf::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(Error::UnsafePath(name.to_string())),
            segment if segment.contains(':') => {
                return Err(Error::UnsafePath(name.to_string()))
            }
            segment => relative.push(segment),
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(Error::UnsafePath(name.to_string()));
    }

    Ok(destination.join(relative))
}
