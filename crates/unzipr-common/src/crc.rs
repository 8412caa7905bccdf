//! CRC-32 hashing utilities.
//!
//! ZIP archives checksum every entry's uncompressed data with the
//! reflected CRC-32 of ISO-3309 (polynomial 0xEDB88320, initial value
//! 0xFFFFFFFF, final one's complement). This is the variant implemented
//! by `crc32fast`, not the Castagnoli (CRC32C) flavor.

/// Compute the CRC-32 of a byte slice.
///
/// Uses hardware acceleration when available (SSE4.2 / PCLMULQDQ on x86).
#[inline]
pub fn hash_bytes(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Continue a previous CRC-32 computation over more data.
///
/// `seed` is the value returned by an earlier [`hash_bytes`] or
/// [`hash_bytes_with_seed`] call over the preceding bytes.
#[inline]
pub fn hash_bytes_with_seed(data: &[u8], seed: u32) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(seed);
    hasher.update(data);
    hasher.finalize()
}
