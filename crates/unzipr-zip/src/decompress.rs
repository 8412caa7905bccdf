//! Decompression of ZIP deflate payloads.
//!
//! ZIP stores deflate streams raw, without the zlib wrapper. The declared
//! uncompressed size is only a hint: archives written in streaming mode
//! can carry sizes recovered from questionable sources, so decoding falls
//! back through progressively more tolerant strategies instead of trusting
//! the hint outright:
//!
//! 1. a payload that already starts with a zlib header byte (0x78) is
//!    decoded as zlib-wrapped deflate;
//! 2. raw deflate into a hint-sized buffer;
//! 3. raw deflate into a grown buffer (hint x 4, capped) for undersized
//!    hints;
//! 4. a chunked streaming decode that needs no size up front.
//!
//! The caps bound allocation so a maliciously declared uncompressed size
//! cannot force an arbitrary up-front allocation.

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::{Decompress, FlushDecompress, Status};

use crate::{Error, Result};

/// First byte of a zlib stream with the deflate method and a 32 KiB window.
const ZLIB_HEADER_BYTE: u8 = 0x78;

/// Floor for the grown retry buffer.
const RETRY_FLOOR: usize = 256 * 1024;

/// Ceiling for the grown retry buffer.
const RETRY_CEILING: usize = 32 * 1024 * 1024;

/// Chunk size for the streaming fallback.
const STREAM_CHUNK: usize = 64 * 1024;

/// Decompress a raw ZIP deflate payload.
///
/// `size_hint` is the uncompressed size declared in the central directory;
/// pass 0 when unknown. Failure of every strategy is a per-entry error,
/// not a fatal one.
pub fn inflate(data: &[u8], size_hint: u64) -> Result<Vec<u8>> {
    // Some writers emit zlib-wrapped streams despite the format saying raw.
    if data.first() == Some(&ZLIB_HEADER_BYTE) {
        if let Ok(out) = inflate_zlib(data) {
            return Ok(out);
        }
    }

    if let Ok(hint) = usize::try_from(size_hint) {
        if hint > 0 {
            let retry = hint.saturating_mul(4).clamp(RETRY_FLOOR, RETRY_CEILING);
            for capacity in [hint, retry] {
                if let Ok(out) = inflate_raw_sized(data, capacity) {
                    return Ok(out);
                }
            }
        }
    }

    inflate_streaming(data)
}

/// Decode a zlib-wrapped deflate stream.
fn inflate_zlib(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Decompression(e.to_string()))?;
    Ok(out)
}

/// Decode a raw deflate stream into a buffer of the given capacity.
///
/// Fails (rather than growing) when the output does not fit, so the caller
/// controls the allocation ladder.
fn inflate_raw_sized(data: &[u8], capacity: usize) -> Result<Vec<u8>> {
    let mut decompress = Decompress::new(false);
    let mut out = Vec::with_capacity(capacity);

    match decompress.decompress_vec(data, &mut out, FlushDecompress::Finish) {
        Ok(Status::StreamEnd) => Ok(out),
        Ok(_) => Err(Error::Decompression(
            "output exceeds destination buffer".to_string(),
        )),
        Err(e) => Err(Error::Decompression(e.to_string())),
    }
}

/// Chunked raw deflate decode, accumulating until end-of-stream.
fn inflate_streaming(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut out = Vec::new();
    let mut chunk = vec![0u8; STREAM_CHUNK];

    loop {
        match decoder.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => out.extend_from_slice(&chunk[..n]),
            Err(e) => return Err(Error::Decompression(e.to_string())),
        }
    }

    Ok(out)
}
