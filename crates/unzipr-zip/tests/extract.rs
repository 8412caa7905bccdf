//! End-to-end extraction tests over hand-built in-memory archives.

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::DeflateEncoder;
use flate2::Compression;
use tempfile::TempDir;

use unzipr_common::crc;
use unzipr_zip::{
    extract_archive, extract_archive_with_options, parse_central_directory, ExtractOptions,
};

/// Builds well-formed (or deliberately broken) ZIP archives in memory.
///
/// Local headers and payloads are appended as entries are added; the
/// central directory and EOCD are emitted by `finish`.
#[derive(Default)]
struct ZipBuilder {
    data: Vec<u8>,
    central: Vec<u8>,
    count: u16,
}

impl ZipBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Append one entry; returns the byte offset of its payload within the
    /// archive, so tests can corrupt it.
    #[allow(clippy::too_many_arguments)]
    fn add_entry(
        &mut self,
        name: &str,
        method: u16,
        flags: u16,
        crc32: u32,
        payload: &[u8],
        compressed_size: u32,
        uncompressed_size: u32,
        central_extra: &[u8],
    ) -> usize {
        self.add_entry_split(
            name,
            method,
            flags,
            crc32,
            payload,
            (compressed_size, uncompressed_size),
            &[],
            (compressed_size, uncompressed_size),
            central_extra,
        )
    }

    /// Like `add_entry`, but the local header carries its own sizes and
    /// extra field instead of mirroring the central record.
    #[allow(clippy::too_many_arguments)]
    fn add_entry_split(
        &mut self,
        name: &str,
        method: u16,
        flags: u16,
        crc32: u32,
        payload: &[u8],
        (local_compressed, local_uncompressed): (u32, u32),
        local_extra: &[u8],
        (central_compressed, central_uncompressed): (u32, u32),
        central_extra: &[u8],
    ) -> usize {
        let local_offset = self.data.len() as u32;

        // Local file header
        self.data.extend_from_slice(&0x04034b50u32.to_le_bytes());
        self.data.extend_from_slice(&20u16.to_le_bytes()); // version needed
        self.data.extend_from_slice(&flags.to_le_bytes());
        self.data.extend_from_slice(&method.to_le_bytes());
        self.data.extend_from_slice(&0u32.to_le_bytes()); // mod time/date
        self.data.extend_from_slice(&crc32.to_le_bytes());
        self.data.extend_from_slice(&local_compressed.to_le_bytes());
        self.data.extend_from_slice(&local_uncompressed.to_le_bytes());
        self.data
            .extend_from_slice(&(name.len() as u16).to_le_bytes());
        self.data
            .extend_from_slice(&(local_extra.len() as u16).to_le_bytes());
        self.data.extend_from_slice(name.as_bytes());
        self.data.extend_from_slice(local_extra);

        let payload_offset = self.data.len();
        self.data.extend_from_slice(payload);

        // Central directory file header
        self.central.extend_from_slice(&0x02014b50u32.to_le_bytes());
        self.central.extend_from_slice(&20u16.to_le_bytes()); // version made by
        self.central.extend_from_slice(&20u16.to_le_bytes()); // version needed
        self.central.extend_from_slice(&flags.to_le_bytes());
        self.central.extend_from_slice(&method.to_le_bytes());
        self.central.extend_from_slice(&0u32.to_le_bytes()); // mod time/date
        self.central.extend_from_slice(&crc32.to_le_bytes());
        self.central
            .extend_from_slice(&central_compressed.to_le_bytes());
        self.central
            .extend_from_slice(&central_uncompressed.to_le_bytes());
        self.central
            .extend_from_slice(&(name.len() as u16).to_le_bytes());
        self.central
            .extend_from_slice(&(central_extra.len() as u16).to_le_bytes());
        self.central.extend_from_slice(&0u16.to_le_bytes()); // comment length
        self.central.extend_from_slice(&0u16.to_le_bytes()); // disk number
        self.central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        self.central.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        self.central.extend_from_slice(&local_offset.to_le_bytes());
        self.central.extend_from_slice(name.as_bytes());
        self.central.extend_from_slice(central_extra);

        self.count += 1;
        payload_offset
    }

    fn add_stored(&mut self, name: &str, contents: &[u8]) -> usize {
        self.add_entry(
            name,
            0,
            0,
            crc::hash_bytes(contents),
            contents,
            contents.len() as u32,
            contents.len() as u32,
            &[],
        )
    }

    fn add_deflate(&mut self, name: &str, contents: &[u8]) -> usize {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(contents).unwrap();
        let compressed = encoder.finish().unwrap();

        self.add_entry(
            name,
            8,
            0,
            crc::hash_bytes(contents),
            &compressed,
            compressed.len() as u32,
            contents.len() as u32,
            &[],
        )
    }

    fn add_directory(&mut self, name: &str) {
        assert!(name.ends_with('/'));
        self.add_entry(name, 0, 0, 0, &[], 0, 0, &[]);
    }

    fn finish(self) -> Vec<u8> {
        self.finish_with_comment(&[])
    }

    fn finish_with_comment(mut self, comment: &[u8]) -> Vec<u8> {
        let cd_offset = self.data.len() as u32;
        let cd_size = self.central.len() as u32;
        self.data.extend_from_slice(&self.central);

        self.data.extend_from_slice(&0x06054b50u32.to_le_bytes());
        self.data.extend_from_slice(&0u16.to_le_bytes()); // disk number
        self.data.extend_from_slice(&0u16.to_le_bytes()); // cd disk
        self.data.extend_from_slice(&self.count.to_le_bytes());
        self.data.extend_from_slice(&self.count.to_le_bytes());
        self.data.extend_from_slice(&cd_size.to_le_bytes());
        self.data.extend_from_slice(&cd_offset.to_le_bytes());
        self.data
            .extend_from_slice(&(comment.len() as u16).to_le_bytes());
        self.data.extend_from_slice(comment);

        self.data
    }
}

fn read_tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let name = path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned();
                files.push((name, fs::read(&path).unwrap()));
            }
        }
    }
    files.sort();
    files
}

#[test]
fn three_stored_files_roundtrip() {
    let mut builder = ZipBuilder::new();
    builder.add_stored("file_a.txt", b"alpha");
    builder.add_stored("file_b.txt", b"bravo");
    builder.add_stored("file_c.txt", b"charlie");
    let archive = builder.finish();

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&archive, &dest);

    assert_eq!(summary.extracted, 3);
    assert_eq!(summary.skipped, 0);
    assert_eq!(
        read_tree(&dest),
        vec![
            ("file_a.txt".to_string(), b"alpha".to_vec()),
            ("file_b.txt".to_string(), b"bravo".to_vec()),
            ("file_c.txt".to_string(), b"charlie".to_vec()),
        ]
    );
}

#[test]
fn deflate_entries_roundtrip() {
    let body: Vec<u8> = (0..50_000u32).map(|i| (i % 253) as u8).collect();

    let mut builder = ZipBuilder::new();
    builder.add_deflate("data.bin", &body);
    builder.add_deflate("empty.bin", b"");
    let archive = builder.finish();

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&archive, &dest);

    assert_eq!(summary.extracted, 2);
    assert_eq!(fs::read(dest.join("data.bin")).unwrap(), body);
    assert_eq!(fs::read(dest.join("empty.bin")).unwrap(), b"");
}

#[test]
fn nested_directories_are_created() {
    let mut builder = ZipBuilder::new();
    builder.add_directory("a/");
    builder.add_directory("a/b/");
    builder.add_stored("a/b/deep.txt", b"nested");
    let archive = builder.finish();

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&archive, &dest);

    // Placeholders are neither extracted nor counted as skips.
    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(fs::read(dest.join("a/b/deep.txt")).unwrap(), b"nested");
}

#[test]
fn corrupted_deflate_payload_skips_only_that_entry() {
    let mut builder = ZipBuilder::new();
    builder.add_deflate("good.txt", b"this entry survives the corruption next door");
    let payload = builder.add_deflate("bad.txt", b"this payload gets a byte flipped");
    let mut archive = builder.finish();

    archive[payload + 4] ^= 0xFF;

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&archive, &dest);

    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.skipped, 1);
    assert!(dest.join("good.txt").exists());
    assert!(!dest.join("bad.txt").exists());
}

#[test]
fn stored_entry_with_wrong_crc_is_skipped() {
    let mut builder = ZipBuilder::new();
    builder.add_stored("ok.txt", b"fine");
    let payload = builder.add_stored("tampered.txt", b"original contents");
    let mut archive = builder.finish();

    // Flip a payload byte; the declared CRC no longer matches.
    archive[payload] ^= 0x01;

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&archive, &dest);

    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.skipped, 1);
    assert!(!dest.join("tampered.txt").exists());
}

#[test]
fn checksum_verification_can_be_disabled() {
    let mut builder = ZipBuilder::new();
    let payload = builder.add_stored("tampered.txt", b"original contents");
    let mut archive = builder.finish();
    archive[payload] ^= 0x01;

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive_with_options(
        &archive,
        &dest,
        &ExtractOptions {
            verify_checksum: false,
        },
    );

    assert_eq!(summary.extracted, 1);
    assert!(dest.join("tampered.txt").exists());
}

#[test]
fn zip_slip_names_never_escape() {
    let mut builder = ZipBuilder::new();
    builder.add_stored("../evil.txt", b"escaped");
    builder.add_stored("/etc/passwd", b"absolute");
    builder.add_stored("nested/../../evil2.txt", b"escaped");
    builder.add_stored("safe.txt", b"legit");
    let archive = builder.finish();

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&archive, &dest);

    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.skipped, 3);
    assert!(!tmp.path().join("evil.txt").exists());
    assert!(!tmp.path().join("evil2.txt").exists());
    // Everything under the destination is expected.
    assert_eq!(
        read_tree(&dest),
        vec![("safe.txt".to_string(), b"legit".to_vec())]
    );
}

#[test]
fn encrypted_entries_are_skipped() {
    let contents = b"pretend this is ciphertext";
    let mut builder = ZipBuilder::new();
    builder.add_entry(
        "secret.txt",
        0,
        0x0001, // encrypted flag
        crc::hash_bytes(contents),
        contents,
        contents.len() as u32,
        contents.len() as u32,
        &[],
    );
    builder.add_stored("open.txt", b"cleartext");
    let archive = builder.finish();

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&archive, &dest);

    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.skipped, 1);
    assert!(!dest.join("secret.txt").exists());
}

#[test]
fn unsupported_method_is_skipped() {
    let mut builder = ZipBuilder::new();
    builder.add_entry("weird.bin", 14, 0, 0, b"lzma?", 5, 5, &[]);
    builder.add_stored("plain.txt", b"ok");
    let archive = builder.finish();

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&archive, &dest);

    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn eocd_decoy_inside_payload() {
    // A stored payload containing the EOCD signature bytes must not
    // confuse the backward scan.
    let decoy = b"leading bytes PK\x05\x06 trailing bytes";

    let mut builder = ZipBuilder::new();
    builder.add_stored("decoy.bin", decoy);
    let archive = builder.finish();

    let directory = parse_central_directory(&archive).unwrap();
    assert_eq!(directory.entry_count, 1);
    assert_eq!(directory.entries[0].name, "decoy.bin");

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&archive, &dest);
    assert_eq!(summary.extracted, 1);
    assert_eq!(fs::read(dest.join("decoy.bin")).unwrap(), decoy);
}

#[test]
fn archive_comment_is_preserved() {
    let mut builder = ZipBuilder::new();
    builder.add_stored("a.txt", b"a");
    let archive = builder.finish_with_comment(b"release build 2024-11");

    let directory = parse_central_directory(&archive).unwrap();
    assert_eq!(directory.comment, b"release build 2024-11");
    assert_eq!(directory.entries.len(), 1);
}

#[test]
fn zip64_extra_field_overrides_sentineled_sizes() {
    let contents = b"zip64-described contents";

    // Central record carries 0xFFFFFFFF sizes; the real values live in a
    // ZIP64 extra-field block (uncompressed then compressed).
    let mut extra = Vec::new();
    extra.extend_from_slice(&0x0001u16.to_le_bytes());
    extra.extend_from_slice(&16u16.to_le_bytes());
    extra.extend_from_slice(&(contents.len() as u64).to_le_bytes());
    extra.extend_from_slice(&(contents.len() as u64).to_le_bytes());

    let mut builder = ZipBuilder::new();
    builder.add_entry(
        "big.bin",
        0,
        0,
        crc::hash_bytes(contents),
        contents,
        u32::MAX,
        u32::MAX,
        &extra,
    );
    let archive = builder.finish();

    let directory = parse_central_directory(&archive).unwrap();
    assert_eq!(directory.entries[0].compressed_size, contents.len() as u64);
    assert_eq!(
        directory.entries[0].uncompressed_size,
        contents.len() as u64
    );

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&archive, &dest);
    assert_eq!(summary.extracted, 1);
    assert_eq!(fs::read(dest.join("big.bin")).unwrap(), contents);
}

#[test]
fn local_header_zip64_block_resolves_sentineled_sizes() {
    let contents: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&contents).unwrap();
    let compressed = encoder.finish().unwrap();

    // Both headers carry 0xFFFFFFFF sizes and their own ZIP64 block
    // (uncompressed then compressed), the way zip64-producing tools
    // write them. The local block must be read on its own; the central
    // one is not visible at the local header.
    let mut zip64 = Vec::new();
    zip64.extend_from_slice(&0x0001u16.to_le_bytes());
    zip64.extend_from_slice(&16u16.to_le_bytes());
    zip64.extend_from_slice(&(contents.len() as u64).to_le_bytes());
    zip64.extend_from_slice(&(compressed.len() as u64).to_le_bytes());

    let mut builder = ZipBuilder::new();
    builder.add_entry_split(
        "big.bin",
        8,
        0,
        crc::hash_bytes(&contents),
        &compressed,
        (u32::MAX, u32::MAX),
        &zip64,
        (u32::MAX, u32::MAX),
        &zip64,
    );
    let archive = builder.finish();

    let directory = parse_central_directory(&archive).unwrap();
    assert_eq!(directory.entries[0].compressed_size, compressed.len() as u64);
    assert_eq!(directory.entries[0].uncompressed_size, contents.len() as u64);

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&archive, &dest);
    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(fs::read(dest.join("big.bin")).unwrap(), contents);
}

#[test]
fn random_bytes_create_nothing() {
    let data: Vec<u8> = (0..8192u32).map(|i| (i.wrapping_mul(2654435761) >> 24) as u8).collect();

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    let summary = extract_archive(&data, &dest);

    assert_eq!(summary.extracted, 0);
    assert_eq!(summary.skipped, 0);
    assert!(!dest.exists());
}

#[test]
fn extraction_is_idempotent() {
    let mut builder = ZipBuilder::new();
    builder.add_stored("one.txt", b"1");
    builder.add_deflate("two.txt", b"22");
    let archive = builder.finish();

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");

    let first = extract_archive(&archive, &dest);
    let tree_first = read_tree(&dest);
    let second = extract_archive(&archive, &dest);
    let tree_second = read_tree(&dest);

    assert_eq!(first, second);
    assert_eq!(tree_first, tree_second);
}

#[test]
fn bad_local_header_skips_entry() {
    let mut builder = ZipBuilder::new();
    builder.add_stored("ok.txt", b"fine");
    let archive = builder.finish();

    // Point a copy's only entry at garbage: rebuild with a bogus offset by
    // patching the central record's local-header-offset field. The central
    // directory starts right after the single local entry.
    let mut broken = ZipBuilder::new();
    broken.add_stored("ok.txt", b"fine");
    broken.add_stored("broken.txt", b"unreachable");
    let mut broken = broken.finish();

    // Second central record: locate it by searching for the name.
    let pos = broken
        .windows(b"broken.txt".len())
        .rposition(|w| w == b"broken.txt")
        .unwrap();
    // Offset field sits 4 bytes before the name in the central record.
    broken[pos - 4..pos].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());

    let tmp = TempDir::new().unwrap();

    let dest_ok = tmp.path().join("ok");
    assert_eq!(extract_archive(&archive, &dest_ok).extracted, 1);

    let dest_broken = tmp.path().join("broken");
    let summary = extract_archive(&broken, &dest_broken);
    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.skipped, 1);
    assert!(dest_broken.join("ok.txt").exists());
    assert!(!dest_broken.join("broken.txt").exists());
}
