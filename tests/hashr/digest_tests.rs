// Tests for the multi-digest accumulator

use super::*;
use hashr::hash::{Digests, HashComputer, HashrError, DEFAULT_BUFFER_SIZE};
use proptest::prelude::*;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_empty_file_digests() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.bin");
    fs::write(&path, b"").unwrap();

    let digests = HashComputer::new().compute_file(&path).unwrap();

    assert_eq!(digests.md5, EMPTY_MD5);
    assert_eq!(digests.sha1, EMPTY_SHA1);
    assert_eq!(digests.sha256, EMPTY_SHA256);
    assert_eq!(digests.sha512, EMPTY_SHA512);
    assert_eq!(digests.bytes, 0);
}

#[test]
fn test_known_content_digests() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hello.txt");
    fs::write(&path, b"hello world").unwrap();

    let digests = HashComputer::new().compute_file(&path).unwrap();

    assert_eq!(digests.md5, HELLO_MD5);
    assert_eq!(digests.sha1, HELLO_SHA1);
    assert_eq!(digests.sha256, HELLO_SHA256);
    assert_eq!(digests.sha512, HELLO_SHA512);
    assert_eq!(digests.bytes, 11);
}

#[test]
fn test_digest_lengths() {
    let digests = Digests::from_bytes(b"abc");
    assert_eq!(digests.md5.len(), 32);
    assert_eq!(digests.sha1.len(), 40);
    assert_eq!(digests.sha256.len(), 64);
    assert_eq!(digests.sha512.len(), 128);
    assert!(digests.sha512.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_default_buffer_is_two_mib() {
    assert_eq!(DEFAULT_BUFFER_SIZE, 2 * 1024 * 1024);
    assert_eq!(HashComputer::new().buffer_size(), DEFAULT_BUFFER_SIZE);
}

#[test]
fn test_buffer_plus_one_byte_matches_single_chunk() {
    // One full buffer plus one byte forces a second read
    let buffer_size = 4096;
    let data: Vec<u8> = (0..=buffer_size).map(|i| (i % 251) as u8).collect();
    assert_eq!(data.len(), buffer_size + 1);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("boundary.bin");
    fs::write(&path, &data).unwrap();

    let chunked = HashComputer::with_buffer_size(buffer_size).compute_file(&path).unwrap();
    let whole = HashComputer::with_buffer_size(data.len() * 2).compute_file(&path).unwrap();

    assert_eq!(chunked, whole);
    assert_eq!(chunked, Digests::from_bytes(&data));
}

#[test]
fn test_identical_content_different_paths() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
    let first = dir.path().join("a.txt");
    let second = dir.path().join("nested/deeper/b.dat");
    fs::write(&first, b"same bytes").unwrap();
    fs::write(&second, b"same bytes").unwrap();

    let mut computer = HashComputer::with_buffer_size(3);
    let a = computer.compute_file(&first).unwrap();
    let b = computer.compute_file(&second).unwrap();

    assert_eq!(a, b);
}

#[test]
fn test_buffer_reused_across_files() {
    let dir = TempDir::new().unwrap();
    let big = dir.path().join("big.bin");
    let small = dir.path().join("small.bin");
    fs::write(&big, vec![0xAB; 10_000]).unwrap();
    fs::write(&small, b"hello world").unwrap();

    // A stale tail from the big file must not leak into the small one
    let mut computer = HashComputer::with_buffer_size(1024);
    computer.compute_file(&big).unwrap();
    let digests = computer.compute_file(&small).unwrap();

    assert_eq!(digests.sha256, HELLO_SHA256);
}

#[test]
fn test_open_failure() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.txt");

    let result = HashComputer::new().compute_file(&missing);

    match result {
        Err(HashrError::Open { path, .. }) => assert_eq!(path, missing),
        other => panic!("Expected Open error, got {:?}", other),
    }
}

#[test]
#[cfg(unix)]
fn test_directory_read_failure() {
    // Opening a directory succeeds on Unix but reading it fails
    let dir = TempDir::new().unwrap();

    let result = HashComputer::new().compute_file(dir.path());

    assert!(matches!(result, Err(HashrError::Read { .. })));
}

/// Yields some bytes, then an error
struct FailingReader {
    served: bool,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.served {
            Err(io::Error::new(io::ErrorKind::Other, "device went away"))
        } else {
            self.served = true;
            buf[0] = b'x';
            Ok(1)
        }
    }
}

#[test]
fn test_mid_stream_read_failure() {
    let mut reader = FailingReader { served: false };
    let result = HashComputer::with_buffer_size(16).compute_reader(&mut reader, Path::new("dev"));

    match result {
        Err(HashrError::Read { path, source }) => {
            assert_eq!(path, Path::new("dev"));
            assert_eq!(source.to_string(), "device went away");
        }
        other => panic!("Expected Read error, got {:?}", other),
    }
}

/// Interrupted once, then serves the payload
struct InterruptedReader {
    interrupted: bool,
    data: io::Cursor<Vec<u8>>,
}

impl Read for InterruptedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.interrupted {
            self.interrupted = true;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
        }
        self.data.read(buf)
    }
}

#[test]
fn test_interrupted_read_is_retried() {
    let mut reader = InterruptedReader {
        interrupted: false,
        data: io::Cursor::new(b"hello world".to_vec()),
    };

    let digests = HashComputer::with_buffer_size(4)
        .compute_reader(&mut reader, Path::new("<signal>"))
        .unwrap();

    assert_eq!(digests.md5, HELLO_MD5);
}

proptest! {
    #[test]
    fn prop_chunking_invariance(
        data in proptest::collection::vec(any::<u8>(), 0..8192),
        buffer_size in 1usize..2048,
    ) {
        let mut cursor = io::Cursor::new(data.clone());
        let chunked = HashComputer::with_buffer_size(buffer_size)
            .compute_reader(&mut cursor, Path::new("<memory>"))
            .unwrap();

        prop_assert_eq!(chunked, Digests::from_bytes(&data));
    }
}
