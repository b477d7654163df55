//! Content fingerprints for change detection
//!
//! A fingerprint is the lowercase hex SHA-256 of a file's full byte content.
//! The result is independent of how the input is chunked, so readers and
//! in-memory buffers produce identical fingerprints for identical bytes.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Fingerprint an in-memory byte slice
pub fn fingerprint_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Fingerprint any readable source using 8 KiB chunks
pub fn fingerprint_reader<R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint a file on disk
pub fn fingerprint_file(path: impl AsRef<Path>) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    fingerprint_reader(&mut file)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_fingerprint_bytes() {
        assert_eq!(
            fingerprint_bytes(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_fingerprint_reader_matches_bytes() {
        let data = vec![0xabu8; 100_000];
        let mut cursor = Cursor::new(data.clone());
        assert_eq!(fingerprint_reader(&mut cursor).unwrap(), fingerprint_bytes(&data));
    }

    #[test]
    fn test_fingerprint_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pr.class");
        std::fs::write(&path, b"hello world").unwrap();

        assert_eq!(
            fingerprint_file(&path).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_single_byte_change_changes_fingerprint() {
        let a = fingerprint_bytes(b"series-id,year,period,value");
        let b = fingerprint_bytes(b"series-id,year,period,valu3");
        assert_ne!(a, b);
    }
}
