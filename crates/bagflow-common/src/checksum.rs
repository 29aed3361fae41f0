//! Content-hash utilities
//!
//! Stage workers hash every unpacked file twice: the 128-bit digest drives
//! reconciliation against the registry, the 256-bit digest is registered
//! alongside it for fixity checks.

use crate::error::Result;
use crate::types::{ChecksumAlgorithm, ChecksumAttribute};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Compute a digest for a file on disk
pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Compute a digest for any readable source
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Md5 => {
            let mut context = md5::Context::new();
            let mut buffer = [0u8; 8192];

            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                context.consume(&buffer[..bytes_read]);
            }

            Ok(format!("{:x}", context.compute()))
        },
        ChecksumAlgorithm::Sha256 => {
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
        },
    }
}

/// Compute a timestamped checksum attribute for a file on disk
pub fn digest_file(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<ChecksumAttribute> {
    let digest = compute_file_checksum(path, algorithm)?;
    Ok(ChecksumAttribute::new(algorithm, digest))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    #[test]
    fn test_compute_checksum_md5() {
        let data = b"hello world";
        let mut cursor = Cursor::new(data);
        let checksum = compute_checksum(&mut cursor, ChecksumAlgorithm::Md5).unwrap();
        assert_eq!(checksum, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_compute_checksum_sha256() {
        let data = b"hello world";
        let mut cursor = Cursor::new(data);
        let checksum = compute_checksum(&mut cursor, ChecksumAlgorithm::Sha256).unwrap();
        assert_eq!(checksum, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }

    #[test]
    fn test_digest_file_carries_algorithm_and_timestamp() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello world").unwrap();

        let attr = digest_file(tmp.path(), ChecksumAlgorithm::Md5).unwrap();
        assert_eq!(attr.algorithm, ChecksumAlgorithm::Md5);
        assert_eq!(attr.digest, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }
}
