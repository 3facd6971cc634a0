//! Content fingerprints for local documents
//!
//! Every fingerprint uses the canonical format `sha256:<hex>`. The registry
//! stores these strings verbatim, so the format must not change.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;

use crate::{Error, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the checksum of in-memory text.
pub fn compute_content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the checksum of a file, streaming its contents.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| Error::io(path, e))?;
    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_checksum_known_value() {
        assert_eq!(
            compute_content_checksum("hello world"),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn different_content_different_checksum() {
        assert_ne!(compute_content_checksum("aaa"), compute_content_checksum("bbb"));
    }

    #[test]
    fn file_checksum_matches_content_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Title\n\nbody\n").unwrap();

        assert_eq!(
            compute_file_checksum(&path).unwrap(),
            compute_content_checksum("# Title\n\nbody\n")
        );
    }

    #[test]
    fn missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = compute_file_checksum(&dir.path().join("absent.md")).unwrap_err();
        assert!(err.is_not_found());
    }
}
