//! Catalog checksum (`addons.xml.md5`).
//!
//! Clients compare this digest with their cached copy to decide whether the
//! catalog needs downloading again. It is a change detector only, hence MD5.

use std::fs;
use std::path::Path;

use md5::{Digest, Md5};
use tracing::info;

use super::{PublishError, PublishResult};

/// Lowercase hex MD5 of `bytes`.
pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", Md5::digest(bytes))
}

/// Lowercase hex MD5 of a file's exact contents.
pub fn calculate_md5(path: &Path) -> PublishResult<String> {
    let bytes = fs::read(path).map_err(|e| PublishError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(md5_hex(&bytes))
}

/// Hash the catalog as it is on disk and write the digest next to it.
///
/// Returns the digest.
pub fn write_checksum(catalog_path: &Path, checksum_path: &Path) -> PublishResult<String> {
    let digest = calculate_md5(catalog_path)?;

    fs::write(checksum_path, digest.as_bytes()).map_err(|e| PublishError::WriteFailed {
        path: checksum_path.to_path_buf(),
        source: e,
    })?;

    info!(
        "Wrote addons md5 for {} to {}",
        catalog_path.display(),
        checksum_path.display()
    );
    Ok(digest)
}

/// Check that the stored digest matches the catalog on disk.
///
/// Returns the digest on success.
pub fn verify_checksum(catalog_path: &Path, checksum_path: &Path) -> PublishResult<String> {
    let expected = fs::read_to_string(checksum_path).map_err(|e| PublishError::ReadFailed {
        path: checksum_path.to_path_buf(),
        source: e,
    })?;
    let expected = expected.trim().to_lowercase();
    let actual = calculate_md5(catalog_path)?;

    if expected != actual {
        return Err(PublishError::ChecksumMismatch {
            file: catalog_path.to_path_buf(),
            expected,
            actual,
        });
    }

    Ok(actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_md5_known_vectors() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            md5_hex(b"The quick brown fox jumps over the lazy dog"),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
    }

    #[test]
    fn test_write_checksum_matches_file_bytes() {
        let temp = TempDir::new().unwrap();
        let catalog = temp.path().join("addons.xml");
        let checksum = temp.path().join("addons.xml.md5");
        fs::write(&catalog, "<addons>\n</addons>\n").unwrap();

        let digest = write_checksum(&catalog, &checksum).unwrap();

        assert_eq!(digest.len(), 32);
        assert_eq!(fs::read_to_string(&checksum).unwrap(), digest);
        assert_eq!(digest, md5_hex(&fs::read(&catalog).unwrap()));
    }

    #[test]
    fn test_verify_detects_change() {
        let temp = TempDir::new().unwrap();
        let catalog = temp.path().join("addons.xml");
        let checksum = temp.path().join("addons.xml.md5");
        fs::write(&catalog, "v1").unwrap();
        write_checksum(&catalog, &checksum).unwrap();

        assert!(verify_checksum(&catalog, &checksum).is_ok());

        fs::write(&catalog, "v2").unwrap();
        let result = verify_checksum(&catalog, &checksum);
        assert!(matches!(result, Err(PublishError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_write_checksum_missing_catalog() {
        let temp = TempDir::new().unwrap();
        let result = write_checksum(
            &temp.path().join("addons.xml"),
            &temp.path().join("addons.xml.md5"),
        );
        assert!(matches!(result, Err(PublishError::ReadFailed { .. })));
    }
}
