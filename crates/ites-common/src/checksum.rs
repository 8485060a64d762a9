//! MD5 content fingerprints
//!
//! Dataset fingerprints are lowercase hex MD5 digests of the raw bytes as
//! fetched. The verification side recomputes them over reconstituted text.

use crate::error::{CommonError, Result};

/// Digest an in-memory buffer
pub fn compute_md5(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Compare two hex digests, ignoring case
pub fn verify_md5(expected: &str, actual: &str) -> Result<()> {
    if expected.eq_ignore_ascii_case(actual) {
        Ok(())
    } else {
        Err(CommonError::ChecksumMismatch {
            expected: expected.to_lowercase(),
            actual: actual.to_lowercase(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_md5_known_values() {
        assert_eq!(compute_md5(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(compute_md5(b"Hello, world!"), "6cd3556deb0da54bca060b4c39479839");
    }

    #[test]
    fn test_verify_md5() {
        assert!(verify_md5("6CD3556DEB0DA54BCA060B4C39479839", "6cd3556deb0da54bca060b4c39479839").is_ok());

        let err = verify_md5("00", "6cd3556deb0da54bca060b4c39479839").unwrap_err();
        assert!(matches!(err, CommonError::ChecksumMismatch { ref expected, .. } if expected == "00"));
    }
}
