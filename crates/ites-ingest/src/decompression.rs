//! Gzip handling for compressed JSON-lines resources

use crate::error::{IngestError, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Decompress gzip-compressed bytes
pub fn decompress_gzip(resource: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| IngestError::decode(resource, format!("gzip: {}", e)))?;
    debug!(resource = %resource, "Decompressed {} -> {} bytes", data.len(), decompressed.len());
    Ok(decompressed)
}

/// Decompress when the gzip magic is present, otherwise pass bytes through
///
/// Mirrors sometimes hold the already-inflated file under the `.gz` name.
pub fn maybe_decompress(resource: &str, data: Vec<u8>) -> Result<Vec<u8>> {
    if is_gzip(&data) {
        decompress_gzip(resource, &data)
    } else {
        Ok(data)
    }
}

/// Split decoded text into its non-blank lines
pub fn json_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decompress_gzip() {
        let compressed = gzip(b"{\"a\":1}\n{\"a\":2}\n");
        assert!(is_gzip(&compressed));
        let out = decompress_gzip("flights.json.gz", &compressed).unwrap();
        assert_eq!(out, b"{\"a\":1}\n{\"a\":2}\n");
    }

    #[test]
    fn test_corrupt_gzip() {
        let mut compressed = gzip(b"payload payload payload");
        compressed.truncate(12);
        assert!(matches!(
            decompress_gzip("x.gz", &compressed),
            Err(IngestError::Decode { .. })
        ));
    }

    #[test]
    fn test_maybe_decompress_passthrough() {
        let plain = b"{\"a\":1}\n".to_vec();
        assert_eq!(maybe_decompress("x.gz", plain.clone()).unwrap(), plain);
    }

    #[test]
    fn test_json_lines_drops_blanks() {
        let lines = json_lines("{\"a\":1}\r\n\n  \n{\"a\":2}");
        assert_eq!(lines, vec!["{\"a\":1}", "{\"a\":2}"]);
    }
}
