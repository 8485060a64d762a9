//! CSV to sparse documents
//!
//! The first row names the fields. Each later row becomes a [`Document`]
//! holding only its non-empty cells. Rows are read one at a time from the
//! fetched text; nothing is rewritten up front.

use crate::error::{IngestError, Result};
use crate::fingerprint::{Fingerprint, FingerprintRegistry};
use crate::models::Document;
use ites_common::checksum::compute_md5;
use tracing::debug;

/// Parse `text` into documents and register the dataset's fingerprint
///
/// Header cells are trimmed, so `"a","b "` yields fields `a` and `b`. Rows
/// shorter than the header simply lack the trailing fields; rows wider than
/// the header are rejected.
pub fn normalize_csv(
    dataset: &str,
    text: &str,
    registry: &mut FingerprintRegistry,
) -> Result<Vec<Document>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b',')
        .quote(b'"')
        .from_reader(text.as_bytes());

    let mut records = reader.records();

    let header: Vec<String> = match records.next() {
        Some(row) => row?.iter().map(|cell| cell.trim().to_string()).collect(),
        None => return Err(IngestError::malformed(dataset, "missing header row")),
    };

    let mut docs = Vec::new();
    for row in records {
        let row = row?;
        if row.len() > header.len() {
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            return Err(IngestError::malformed(
                dataset,
                format!(
                    "line {} has {} fields, header has {}",
                    line,
                    row.len(),
                    header.len()
                ),
            ));
        }
        docs.push(header.iter().zip(row.iter()).collect::<Document>());
    }

    debug!(dataset = %dataset, rows = docs.len(), fields = header.len(), "Normalized CSV");

    registry.register(
        dataset,
        Fingerprint {
            hash: compute_md5(text.as_bytes()),
            header,
            count: docs.len(),
        },
    )?;

    Ok(docs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sparse_documents() {
        let mut registry = FingerprintRegistry::new();
        let text = "a,b\n1,\n,2\n3,3";
        let docs = normalize_csv("ds", text, &mut registry).unwrap();

        assert_eq!(docs.len(), 3);
        assert_eq!(serde_json::to_string(&docs[0]).unwrap(), r#"{"a":"1"}"#);
        assert_eq!(serde_json::to_string(&docs[1]).unwrap(), r#"{"b":"2"}"#);
        assert_eq!(serde_json::to_string(&docs[2]).unwrap(), r#"{"a":"3","b":"3"}"#);

        let fp = registry.get("ds").unwrap();
        assert_eq!(fp.header, vec!["a", "b"]);
        assert_eq!(fp.count, 3);
        assert_eq!(fp.hash, compute_md5(text.as_bytes()));
    }

    #[test]
    fn test_header_whitespace_trimmed() {
        let mut registry = FingerprintRegistry::new();
        let docs = normalize_csv("ds", "\"key\",\"zzz \"\n\"k1\",\"z\"\n", &mut registry).unwrap();
        assert_eq!(docs[0].get("zzz"), Some("z"));
        assert_eq!(registry.get("ds").unwrap().header, vec!["key", "zzz"]);
    }

    #[test]
    fn test_quoted_commas_and_short_rows() {
        let mut registry = FingerprintRegistry::new();
        let docs = normalize_csv("ds", "name,city,zip\n\"Doe, J\",Paris\n", &mut registry).unwrap();
        assert_eq!(docs[0].get("name"), Some("Doe, J"));
        assert_eq!(docs[0].get("zip"), None);
        assert_eq!(docs[0].len(), 2);
    }

    #[test]
    fn test_wide_row_rejected() {
        let mut registry = FingerprintRegistry::new();
        let err = normalize_csv("ds", "a,b\n1,2,3\n", &mut registry).unwrap_err();
        assert!(matches!(err, IngestError::MalformedRecord { .. }));
        assert!(!registry.contains("ds"));
    }

    #[test]
    fn test_empty_input_rejected() {
        let mut registry = FingerprintRegistry::new();
        assert!(matches!(
            normalize_csv("ds", "", &mut registry),
            Err(IngestError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_header_only() {
        let mut registry = FingerprintRegistry::new();
        let docs = normalize_csv("ds", "a,b\n", &mut registry).unwrap();
        assert!(docs.is_empty());
        assert_eq!(registry.get("ds").unwrap().count, 0);
    }

    #[test]
    fn test_blank_lines_are_not_records() {
        let mut registry = FingerprintRegistry::new();
        let text = "a,b\n1,2\n\n3,4\n";
        let docs = normalize_csv("ds", text, &mut registry).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].get("a"), Some("3"));
        let fp = registry.get("ds").unwrap();
        assert_eq!(fp.count, 2);
        assert_eq!(fp.hash, compute_md5(text.as_bytes()));
    }

    fn table() -> impl Strategy<Value = (usize, Vec<Vec<String>>)> {
        (2usize..6).prop_flat_map(|width| {
            (
                Just(width),
                prop::collection::vec(prop::collection::vec("[a-z0-9]{0,3}", width), 0..40),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_documents_omit_empty_cells((width, rows) in table()) {
            let header: Vec<String> = (0..width).map(|i| format!("c{}", i)).collect();
            let mut lines = vec![header.join(",")];
            lines.extend(rows.iter().map(|row| row.join(",")));
            let text = lines.join("\n");

            let mut registry = FingerprintRegistry::new();
            let docs = normalize_csv("ds", &text, &mut registry).unwrap();

            prop_assert_eq!(docs.len(), rows.len());
            prop_assert_eq!(registry.get("ds").unwrap().count, rows.len());
            for (doc, row) in docs.iter().zip(&rows) {
                prop_assert!(doc.fields().all(|(_, value)| !value.is_empty()));
                for (field, cell) in header.iter().zip(row) {
                    let expected = if cell.is_empty() { None } else { Some(cell.as_str()) };
                    prop_assert_eq!(doc.get(field), expected);
                }
            }
        }
    }
}
