//! Bulk payload encoding
//!
//! A payload is a run of `action\ndocument\n` line pairs. The action line is
//! identical for every document of a collection, so it is serialized once.
//! No I/O happens here.

use crate::error::{IngestError, Result};
use crate::models::Document;
use serde_json::json;

/// Maximum documents per bulk request
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Documents to encode
#[derive(Debug, Clone, Copy)]
pub enum BulkInput<'a> {
    /// Records that still need JSON serialization
    Documents(&'a [Document]),
    /// Lines that are already JSON documents, emitted verbatim
    Serialized(&'a [String]),
}

impl BulkInput<'_> {
    pub fn len(&self) -> usize {
        match self {
            BulkInput::Documents(docs) => docs.len(),
            BulkInput::Serialized(lines) => lines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The `{"index":{"_index":...}}` action line for a collection
pub fn action_line(collection: &str) -> Result<String> {
    Ok(serde_json::to_string(&json!({ "index": { "_index": collection } }))?)
}

/// Split `input` into payloads of at most `batch_size` documents
///
/// Always returns a list: empty for empty input, one element when everything
/// fits in a single batch.
pub fn encode_batches(
    collection: &str,
    input: BulkInput<'_>,
    batch_size: usize,
) -> Result<Vec<String>> {
    if batch_size == 0 {
        return Err(IngestError::Config("batch_size must be greater than 0".into()));
    }

    let action = action_line(collection)?;

    match input {
        BulkInput::Documents(docs) => docs
            .chunks(batch_size)
            .map(|chunk| -> Result<String> {
                let mut payload = String::new();
                for doc in chunk {
                    push_pair(&mut payload, &action, &serde_json::to_string(doc)?);
                }
                Ok(payload)
            })
            .collect(),
        BulkInput::Serialized(lines) => Ok(lines
            .chunks(batch_size)
            .map(|chunk| {
                let mut payload = String::new();
                for line in chunk {
                    push_pair(&mut payload, &action, line);
                }
                payload
            })
            .collect()),
    }
}

fn push_pair(payload: &mut String, action: &str, doc: &str) {
    payload.push_str(action);
    payload.push('\n');
    payload.push_str(doc);
    payload.push('\n');
}
