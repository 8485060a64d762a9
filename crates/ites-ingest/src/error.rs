//! Error types for dataset provisioning
//!
//! Every failure is fatal to the run. Variants carry the resource or
//! collection name plus the remote status and body where there is one.

use thiserror::Error;

/// Result type alias for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to fetch {resource}: HTTP {status} (content: {body})")]
    Fetch {
        resource: String,
        status: u16,
        body: String,
    },

    #[error("Malformed mapping template: {0}")]
    TemplateFormat(String),

    #[error("Bulk write to {collection} failed with HTTP {status} (content: {body})")]
    BulkWrite {
        collection: String,
        status: u16,
        body: String,
    },

    #[error("Collection '{collection}' has {observed} visible documents, expected at least {expected}")]
    VisibilityTimeout {
        collection: String,
        observed: u64,
        expected: u64,
    },

    #[error("{operation} failed with HTTP {status} (content: {body})")]
    Reconciliation {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Protocol test extraction failed: {0}")]
    Extraction(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Decode error in {resource}: {message}")]
    Decode { resource: String, message: String },

    #[error("Malformed record in {dataset}: {message}")]
    MalformedRecord { dataset: String, message: String },

    #[error("Checksum mismatch for {dataset}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        dataset: String,
        expected: String,
        actual: String,
    },

    #[error("Record count mismatch for {dataset}: expected {expected}, got {actual}")]
    CountMismatch {
        dataset: String,
        expected: usize,
        actual: usize,
    },

    #[error("No fingerprint registered for dataset '{0}'")]
    UnknownFingerprint(String),

    #[error("Fingerprint for dataset '{0}' already registered")]
    DuplicateFingerprint(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cluster unavailable: {0}")]
    ClusterUnavailable(String),
}

impl IngestError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(resource: impl Into<String>, message: impl std::fmt::Display) -> Self {
        IngestError::Decode {
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    pub fn malformed(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        IngestError::MalformedRecord {
            dataset: dataset.into(),
            message: message.into(),
        }
    }

    pub fn reconciliation(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        IngestError::Reconciliation {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }
}
