//! Dataset fingerprints
//!
//! A fingerprint is recorded once per dataset when it is fetched and never
//! changes afterwards. The registry is owned by one run and handed to the
//! verification side when loading completes.

use crate::error::{IngestError, Result};
use ites_common::checksum::{compute_md5, verify_md5};
use ites_common::CommonError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Lowercase hex MD5 of the fetched text
    pub hash: String,
    /// Trimmed header cells, in file order
    pub header: Vec<String>,
    /// Data rows, header excluded
    pub count: usize,
}

/// Append-only map of dataset name to [`Fingerprint`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintRegistry {
    entries: BTreeMap<String, Fingerprint>,
}

impl FingerprintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dataset's fingerprint; a second registration under the same name fails
    pub fn register(&mut self, dataset: impl Into<String>, fingerprint: Fingerprint) -> Result<()> {
        let dataset = dataset.into();
        if self.entries.contains_key(&dataset) {
            return Err(IngestError::DuplicateFingerprint(dataset));
        }
        tracing::debug!(
            dataset = %dataset,
            hash = %fingerprint.hash,
            count = fingerprint.count,
            "Registered fingerprint"
        );
        self.entries.insert(dataset, fingerprint);
        Ok(())
    }

    /// Register `derived` with a copy of `source`'s fingerprint
    pub fn alias(&mut self, source: &str, derived: impl Into<String>) -> Result<()> {
        let fingerprint = self.get(source)?.clone();
        self.register(derived, fingerprint)
    }

    pub fn get(&self, dataset: &str) -> Result<&Fingerprint> {
        self.entries
            .get(dataset)
            .ok_or_else(|| IngestError::UnknownFingerprint(dataset.to_string()))
    }

    pub fn contains(&self, dataset: &str) -> bool {
        self.entries.contains_key(dataset)
    }

    /// `(hash, header, count)` for the verification component
    pub fn csv_attributes(&self, dataset: &str) -> Result<(String, Vec<String>, usize)> {
        let fp = self.get(dataset)?;
        Ok((fp.hash.clone(), fp.header.clone(), fp.count))
    }

    /// Hash reconstituted text and compare it to the recorded fingerprint
    pub fn verify(&self, dataset: &str, reconstituted: &str) -> Result<()> {
        let fp = self.get(dataset)?;
        verify_md5(&fp.hash, &compute_md5(reconstituted.as_bytes())).map_err(|err| match err {
            CommonError::ChecksumMismatch { expected, actual } => IngestError::ChecksumMismatch {
                dataset: dataset.to_string(),
                expected,
                actual,
            },
        })
    }

    pub fn verify_count(&self, dataset: &str, observed: usize) -> Result<()> {
        let fp = self.get(dataset)?;
        if fp.count != observed {
            return Err(IngestError::CountMismatch {
                dataset: dataset.to_string(),
                expected: fp.count,
                actual: observed,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fingerprint)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
