//! ITES Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Test-data provisioning for the search-engine integration harness: fetch
//! reference datasets, fingerprint them, and reconcile the target cluster's
//! collections with them according to an [`OperatingMode`].
//!
//! # Pipeline
//!
//! - [`fetcher`]: HTTP or offline-mirror retrieval of CSV, gzipped JSON-lines and mapping scripts
//! - [`normalize`]: CSV to sparse [`Document`]s, registering a [`Fingerprint`]
//! - [`bulk`]: newline-delimited bulk payloads, at most 500 documents each
//! - [`template`]: loose object-literal mapping scripts to strict JSON templates
//! - [`reconciler`]: per-dataset delete / template / pipeline / post / poll state machine
//! - [`proto_tests`]: protocol test cases scraped from a Java source file
//! - [`loader`]: the built-in catalog driven end to end
//!
//! # Example
//!
//! ```no_run
//! use ites_ingest::{LoaderConfig, OperatingMode, TestData};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LoaderConfig::from_env()?;
//!     let data = TestData::load(&config, OperatingMode::NoIndex).await?;
//!     let (hash, header, count) = data.csv_attributes("calcs")?;
//!     println!("calcs: {} {:?} {}", hash, header, count);
//!     Ok(())
//! }
//! ```

pub mod bulk;
pub mod catalog;
pub mod cluster;
pub mod collaborators;
pub mod config;
pub mod decompression;
pub mod error;
pub mod fetcher;
pub mod fingerprint;
pub mod loader;
pub mod mode;
pub mod models;
pub mod normalize;
pub mod reconciler;
pub mod template;

pub use bulk::{encode_batches, BulkInput, DEFAULT_BATCH_SIZE};
pub use cluster::SearchCluster;
pub use collaborators::{ClusterHandle, DriverInstaller, StagedCluster, VerificationData};
pub use config::{Auth, LoaderConfig};
pub use error::{IngestError, Result};
pub use fetcher::{Fetcher, Resource};
pub use fingerprint::{Fingerprint, FingerprintRegistry};
pub use loader::{run, TestData};
pub use mode::OperatingMode;
pub use models::{Document, ProtoTestCase};
pub use normalize::normalize_csv;
pub use proto_tests::extract_proto_tests;
pub use reconciler::{LoadOutcome, Reconciler};
pub use template::translate_template;
