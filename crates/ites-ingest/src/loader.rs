//! Run orchestration
//!
//! Loads the protocol test cases and every built-in dataset for one run, and
//! owns the resulting fingerprints.

use crate::catalog::{builtin_datasets, DatasetSpec, PROTO_TEST_FUNCTION};
use crate::cluster::SearchCluster;
use crate::collaborators::{ClusterHandle, DriverInstaller, VerificationData};
use crate::config::LoaderConfig;
use crate::error::{IngestError, Result};
use crate::fetcher::{Fetcher, Resource};
use crate::fingerprint::FingerprintRegistry;
use crate::mode::OperatingMode;
use crate::models::ProtoTestCase;
use crate::proto_tests::extract_proto_tests;
use crate::reconciler::{LoadOutcome, Reconciler};
use tracing::info;

/// Everything a run loaded
#[derive(Debug)]
pub struct TestData {
    mode: OperatingMode,
    registry: FingerprintRegistry,
    proto_tests: Vec<ProtoTestCase>,
    outcomes: Vec<(String, LoadOutcome)>,
}

impl TestData {
    /// Load the built-in catalog
    pub async fn load(config: &LoaderConfig, mode: OperatingMode) -> Result<Self> {
        let datasets = builtin_datasets(config)?;
        Self::load_datasets(config, mode, &datasets).await
    }

    /// Load protocol test cases, then `datasets` in order
    pub async fn load_datasets(
        config: &LoaderConfig,
        mode: OperatingMode,
        datasets: &[DatasetSpec],
    ) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(config)?;
        let cluster = SearchCluster::new(config)?;

        info!(mode = %mode, offline = fetcher.is_offline(), "Loading test data");

        let proto_source = Resource::from_url(&config.proto_tests_url)?;
        let source = fetcher.fetch_text(&proto_source).await?;
        let proto_tests = extract_proto_tests(&source, PROTO_TEST_FUNCTION)?;
        info!(count = proto_tests.len(), "Loaded protocol tests");

        let reconciler = Reconciler::new(&fetcher, &cluster, config, mode);
        let mut registry = FingerprintRegistry::new();
        let mut outcomes = Vec::with_capacity(datasets.len());

        for (i, spec) in datasets.iter().enumerate() {
            info!("Dataset {}/{}: {}", i + 1, datasets.len(), spec.name);
            let outcome = reconciler.load_dataset(spec, &mut registry).await?;
            outcomes.push((spec.name.clone(), outcome));
        }

        info!(mode = %mode, fingerprints = registry.len(), "Test data loaded");

        Ok(Self {
            mode,
            registry,
            proto_tests,
            outcomes,
        })
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn csv_attributes(&self, dataset: &str) -> Result<(String, Vec<String>, usize)> {
        self.registry.csv_attributes(dataset)
    }

    /// Whether any dataset was fingerprinted (false in `NoData` runs)
    pub fn has_csv_attributes(&self) -> bool {
        !self.registry.is_empty()
    }

    pub fn proto_tests(&self) -> &[ProtoTestCase] {
        &self.proto_tests
    }

    pub fn fingerprints(&self) -> &FingerprintRegistry {
        &self.registry
    }

    pub fn outcomes(&self) -> &[(String, LoadOutcome)] {
        &self.outcomes
    }
}

impl VerificationData for TestData {
    fn csv_attributes(&self, dataset: &str) -> Result<(String, Vec<String>, usize)> {
        TestData::csv_attributes(self, dataset)
    }

    fn proto_tests(&self) -> &[ProtoTestCase] {
        TestData::proto_tests(self)
    }
}

/// Check the cluster, load test data, then install the driver if one is given
///
/// The cluster handle's address and credentials replace the configured ones.
pub async fn run(
    cluster: &dyn ClusterHandle,
    installer: Option<&dyn DriverInstaller>,
    config: &LoaderConfig,
    mode: OperatingMode,
    ephemeral: bool,
) -> Result<TestData> {
    if mode.performs_writes() && !cluster.is_listening().await {
        return Err(IngestError::ClusterUnavailable(format!(
            "no running cluster found at {}",
            cluster.base_url()
        )));
    }

    let mut config = config.clone();
    config.cluster_url = cluster.base_url().to_string();
    if let Some(auth) = cluster.credentials() {
        config.auth = Some(auth);
    }

    let data = TestData::load(&config, mode).await?;

    if let Some(installer) = installer {
        info!(ephemeral, "Installing driver");
        installer.install(ephemeral).await?;
    }

    Ok(data)
}
