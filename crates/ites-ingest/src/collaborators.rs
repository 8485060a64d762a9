//! Seams to the rest of the harness
//!
//! Cluster lifecycle and driver installation live outside this crate; the
//! loader only needs the few calls below. The verification suite consumes
//! loaded data through [`VerificationData`].

use crate::cluster::SearchCluster;
use crate::config::{Auth, LoaderConfig};
use crate::error::Result;
use crate::models::ProtoTestCase;
use async_trait::async_trait;

/// A running search cluster
#[async_trait]
pub trait ClusterHandle: Send + Sync {
    /// Whether the cluster answers requests
    async fn is_listening(&self) -> bool;

    fn base_url(&self) -> &str;

    fn credentials(&self) -> Option<Auth>;
}

/// Installs the client driver under test
#[async_trait]
pub trait DriverInstaller: Send + Sync {
    async fn install(&self, ephemeral: bool) -> Result<()>;
}

/// What the verification suite reads back after loading
pub trait VerificationData {
    /// `(hash, header, count)` recorded when the dataset was fetched
    fn csv_attributes(&self, dataset: &str) -> Result<(String, Vec<String>, usize)>;

    fn proto_tests(&self) -> &[ProtoTestCase];
}

/// A cluster started elsewhere and reached through the configured URL
pub struct StagedCluster {
    client: SearchCluster,
    auth: Option<Auth>,
}

impl StagedCluster {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        Ok(Self {
            client: SearchCluster::new(config)?,
            auth: config.auth.clone(),
        })
    }
}

#[async_trait]
impl ClusterHandle for StagedCluster {
    async fn is_listening(&self) -> bool {
        self.client.is_listening().await
    }

    fn base_url(&self) -> &str {
        self.client.base_url()
    }

    fn credentials(&self) -> Option<Auth> {
        self.auth.clone()
    }
}
