//! Loader configuration
//!
//! Cluster address, credentials, offline mirror, timeouts and the upstream
//! dataset locations. Built from `ITES_*` variables or programmatically.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_CLUSTER_URL: &str = "http://localhost:9200";
pub const DEFAULT_USER: &str = "elastic";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_MIN_VISIBLE_DOCS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

pub const DEFAULT_TABLEAU_BASE_URL: &str = "https://raw.githubusercontent.com/elastic/connector-plugin-sdk/120fe213c4bce30d9424c155fbd9b2ad210239e0/tests/datasets/TestV1/";
pub const DEFAULT_ES_DATASET_BASE_URL: &str = "https://raw.githubusercontent.com/elastic/elasticsearch/6857d305270be3d987689fda37cc84b7bc18fbb3/x-pack/plugin/sql/qa/src/main/resources/";
pub const DEFAULT_KIBANA_BASE_URL: &str = "https://raw.githubusercontent.com/elastic/kibana/7.4/src/legacy/server/sample_data/data_sets/";
pub const DEFAULT_PROTO_TESTS_URL: &str = "https://raw.githubusercontent.com/elastic/elasticsearch/6857d305270be3d987689fda37cc84b7bc18fbb3/x-pack/plugin/sql/qa/src/main/java/org/elasticsearch/xpack/sql/qa/SqlProtocolTestCase.java";

/// Credentials sent with every cluster request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Auth {
    Basic { user: String, password: String },
    ApiKey { id: String, key: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Search cluster base URL
    pub cluster_url: String,

    pub auth: Option<Auth>,

    /// Local mirror consulted instead of the network when set
    pub offline_dir: Option<PathBuf>,

    /// Per-request timeout, also the visibility wait budget
    pub request_timeout_secs: u64,

    /// Maximum documents per bulk payload
    pub batch_size: usize,

    /// Documents that must be searchable before a load counts as done
    pub min_visible_docs: u64,

    pub poll_interval_ms: u64,

    pub tableau_base_url: String,
    pub es_dataset_base_url: String,
    pub kibana_base_url: String,
    pub proto_tests_url: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cluster_url: DEFAULT_CLUSTER_URL.to_string(),
            auth: None,
            offline_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            batch_size: crate::bulk::DEFAULT_BATCH_SIZE,
            min_visible_docs: DEFAULT_MIN_VISIBLE_DOCS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            tableau_base_url: DEFAULT_TABLEAU_BASE_URL.to_string(),
            es_dataset_base_url: DEFAULT_ES_DATASET_BASE_URL.to_string(),
            kibana_base_url: DEFAULT_KIBANA_BASE_URL.to_string(),
            proto_tests_url: DEFAULT_PROTO_TESTS_URL.to_string(),
        }
    }
}

fn env_parse<T: FromStr>(name: &str, fallback: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| IngestError::Config(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(fallback),
    }
}

impl LoaderConfig {
    /// Load configuration from `ITES_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("ITES_URL") {
            config.cluster_url = url;
        }
        if let Ok(dir) = std::env::var("ITES_OFFLINE_DIR") {
            if !dir.is_empty() {
                config.offline_dir = Some(PathBuf::from(dir));
            }
        }

        let key_id = std::env::var("ITES_API_KEY_ID").ok();
        let key = std::env::var("ITES_API_KEY").ok();
        let user = std::env::var("ITES_USER").ok();
        let password = std::env::var("ITES_PASSWORD").ok();

        config.auth = match (key_id, key) {
            (None, None) if user.is_some() || password.is_some() => Some(Auth::Basic {
                user: user.unwrap_or_else(|| DEFAULT_USER.to_string()),
                password: password.unwrap_or_default(),
            }),
            (None, None) => None,
            (id, key) => Some(Auth::ApiKey {
                id: id.unwrap_or_default(),
                key: key.unwrap_or_default(),
            }),
        };

        config.request_timeout_secs =
            env_parse("ITES_REQUEST_TIMEOUT_SECS", config.request_timeout_secs)?;
        config.batch_size = env_parse("ITES_BATCH_SIZE", config.batch_size)?;
        config.min_visible_docs = env_parse("ITES_MIN_VISIBLE_DOCS", config.min_visible_docs)?;
        config.poll_interval_ms = env_parse("ITES_POLL_INTERVAL_MS", config.poll_interval_ms)?;

        if let Ok(url) = std::env::var("ITES_TABLEAU_BASE_URL") {
            config.tableau_base_url = url;
        }
        if let Ok(url) = std::env::var("ITES_ES_DATASET_BASE_URL") {
            config.es_dataset_base_url = url;
        }
        if let Ok(url) = std::env::var("ITES_KIBANA_BASE_URL") {
            config.kibana_base_url = url;
        }
        if let Ok(url) = std::env::var("ITES_PROTO_TESTS_URL") {
            config.proto_tests_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(IngestError::Config("request_timeout_secs must be greater than 0".into()));
        }
        if self.batch_size == 0 {
            return Err(IngestError::Config("batch_size must be greater than 0".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(IngestError::Config("poll_interval_ms must be greater than 0".into()));
        }

        for (name, value) in [
            ("cluster_url", &self.cluster_url),
            ("tableau_base_url", &self.tableau_base_url),
            ("es_dataset_base_url", &self.es_dataset_base_url),
            ("kibana_base_url", &self.kibana_base_url),
            ("proto_tests_url", &self.proto_tests_url),
        ] {
            if value.trim().is_empty() {
                return Err(IngestError::Config(format!("{} cannot be empty", name)));
            }
            url::Url::parse(value)
                .map_err(|e| IngestError::Config(format!("{} is not a valid URL: {}", name, e)))?;
        }

        if let Some(Auth::ApiKey { id, key }) = &self.auth {
            if id.is_empty() || key.is_empty() {
                return Err(IngestError::Config(
                    "API key authentication needs both ITES_API_KEY_ID and ITES_API_KEY".into(),
                ));
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Builder for [`LoaderConfig`]
#[derive(Default)]
pub struct LoaderConfigBuilder {
    config: LoaderConfig,
}

impl LoaderConfigBuilder {
    pub fn cluster_url(mut self, url: impl Into<String>) -> Self {
        self.config.cluster_url = url.into();
        self
    }

    pub fn basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.auth = Some(Auth::Basic {
            user: user.into(),
            password: password.into(),
        });
        self
    }

    pub fn api_key(mut self, id: impl Into<String>, key: impl Into<String>) -> Self {
        self.config.auth = Some(Auth::ApiKey {
            id: id.into(),
            key: key.into(),
        });
        self
    }

    pub fn offline_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.offline_dir = Some(dir.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn min_visible_docs(mut self, docs: u64) -> Self {
        self.config.min_visible_docs = docs;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Point every upstream dataset location at one host, e.g. a mock server
    pub fn upstream_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        let base = base.trim_end_matches('/');
        self.config.tableau_base_url = format!("{}/tableau/", base);
        self.config.es_dataset_base_url = format!("{}/es/", base);
        self.config.kibana_base_url = format!("{}/kibana/", base);
        self.config.proto_tests_url = format!("{}/proto/SqlProtocolTestCase.java", base);
        self
    }

    pub fn build(self) -> Result<LoaderConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "ITES_URL",
        "ITES_USER",
        "ITES_PASSWORD",
        "ITES_API_KEY_ID",
        "ITES_API_KEY",
        "ITES_OFFLINE_DIR",
        "ITES_REQUEST_TIMEOUT_SECS",
        "ITES_BATCH_SIZE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = LoaderConfig::default();
        assert_eq!(config.cluster_url, DEFAULT_CLUSTER_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(20));
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.min_visible_docs, 10);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_basic_auth() {
        clear_env();
        std::env::set_var("ITES_URL", "http://es.example.com:9200");
        std::env::set_var("ITES_PASSWORD", "changeme");
        std::env::set_var("ITES_OFFLINE_DIR", "/tmp/mirror");
        std::env::set_var("ITES_BATCH_SIZE", "100");

        let config = LoaderConfig::from_env().unwrap();
        assert_eq!(config.cluster_url, "http://es.example.com:9200");
        assert_eq!(
            config.auth,
            Some(Auth::Basic {
                user: "elastic".into(),
                password: "changeme".into()
            })
        );
        assert_eq!(config.offline_dir, Some(PathBuf::from("/tmp/mirror")));
        assert_eq!(config.batch_size, 100);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_half_api_key_rejected() {
        clear_env();
        std::env::set_var("ITES_API_KEY_ID", "key-id");

        assert!(matches!(LoaderConfig::from_env(), Err(IngestError::Config(_))));

        std::env::set_var("ITES_API_KEY", "secret");
        let config = LoaderConfig::from_env().unwrap();
        assert!(matches!(config.auth, Some(Auth::ApiKey { .. })));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_bad_number() {
        clear_env();
        std::env::set_var("ITES_REQUEST_TIMEOUT_SECS", "soon");
        assert!(matches!(LoaderConfig::from_env(), Err(IngestError::Config(_))));
        clear_env();
    }

    #[test]
    fn test_builder_validation() {
        assert!(LoaderConfig::builder().batch_size(0).build().is_err());
        assert!(LoaderConfig::builder().poll_interval_ms(0).build().is_err());
        assert!(LoaderConfig::builder().cluster_url("").build().is_err());

        let config = LoaderConfig::builder()
            .cluster_url("http://127.0.0.1:1234")
            .upstream_base_url("http://127.0.0.1:5678/")
            .api_key("id", "key")
            .build()
            .unwrap();
        assert_eq!(config.tableau_base_url, "http://127.0.0.1:5678/tableau/");
        assert_eq!(config.proto_tests_url, "http://127.0.0.1:5678/proto/SqlProtocolTestCase.java");
    }
}
