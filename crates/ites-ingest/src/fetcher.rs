//! Resource retrieval from an offline mirror or over HTTP

use crate::cluster::response_body;
use crate::config::LoaderConfig;
use crate::decompression::{json_lines, maybe_decompress};
use crate::error::{IngestError, Result};
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use tracing::info;
use url::Url;

const USER_AGENT: &str = "ITES-Data-Loader/1.0";

/// A remote resource and the file name it has in an offline mirror
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub url: String,
    pub offline_name: String,
}

impl Resource {
    /// Resolve `path` against `base`; the mirror name is the last path segment
    pub fn new(base: &str, path: &str) -> Result<Self> {
        let url = Url::parse(base)
            .and_then(|base| base.join(path))
            .map_err(|e| IngestError::Config(format!("invalid resource {}{}: {}", base, path, e)))?;
        Self::from_parsed(url)
    }

    /// A resource addressed by its full URL
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| IngestError::Config(format!("invalid resource {}: {}", url, e)))?;
        Self::from_parsed(parsed)
    }

    fn from_parsed(url: Url) -> Result<Self> {
        let offline_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| IngestError::Config(format!("resource {} has no file name", url)))?
            .to_string();

        Ok(Self {
            url: url.to_string(),
            offline_name,
        })
    }

    /// Override the mirror file name, for resources whose last segment collides
    pub fn with_offline_name(mut self, name: impl Into<String>) -> Self {
        self.offline_name = name.into();
        self
    }
}

/// Fetches resources, each exactly as stored upstream
pub struct Fetcher {
    client: Client,
    offline_dir: Option<PathBuf>,
}

impl Fetcher {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            offline_dir: config.offline_dir.clone(),
        })
    }

    pub fn is_offline(&self) -> bool {
        self.offline_dir.is_some()
    }

    /// Raw bytes of a resource
    pub async fn fetch_bytes(&self, resource: &Resource) -> Result<Vec<u8>> {
        if let Some(dir) = &self.offline_dir {
            let path = dir.join(&resource.offline_name);
            info!("Loading {} from offline mirror: {}", resource.offline_name, path.display());
            let data = tokio::fs::read(&path)
                .await
                .map_err(|e| IngestError::io(path.display().to_string(), e))?;
            return Ok(data);
        }

        info!("Fetching {}", resource.url);
        let response = self.client.get(&resource.url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = response_body(response).await;
            return Err(IngestError::Fetch {
                resource: resource.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let data = response.bytes().await?.to_vec();
        info!("Fetched {}: {} bytes ({} KB)", resource.offline_name, data.len(), data.len() / 1024);
        Ok(data)
    }

    /// A UTF-8 text resource (CSV, mapping scripts, Java sources)
    pub async fn fetch_text(&self, resource: &Resource) -> Result<String> {
        let data = self.fetch_bytes(resource).await?;
        String::from_utf8(data).map_err(|e| IngestError::decode(&resource.offline_name, e))
    }

    /// A gzip-compressed JSON-lines resource, as its non-blank lines
    pub async fn fetch_json_lines(&self, resource: &Resource) -> Result<Vec<String>> {
        let data = self.fetch_bytes(resource).await?;
        let data = maybe_decompress(&resource.offline_name, data)?;
        let text =
            String::from_utf8(data).map_err(|e| IngestError::decode(&resource.offline_name, e))?;
        Ok(json_lines(&text))
    }
}
