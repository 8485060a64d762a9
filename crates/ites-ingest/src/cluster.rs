//! Search cluster REST client
//!
//! Thin wrappers over the handful of endpoints provisioning needs. Each call
//! checks the status it expects and turns anything else into an error
//! carrying the status and (an excerpt of) the response body.

use crate::config::{Auth, LoaderConfig};
use crate::error::{IngestError, Result};
use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

const USER_AGENT: &str = "ITES-Data-Loader/1.0";
const BANNER: &str = "You Know, for Search";
const MAX_BODY_EXCERPT: usize = 4096;

/// Keep error bodies readable; bulk replies can be megabytes
pub fn excerpt(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((cut, _)) => format!("{}... ({} bytes total)", &body[..cut], body.len()),
        None => body.to_string(),
    }
}

/// Response body for an error report; a failed read is reported in its place
pub async fn response_body(response: Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => format!("<unreadable response body: {}>", e),
    }
}

pub struct SearchCluster {
    client: Client,
    base_url: String,
    auth: Option<Auth>,
}

impl SearchCluster {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.cluster_url.trim_end_matches('/').to_string(),
            auth: config.auth.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.client.request(method, url);
        match &self.auth {
            Some(Auth::Basic { user, password }) => builder.basic_auth(user, Some(password)),
            Some(Auth::ApiKey { id, key }) => {
                let token = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", id, key));
                builder.header(AUTHORIZATION, format!("ApiKey {}", token))
            },
            None => builder,
        }
    }

    async fn expect_ok(operation: String, response: Response) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(response);
        }
        let body = response_body(response).await;
        Err(IngestError::reconciliation(operation, status.as_u16(), excerpt(&body)))
    }

    /// `GET /` answers 200 with the engine banner
    pub async fn is_listening(&self) -> bool {
        let response = match self.request(Method::GET, "/").send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %self.base_url, error = %e, "Cluster not reachable");
                return false;
            },
        };
        if response.status() != StatusCode::OK {
            debug!(url = %self.base_url, status = response.status().as_u16(), "Cluster not ready");
            return false;
        }
        response
            .text()
            .await
            .map(|body| body.contains(BANNER))
            .unwrap_or(false)
    }

    pub async fn put_template(&self, name: &str, template: &Value) -> Result<()> {
        let response = self
            .request(Method::PUT, &format!("_template/{}", name))
            .json(template)
            .send()
            .await?;
        Self::expect_ok(format!("PUT template {}", name), response).await?;
        Ok(())
    }

    pub async fn put_pipeline(&self, name: &str, pipeline: &Value) -> Result<()> {
        let response = self
            .request(Method::PUT, &format!("_ingest/pipeline/{}", name))
            .json(pipeline)
            .send()
            .await?;
        Self::expect_ok(format!("PUT pipeline {}", name), response).await?;
        Ok(())
    }

    /// Delete any resource path; an absent target counts as deleted
    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::NOT_FOUND => {
                debug!(path = %path, status = status.as_u16(), "Deleted");
                Ok(())
            },
            _ => {
                let body = response_body(response).await;
                Err(IngestError::reconciliation(
                    format!("DELETE {}", path),
                    status.as_u16(),
                    excerpt(&body),
                ))
            },
        }
    }

    pub async fn delete_index(&self, name: &str) -> Result<()> {
        self.delete(name).await
    }

    pub async fn delete_template(&self, name: &str) -> Result<()> {
        self.delete(&format!("_template/{}", name)).await
    }

    pub async fn delete_pipeline(&self, name: &str) -> Result<()> {
        self.delete(&format!("_ingest/pipeline/{}", name)).await
    }

    /// Whether a collection exists (`HEAD /<name>`)
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let response = self.request(Method::HEAD, name).send().await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(IngestError::reconciliation(
                format!("HEAD {}", name),
                status.as_u16(),
                String::new(),
            )),
        }
    }

    /// Submit one newline-delimited bulk payload
    ///
    /// A 2xx reply whose body reports `"errors": true` is still a failure.
    pub async fn bulk(&self, collection: &str, payload: String, pipeline: Option<&str>) -> Result<()> {
        let mut builder = self
            .request(Method::POST, &format!("{}/_bulk", collection))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(payload);
        if let Some(pipeline) = pipeline {
            builder = builder.query(&[("pipeline", pipeline)]);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let bulk_error = || IngestError::BulkWrite {
            collection: collection.to_string(),
            status: status.as_u16(),
            body: excerpt(&body),
        };

        if !status.is_success() {
            return Err(bulk_error());
        }
        let reply: Value = serde_json::from_str(&body).map_err(|_| bulk_error())?;
        if reply.get("errors").and_then(Value::as_bool).unwrap_or(false) {
            return Err(bulk_error());
        }
        Ok(())
    }

    /// Total searchable documents in a collection
    pub async fn count(&self, collection: &str) -> Result<u64> {
        let response = self
            .request(Method::GET, &format!("{}/_search", collection))
            .send()
            .await?;
        let response = Self::expect_ok(format!("search {}", collection), response).await?;
        let reply: Value = response.json().await?;

        // 7.x reports {"value": n, "relation": ..}; older versions a bare number
        let total = &reply["hits"]["total"];
        total
            .get("value")
            .unwrap_or(total)
            .as_u64()
            .ok_or_else(|| {
                IngestError::reconciliation(
                    format!("search {}", collection),
                    StatusCode::OK.as_u16(),
                    excerpt(&reply.to_string()),
                )
            })
    }

    pub async fn create_index(&self, name: &str, body: &Value) -> Result<()> {
        let response = self.request(Method::PUT, name).json(body).send().await?;
        Self::expect_ok(format!("PUT index {}", name), response).await?;
        Ok(())
    }

    /// Server-side copy of every document from `source` into `dest`
    pub async fn reindex(&self, source: &str, dest: &str) -> Result<()> {
        let body = json!({ "source": { "index": source }, "dest": { "index": dest } });
        let response = self
            .request(Method::POST, "_reindex")
            .query(&[("wait_for_completion", "true")])
            .json(&body)
            .send()
            .await?;
        let operation = format!("reindex {} -> {}", source, dest);
        let response = Self::expect_ok(operation.clone(), response).await?;

        let reply: Value = response.json().await?;
        let failed = reply
            .get("failures")
            .and_then(Value::as_array)
            .is_some_and(|failures| !failures.is_empty());
        if failed {
            return Err(IngestError::reconciliation(
                operation,
                StatusCode::OK.as_u16(),
                excerpt(&reply.to_string()),
            ));
        }
        debug!(source = %source, dest = %dest, created = reply["created"].as_u64(), "Reindexed");
        Ok(())
    }
}
