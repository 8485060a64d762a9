//! Per-dataset reconciliation
//!
//! Drives one dataset through
//!
//! ```text
//! Fetched -> [mode <= NoIndex: done]
//!         -> MaybeDeleted -> TemplateApplied -> PipelineApplied? -> Posted -> Visible
//! ```
//!
//! gated by the [`OperatingMode`]. Every step is awaited in order; any failure
//! aborts the dataset and, through the caller, the run.

use crate::bulk::{encode_batches, BulkInput};
use crate::catalog::{DatasetSource, DatasetSpec};
use crate::cluster::SearchCluster;
use crate::config::LoaderConfig;
use crate::error::{IngestError, Result};
use crate::fetcher::Fetcher;
use crate::fingerprint::FingerprintRegistry;
use crate::mode::OperatingMode;
use crate::models::Document;
use crate::normalize::normalize_csv;
use crate::template::translate_template;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// How far a dataset got
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Mode excludes datasets
    Skipped,
    /// Fetched and fingerprinted, cluster untouched
    Fetched { documents: usize },
    /// Posted (or copied) and searchable
    Loaded { documents: usize, visible: u64 },
    /// Collection already existed and was left as is
    Reused { visible: u64 },
}

/// Fetched content, ready to be written
enum Staged {
    Documents(Vec<Document>),
    Lines(Vec<String>),
    Derived { source: String, schema: Value },
}

impl Staged {
    fn len(&self, registry: &FingerprintRegistry, name: &str) -> usize {
        match self {
            Staged::Documents(docs) => docs.len(),
            Staged::Lines(lines) => lines.len(),
            Staged::Derived { .. } => registry.get(name).map(|fp| fp.count).unwrap_or_default(),
        }
    }
}

pub struct Reconciler<'a> {
    fetcher: &'a Fetcher,
    cluster: &'a SearchCluster,
    mode: OperatingMode,
    batch_size: usize,
    min_visible_docs: u64,
    poll_interval: Duration,
    visibility_timeout: Duration,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        fetcher: &'a Fetcher,
        cluster: &'a SearchCluster,
        config: &LoaderConfig,
        mode: OperatingMode,
    ) -> Self {
        Self {
            fetcher,
            cluster,
            mode,
            batch_size: config.batch_size,
            min_visible_docs: config.min_visible_docs,
            poll_interval: config.poll_interval(),
            visibility_timeout: config.request_timeout(),
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Bring one dataset's collection in line with the mode
    pub async fn load_dataset(
        &self,
        spec: &DatasetSpec,
        registry: &mut FingerprintRegistry,
    ) -> Result<LoadOutcome> {
        let name = spec.name.as_str();
        if !self.mode.performs_fetch() {
            debug!(dataset = %name, mode = %self.mode, "Skipping dataset");
            return Ok(LoadOutcome::Skipped);
        }

        let (staged, template) = self.fetch(spec, registry).await?;
        let documents = staged.len(registry, name);
        info!(dataset = %name, documents, "Fetched");

        if !self.mode.performs_writes() {
            return Ok(LoadOutcome::Fetched { documents });
        }

        if self.mode.performs_destructive_reset() {
            self.delete_previous(spec, template.is_some()).await?;
            info!(dataset = %name, "Deleted previous state");
        }

        if let Some(template) = &template {
            self.cluster.put_template(&spec.template_name(), template).await?;
            info!(dataset = %name, template = %spec.template_name(), "Template applied");
        }
        if let Some(pipeline) = &spec.pipeline {
            self.cluster.put_pipeline(&spec.pipeline_name(), pipeline).await?;
            info!(dataset = %name, pipeline = %spec.pipeline_name(), "Pipeline applied");
        }

        if self.mode.reuses_existing() && self.cluster.exists(name).await? {
            info!(dataset = %name, "Collection exists, not posting");
            let visible = self.wait_for_visibility(name, self.min_visible_docs).await?;
            return Ok(LoadOutcome::Reused { visible });
        }

        let written = match &staged {
            Staged::Documents(docs) => {
                self.post(spec, BulkInput::Documents(docs)).await?
            },
            Staged::Lines(lines) => self.post(spec, BulkInput::Serialized(lines)).await?,
            Staged::Derived { source, schema } => {
                self.cluster.create_index(name, schema).await?;
                self.cluster.reindex(source, name).await?;
                info!(dataset = %name, source = %source, "Copied from source collection");
                documents
            },
        };

        if written == 0 {
            return Ok(LoadOutcome::Loaded {
                documents: 0,
                visible: 0,
            });
        }

        let threshold = self.min_visible_docs.min(written as u64);
        let visible = self.wait_for_visibility(name, threshold).await?;
        info!(dataset = %name, visible, "Visible");

        Ok(LoadOutcome::Loaded {
            documents: written,
            visible,
        })
    }

    async fn fetch(
        &self,
        spec: &DatasetSpec,
        registry: &mut FingerprintRegistry,
    ) -> Result<(Staged, Option<Value>)> {
        match &spec.source {
            DatasetSource::Csv(resource) => {
                let text = self.fetcher.fetch_text(resource).await?;
                let docs = normalize_csv(&spec.name, &text, registry)?;
                Ok((Staged::Documents(docs), spec.template.clone()))
            },
            DatasetSource::JsonLines { data, mappings } => {
                let lines = self.fetcher.fetch_json_lines(data).await?;
                let template = match &spec.template {
                    Some(template) => template.clone(),
                    None => {
                        let script = self.fetcher.fetch_text(mappings).await?;
                        translate_template(&script, &spec.name)?
                    },
                };
                Ok((Staged::Lines(lines), Some(template)))
            },
            DatasetSource::Derived { source, schema } => {
                registry.alias(source, spec.name.as_str())?;
                Ok((
                    Staged::Derived {
                        source: source.clone(),
                        schema: schema.clone(),
                    },
                    spec.template.clone(),
                ))
            },
        }
    }

    async fn delete_previous(&self, spec: &DatasetSpec, has_template: bool) -> Result<()> {
        self.cluster.delete_index(&spec.name).await?;
        if has_template {
            self.cluster.delete_template(&spec.template_name()).await?;
        }
        if spec.pipeline.is_some() {
            self.cluster.delete_pipeline(&spec.pipeline_name()).await?;
        }
        Ok(())
    }

    /// Post every batch in order, stopping at the first failure
    async fn post(&self, spec: &DatasetSpec, input: BulkInput<'_>) -> Result<usize> {
        let batches = encode_batches(&spec.name, input, self.batch_size)?;
        let pipeline = spec.pipeline.as_ref().map(|_| spec.pipeline_name());
        let total = batches.len();

        for (i, payload) in batches.into_iter().enumerate() {
            debug!(dataset = %spec.name, batch = i + 1, total, bytes = payload.len(), "Posting batch");
            self.cluster
                .bulk(&spec.name, payload, pipeline.as_deref())
                .await?;
        }

        info!(dataset = %spec.name, documents = input.len(), batches = total, "Posted");
        Ok(input.len())
    }

    /// Poll the collection's count until it reaches `threshold`
    pub async fn wait_for_visibility(&self, collection: &str, threshold: u64) -> Result<u64> {
        let deadline = Instant::now() + self.visibility_timeout;
        loop {
            let observed = self.cluster.count(collection).await?;
            debug!(collection = %collection, observed, threshold, "Polled document count");
            if observed >= threshold {
                return Ok(observed);
            }
            if Instant::now() >= deadline {
                return Err(IngestError::VisibilityTimeout {
                    collection: collection.to_string(),
                    observed,
                    expected: threshold,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
