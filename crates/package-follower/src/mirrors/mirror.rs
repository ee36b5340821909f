//! Registry-backed import capability

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::{header, Client, StatusCode};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{PackageRecord, PackageSink, RegistrySource};
use crate::config::DEFAULT_MIRROR_CONCURRENCY;
use crate::error::ImportError;
use crate::import::{ImportCapability, ImportStats};

/// Mirrors package metadata from one upstream registry into the knowledge store
pub struct RegistryMirror {
    source: RegistrySource,
    client: Client,
    base_url: String,
    sink: Arc<dyn PackageSink>,
    concurrency: usize,
}

impl RegistryMirror {
    pub fn new(
        source: RegistrySource,
        client: Client,
        base_url: impl Into<String>,
        sink: Arc<dyn PackageSink>,
    ) -> Self {
        Self {
            source,
            client,
            base_url: base_url.into(),
            sink,
            concurrency: DEFAULT_MIRROR_CONCURRENCY,
        }
    }

    /// Maximum registry requests in flight during a batch import
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch one package document and turn it into a record
    pub async fn fetch(&self, name: &str) -> Result<PackageRecord, ImportError> {
        let name = name.trim();
        let url = self.source.document_url(&self.base_url, name)?;
        debug!(registry = %self.source, url = %url, "Fetching package document");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| ImportError::Fetch {
                name: name.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => {},
            StatusCode::NOT_FOUND => {
                return Err(ImportError::NotFound {
                    ecosystem: self.source.ecosystem().to_string(),
                    name: name.to_string(),
                });
            },
            status => {
                return Err(ImportError::Status {
                    name: name.to_string(),
                    status: status.as_u16(),
                });
            },
        }

        let document: serde_json::Value =
            response.json().await.map_err(|source| ImportError::Fetch {
                name: name.to_string(),
                source,
            })?;

        Ok(PackageRecord {
            ecosystem: self.source.ecosystem().to_string(),
            name: name.to_string(),
            latest_version: self.source.latest_version(name, &document)?,
            metadata: document,
            imported_at: Utc::now(),
        })
    }

    async fn import_one(&self, name: &str) -> Result<(), ImportError> {
        let record = self.fetch(name).await?;
        self.sink.upsert_batch(std::slice::from_ref(&record)).await?;
        Ok(())
    }
}

/// Names in first-seen order without repeats
fn distinct(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

#[async_trait]
impl ImportCapability for RegistryMirror {
    fn ecosystem(&self) -> &str {
        self.source.ecosystem()
    }

    /// Fetch every distinct name, then write them in one transaction.
    ///
    /// The first fetch error aborts the batch before anything is written.
    async fn batch_import(&self, names: &[String]) -> Result<ImportStats, ImportError> {
        let unique = distinct(names);

        let mut stats = ImportStats::start(unique.len());
        if unique.is_empty() {
            return Ok(stats.complete());
        }

        let records: Vec<PackageRecord> = stream::iter(unique)
            .map(|name| async move { self.fetch(&name).await })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await
            .map_err(|e| ImportError::Batch(e.to_string()))?;

        stats.imported = self
            .sink
            .upsert_batch(&records)
            .await
            .map_err(|e| ImportError::Batch(e.to_string()))?;

        Ok(stats.complete())
    }

    async fn individual_import(&self, names: &[String]) -> ImportStats {
        let mut stats = ImportStats::start(names.len());

        for name in names {
            match self.import_one(name).await {
                Ok(()) => stats.inc_imported(),
                Err(e) => {
                    warn!(
                        registry = %self.source,
                        package = %name,
                        error = %e,
                        "Failed to import package"
                    );
                    stats.inc_failed();
                },
            }
        }

        stats.complete()
    }
}
