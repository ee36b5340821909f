//! Mock import capability for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::ImportError;
use crate::import::{ImportCapability, ImportStats};

/// A recorded call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportCall {
    Batch(Vec<String>),
    Individual(Vec<String>),
}

/// Mock implementation of the ImportCapability trait.
///
/// - Batch imports succeed unless [`failing_batch`](Self::failing_batch) is set
/// - Individual imports fail only for names listed in
///   [`failing_packages`](Self::failing_packages)
/// - Every call is recorded
pub struct MockImporter {
    ecosystem: String,
    batch_error: Option<String>,
    failing_packages: HashSet<String>,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<ImportCall>>>,
}

impl MockImporter {
    pub fn new(ecosystem: impl Into<String>) -> Self {
        Self {
            ecosystem: ecosystem.into(),
            batch_error: None,
            failing_packages: HashSet::new(),
            delay: None,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Make every batch import fail with this message
    pub fn failing_batch(mut self, message: impl Into<String>) -> Self {
        self.batch_error = Some(message.into());
        self
    }

    /// Make individual imports of these names fail
    pub fn failing_packages(mut self, names: &[&str]) -> Self {
        self.failing_packages
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn calls(&self) -> Vec<ImportCall> {
        self.calls.read().await.clone()
    }

    pub async fn batch_calls(&self) -> Vec<Vec<String>> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                ImportCall::Batch(names) => Some(names.clone()),
                ImportCall::Individual(_) => None,
            })
            .collect()
    }

    pub async fn individual_calls(&self) -> Vec<Vec<String>> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                ImportCall::Individual(names) => Some(names.clone()),
                ImportCall::Batch(_) => None,
            })
            .collect()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ImportCapability for MockImporter {
    fn ecosystem(&self) -> &str {
        &self.ecosystem
    }

    async fn batch_import(&self, names: &[String]) -> Result<ImportStats, ImportError> {
        self.calls
            .write()
            .await
            .push(ImportCall::Batch(names.to_vec()));
        self.pause().await;

        if let Some(ref message) = self.batch_error {
            return Err(ImportError::Batch(message.clone()));
        }

        let mut stats = ImportStats::start(names.len());
        stats.imported = names.len();
        Ok(stats.complete())
    }

    async fn individual_import(&self, names: &[String]) -> ImportStats {
        self.calls
            .write()
            .await
            .push(ImportCall::Individual(names.to_vec()));
        self.pause().await;

        let mut stats = ImportStats::start(names.len());
        for name in names {
            if self.failing_packages.contains(name) {
                stats.inc_failed();
            } else {
                stats.inc_imported();
            }
        }
        stats.complete()
    }
}
