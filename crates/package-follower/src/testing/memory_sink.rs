//! In-memory knowledge store for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ImportError;
use crate::mirrors::{PackageRecord, PackageSink};

/// Package sink keyed by (ecosystem, name), like the real table
#[derive(Default)]
pub struct InMemoryPackageSink {
    records: Arc<RwLock<BTreeMap<(String, String), PackageRecord>>>,
    writes: Arc<RwLock<usize>>,
    unavailable: AtomicBool,
}

impl InMemoryPackageSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn get(&self, ecosystem: &str, name: &str) -> Option<PackageRecord> {
        self.records
            .read()
            .await
            .get(&(ecosystem.to_string(), name.to_string()))
            .cloned()
    }

    /// Stored package names, sorted
    pub async fn names(&self) -> Vec<String> {
        self.records
            .read()
            .await
            .keys()
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Number of successful `upsert_batch` calls
    pub async fn write_count(&self) -> usize {
        *self.writes.read().await
    }
}

#[async_trait]
impl PackageSink for InMemoryPackageSink {
    async fn upsert_batch(&self, records: &[PackageRecord]) -> Result<usize, ImportError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ImportError::Store("knowledge store unavailable".to_string()));
        }

        let mut stored = self.records.write().await;
        for record in records {
            stored.insert(
                (record.ecosystem.clone(), record.name.clone()),
                record.clone(),
            );
        }
        *self.writes.write().await += 1;

        Ok(records.len())
    }
}
