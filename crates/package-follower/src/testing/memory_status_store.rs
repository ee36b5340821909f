//! In-memory status store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StatusStoreError;
use crate::status::{AnalysisStatus, StatusStore, StatusTransition};

/// Status store backed by a map, recording every transition attempt
#[derive(Default)]
pub struct InMemoryStatusStore {
    records: Arc<RwLock<HashMap<Uuid, Option<String>>>>,
    attempts: Arc<RwLock<Vec<(Uuid, AnalysisStatus)>>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite an analysis record
    pub async fn insert(&self, analysis_id: Uuid, status: &str) {
        self.records
            .write()
            .await
            .insert(analysis_id, Some(status.to_string()));
    }

    /// Current status of a record, `None` when the record does not exist
    pub async fn status_of(&self, analysis_id: Uuid) -> Option<String> {
        self.records.read().await.get(&analysis_id).cloned().flatten()
    }

    /// Every transition attempted, committed or not, in order
    pub async fn attempts(&self) -> Vec<(Uuid, AnalysisStatus)> {
        self.attempts.read().await.clone()
    }

    /// Statuses attempted for one analysis, in order
    pub async fn attempted_statuses(&self, analysis_id: Uuid) -> Vec<AnalysisStatus> {
        self.attempts
            .read()
            .await
            .iter()
            .filter(|(id, _)| *id == analysis_id)
            .map(|(_, status)| *status)
            .collect()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn transition(
        &self,
        analysis_id: Uuid,
        to: AnalysisStatus,
    ) -> Result<StatusTransition, StatusStoreError> {
        self.attempts.write().await.push((analysis_id, to));

        let mut records = self.records.write().await;
        let slot = records
            .get_mut(&analysis_id)
            .ok_or(StatusStoreError::NotFound(analysis_id))?;
        let previous = slot.replace(to.as_str().to_string());

        Ok(StatusTransition {
            analysis_id,
            previous,
            current: to,
        })
    }
}
