//! Analysis status tracking
//!
//! The analysis record is created upstream and touched by other services, so
//! every change goes through [`StatusStore::transition`]: read the current
//! value and write the new one inside a single transaction.
//!
//! - **postgres**: [`PgStatusStore`] against the results database
//! - **transition**: [`StatusTransitionManager`], the best-effort wrapper the
//!   dispatcher uses

pub mod postgres;
pub mod transition;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::StatusStoreError;

pub use postgres::PgStatusStore;
pub use transition::StatusTransitionManager;

/// Status of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Requested,
    Training,
    Started,
    Finished,
    Completed,
    Failure,
    Success,
    /// Package metadata is being imported
    UpdatingDb,
    /// Imports are done and the analysis can proceed
    Ongoing,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Requested => "requested",
            AnalysisStatus::Training => "training",
            AnalysisStatus::Started => "started",
            AnalysisStatus::Finished => "finished",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failure => "failure",
            AnalysisStatus::Success => "success",
            AnalysisStatus::UpdatingDb => "updating_db",
            AnalysisStatus::Ongoing => "ongoing",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnalysisStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requested" => Ok(AnalysisStatus::Requested),
            "training" => Ok(AnalysisStatus::Training),
            "started" => Ok(AnalysisStatus::Started),
            "finished" => Ok(AnalysisStatus::Finished),
            "completed" => Ok(AnalysisStatus::Completed),
            "failure" => Ok(AnalysisStatus::Failure),
            "success" => Ok(AnalysisStatus::Success),
            "updating_db" => Ok(AnalysisStatus::UpdatingDb),
            "ongoing" => Ok(AnalysisStatus::Ongoing),
            _ => Err(anyhow::anyhow!("Invalid analysis status: {}", s)),
        }
    }
}

/// A committed status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub analysis_id: Uuid,
    /// Value read inside the transaction, verbatim; other services may write
    /// values this crate does not know about
    pub previous: Option<String>,
    pub current: AnalysisStatus,
}

/// Transactional access to analysis status records
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Read the record by id and set its status to `to` in one transaction
    async fn transition(
        &self,
        analysis_id: Uuid,
        to: AnalysisStatus,
    ) -> Result<StatusTransition, StatusStoreError>;
}

#[async_trait]
impl<T: StatusStore + ?Sized> StatusStore for Arc<T> {
    async fn transition(
        &self,
        analysis_id: Uuid,
        to: AnalysisStatus,
    ) -> Result<StatusTransition, StatusStoreError> {
        (**self).transition(analysis_id, to).await
    }
}
