//! Package import capabilities
//!
//! Every supported ecosystem provides an [`ImportCapability`]: a batch import
//! that succeeds or fails as a whole, and a best-effort individual import used
//! as the fallback. The [`EcosystemRegistry`] maps message tags to
//! capabilities and [`ImportStrategy`] applies the batch-then-fallback policy.

pub mod registry;
pub mod strategy;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ImportError;

pub use registry::EcosystemRegistry;
pub use strategy::{ImportPath, ImportReport, ImportStrategy};

/// Import logic for one package ecosystem
#[async_trait]
pub trait ImportCapability: Send + Sync {
    /// Tag this capability is registered under (e.g. "javascript")
    fn ecosystem(&self) -> &str;

    /// Import every name in one aggregate operation
    ///
    /// Either all packages are imported or an error is returned.
    async fn batch_import(&self, names: &[String]) -> Result<ImportStats, ImportError>;

    /// Import names one at a time
    ///
    /// Failures of single packages are logged and counted in the returned
    /// stats; there is no aggregate error.
    async fn individual_import(&self, names: &[String]) -> ImportStats;
}

/// Counters collected during an import
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ImportStats {
    /// Package names handed to the import
    pub requested: usize,
    /// Packages written to the knowledge store
    pub imported: usize,
    /// Packages that could not be imported
    pub failed: usize,
    /// Duration in seconds
    pub duration_secs: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ImportStats {
    /// Start collecting stats for `requested` names
    pub fn start(requested: usize) -> Self {
        Self {
            requested,
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark stats as completed
    pub fn complete(mut self) -> Self {
        let completed_at = Utc::now();
        self.completed_at = Some(completed_at);
        if let Some(start) = self.started_at {
            self.duration_secs = (completed_at - start).num_milliseconds() as f64 / 1000.0;
        }
        self
    }

    pub fn inc_imported(&mut self) {
        self.imported += 1;
    }

    pub fn inc_failed(&mut self) {
        self.failed += 1;
    }

    /// Share of requested packages that were imported, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.requested > 0 {
            (self.imported as f64 / self.requested as f64) * 100.0
        } else {
            100.0
        }
    }

    /// True when nothing failed
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
