//! Batch-first import with individual fallback

use std::sync::Arc;
use tracing::{info, warn};

use super::{EcosystemRegistry, ImportCapability, ImportStats};

/// Which route an import took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportPath {
    /// Batch import succeeded
    Batch,
    /// Batch import failed and the names were imported one by one
    Fallback { batch_error: String },
    /// No capability for the tag; nothing was imported
    UnknownEcosystem,
}

impl std::fmt::Display for ImportPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportPath::Batch => write!(f, "batch"),
            ImportPath::Fallback { .. } => write!(f, "fallback"),
            ImportPath::UnknownEcosystem => write!(f, "skipped"),
        }
    }
}

/// Outcome of the import step of a dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    /// Tag the import was routed under (the default ecosystem for an empty tag)
    pub ecosystem: String,
    pub path: ImportPath,
    pub stats: ImportStats,
}

/// Selects the capability for a tag and applies the fallback policy
#[derive(Clone)]
pub struct ImportStrategy {
    registry: Arc<EcosystemRegistry>,
}

impl ImportStrategy {
    pub fn new(registry: Arc<EcosystemRegistry>) -> Self {
        Self { registry }
    }

    /// Import `names` for the ecosystem tagged `tag`
    ///
    /// Unknown tags are logged and skipped. Nothing here is fatal to the caller.
    pub async fn run(&self, tag: &str, names: &[String]) -> ImportReport {
        let ecosystem = self.registry.canonical_tag(tag).to_string();

        match self.registry.resolve(tag) {
            Some(capability) => {
                let (path, stats) = import_with_fallback(capability.as_ref(), names).await;
                ImportReport {
                    ecosystem,
                    path,
                    stats,
                }
            },
            None => {
                warn!(
                    ecosystem = %ecosystem,
                    packages = names.len(),
                    "Unknown ecosystem, skipping package import"
                );
                ImportReport {
                    ecosystem,
                    path: ImportPath::UnknownEcosystem,
                    stats: ImportStats::default(),
                }
            },
        }
    }
}

/// Try the batch import; on error fall back to one individual import of the same names
pub async fn import_with_fallback(
    capability: &dyn ImportCapability,
    names: &[String],
) -> (ImportPath, ImportStats) {
    let ecosystem = capability.ecosystem();

    match capability.batch_import(names).await {
        Ok(stats) => {
            info!(
                ecosystem,
                imported = stats.imported,
                duration_secs = stats.duration_secs,
                "Batch import completed"
            );
            (ImportPath::Batch, stats)
        },
        Err(e) => {
            warn!(
                ecosystem,
                error = %e,
                packages = names.len(),
                "Batch import failed, importing packages individually"
            );
            let stats = capability.individual_import(names).await;
            if stats.is_clean() {
                info!(ecosystem, imported = stats.imported, "Individual import finished");
            } else {
                warn!(
                    ecosystem,
                    imported = stats.imported,
                    failed = stats.failed,
                    "Individual import finished with failures"
                );
            }
            (
                ImportPath::Fallback {
                    batch_error: e.to_string(),
                },
                stats,
            )
        },
    }
}
