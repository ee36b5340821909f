//! Knowledge database writes
//!
//! Imported package metadata lands in the `package` table, one row per
//! `(ecosystem, name)`. Re-importing a package overwrites its row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use crate::error::ImportError;

/// One imported package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub ecosystem: String,
    pub name: String,
    pub latest_version: String,
    /// Registry document as served
    pub metadata: serde_json::Value,
    pub imported_at: DateTime<Utc>,
}

/// Destination for imported package records
#[async_trait]
pub trait PackageSink: Send + Sync {
    /// Upsert all records atomically, returning how many were written
    async fn upsert_batch(&self, records: &[PackageRecord]) -> Result<usize, ImportError>;
}

/// PostgreSQL-backed knowledge store
#[derive(Clone)]
pub struct PgKnowledgeStore {
    pool: PgPool,
}

impl PgKnowledgeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PackageSink for PgKnowledgeStore {
    async fn upsert_batch(&self, records: &[PackageRecord]) -> Result<usize, ImportError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO package (ecosystem, name, latest_version, metadata, imported_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (ecosystem, name) DO UPDATE SET
                    latest_version = EXCLUDED.latest_version,
                    metadata = EXCLUDED.metadata,
                    imported_at = EXCLUDED.imported_at
                "#,
            )
            .bind(&record.ecosystem)
            .bind(&record.name)
            .bind(&record.latest_version)
            .bind(&record.metadata)
            .bind(record.imported_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(records = records.len(), "Upserted package records");
        Ok(records.len())
    }
}
