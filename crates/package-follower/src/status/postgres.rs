//! PostgreSQL status store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{AnalysisStatus, StatusStore, StatusTransition};
use crate::error::StatusStoreError;

/// Status store over the `analysis` table of the results database
#[derive(Debug, Clone)]
pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn transition(
        &self,
        analysis_id: Uuid,
        to: AnalysisStatus,
    ) -> Result<StatusTransition, StatusStoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock held until commit
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT status::text FROM analysis WHERE id = $1 FOR UPDATE")
                .bind(analysis_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (previous,) = row.ok_or(StatusStoreError::NotFound(analysis_id))?;

        sqlx::query("UPDATE analysis SET status = $2 WHERE id = $1")
            .bind(analysis_id)
            .bind(to.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            analysis_id = %analysis_id,
            previous = previous.as_deref().unwrap_or("<null>"),
            current = %to,
            "Analysis status committed"
        );

        Ok(StatusTransition {
            analysis_id,
            previous,
            current: to,
        })
    }
}
