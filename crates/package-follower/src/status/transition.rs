//! Best-effort status transitions
//!
//! A dispatch moves its analysis to `updating_db` before importing and to
//! `ongoing` afterwards. Failures are logged and swallowed: the status field
//! is advisory and must never block the import itself.

use tracing::{error, info};
use uuid::Uuid;

use super::{AnalysisStatus, StatusStore, StatusTransition};

/// Runs the entry and exit transitions of a dispatch
pub struct StatusTransitionManager<S> {
    store: S,
}

impl<S: StatusStore> StatusTransitionManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Mark the analysis as importing (`updating_db`)
    pub async fn enter(&self, analysis_id: Uuid) -> Option<StatusTransition> {
        self.advance(analysis_id, AnalysisStatus::UpdatingDb).await
    }

    /// Mark the analysis as ready to continue (`ongoing`)
    pub async fn exit(&self, analysis_id: Uuid) -> Option<StatusTransition> {
        self.advance(analysis_id, AnalysisStatus::Ongoing).await
    }

    /// Attempt one transition; `None` when it did not commit
    pub async fn advance(
        &self,
        analysis_id: Uuid,
        to: AnalysisStatus,
    ) -> Option<StatusTransition> {
        match self.store.transition(analysis_id, to).await {
            Ok(transition) => {
                info!(
                    analysis_id = %analysis_id,
                    previous = transition.previous.as_deref().unwrap_or("<null>"),
                    status = %to,
                    "Analysis status updated"
                );
                Some(transition)
            },
            Err(e) => {
                error!(
                    analysis_id = %analysis_id,
                    status = %to,
                    error = %e,
                    "Failed to update analysis status"
                );
                None
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStatusStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_enter_then_exit() {
        let id = Uuid::new_v4();
        let store = Arc::new(InMemoryStatusStore::new());
        store.insert(id, "requested").await;
        let manager = StatusTransitionManager::new(store.clone());

        let entered = manager.enter(id).await.unwrap();
        assert_eq!(entered.previous.as_deref(), Some("requested"));
        assert_eq!(entered.current, AnalysisStatus::UpdatingDb);

        let exited = manager.exit(id).await.unwrap();
        assert_eq!(exited.previous.as_deref(), Some("updating_db"));
        assert_eq!(store.status_of(id).await.as_deref(), Some("ongoing"));
    }

    #[tokio::test]
    async fn test_transitions_are_idempotent() {
        let id = Uuid::new_v4();
        let store = Arc::new(InMemoryStatusStore::new());
        store.insert(id, "started").await;
        let manager = StatusTransitionManager::new(store.clone());

        manager.enter(id).await.unwrap();
        manager.enter(id).await.unwrap();
        assert_eq!(store.status_of(id).await.as_deref(), Some("updating_db"));

        manager.exit(id).await.unwrap();
        manager.exit(id).await.unwrap();
        assert_eq!(store.status_of(id).await.as_deref(), Some("ongoing"));
    }

    #[tokio::test]
    async fn test_missing_record_is_not_fatal() {
        let store = Arc::new(InMemoryStatusStore::new());
        let manager = StatusTransitionManager::new(store.clone());

        assert!(manager.enter(Uuid::new_v4()).await.is_none());
        assert_eq!(store.attempts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_previous_status_is_preserved() {
        let id = Uuid::new_v4();
        let store = Arc::new(InMemoryStatusStore::new());
        store.insert(id, "archived_by_admin").await;
        let manager = StatusTransitionManager::new(store);

        let transition = manager.enter(id).await.unwrap();
        assert_eq!(transition.previous.as_deref(), Some("archived_by_admin"));
    }
}
