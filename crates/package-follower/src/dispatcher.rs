//! Per-message dispatch
//!
//! One delivery is processed in strict sequence: decode, enter transition,
//! import, exit transition, completion log. Nothing here fails the caller;
//! the returned [`DispatchReport`] records what happened at each step.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::import::{EcosystemRegistry, ImportReport, ImportStrategy};
use crate::messages::{MalformedMessagePolicy, WorkMessage};
use crate::status::{StatusStore, StatusTransitionManager};

/// How a dispatch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// All steps ran
    Completed,
    /// Payload was malformed and dropped
    Skipped,
    /// Payload was malformed and should be dead-lettered
    Rejected,
}

/// What a dispatch did
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub outcome: DispatchOutcome,
    pub analysis_id: Uuid,
    pub ecosystem: String,
    pub package_count: usize,
    /// Entry transition committed
    pub entered: bool,
    /// Exit transition committed
    pub exited: bool,
    /// `None` when the payload was dropped before importing
    pub import: Option<ImportReport>,
    pub elapsed: Duration,
}

impl DispatchReport {
    fn dropped(outcome: DispatchOutcome) -> Self {
        Self {
            outcome,
            analysis_id: Uuid::nil(),
            ecosystem: String::new(),
            package_count: 0,
            entered: false,
            exited: false,
            import: None,
            elapsed: Duration::ZERO,
        }
    }
}

/// Processes work messages against a status store and an ecosystem registry
pub struct Dispatcher<S> {
    status: StatusTransitionManager<S>,
    strategy: ImportStrategy,
    on_malformed: MalformedMessagePolicy,
}

impl<S: StatusStore> Dispatcher<S> {
    pub fn new(store: S, registry: Arc<EcosystemRegistry>) -> Self {
        Self {
            status: StatusTransitionManager::new(store),
            strategy: ImportStrategy::new(registry),
            on_malformed: MalformedMessagePolicy::default(),
        }
    }

    pub fn with_malformed_policy(mut self, policy: MalformedMessagePolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    /// Decode and dispatch one raw delivery body
    pub async fn dispatch(&self, payload: &[u8]) -> DispatchReport {
        let message = match WorkMessage::from_payload(payload) {
            Ok(message) => message,
            Err(e) => match self.on_malformed {
                MalformedMessagePolicy::Tolerate => {
                    warn!(
                        error = %e,
                        bytes = payload.len(),
                        "Malformed message, dispatching with empty fields"
                    );
                    WorkMessage::default()
                },
                MalformedMessagePolicy::Skip => {
                    warn!(error = %e, bytes = payload.len(), "Malformed message skipped");
                    return DispatchReport::dropped(DispatchOutcome::Skipped);
                },
                MalformedMessagePolicy::Reject => {
                    warn!(error = %e, bytes = payload.len(), "Malformed message rejected");
                    return DispatchReport::dropped(DispatchOutcome::Rejected);
                },
            },
        };

        self.dispatch_message(&message).await
    }

    /// Run the transitions and the import for a decoded message
    #[tracing::instrument(
        name = "dispatch",
        skip(self, message),
        fields(analysis_id = %message.analysis_id, ecosystem = %message.ecosystem)
    )]
    pub async fn dispatch_message(&self, message: &WorkMessage) -> DispatchReport {
        let start = Instant::now();

        let entered = self.status.enter(message.analysis_id).await.is_some();

        let import = self
            .strategy
            .run(&message.ecosystem, &message.package_names)
            .await;

        let exited = self.status.exit(message.analysis_id).await.is_some();

        let elapsed = start.elapsed();

        info!(
            analysis = %message.short_id(),
            ecosystem = %import.ecosystem,
            packages = message.package_names.len(),
            path = %import.path,
            imported = import.stats.imported,
            failed = import.stats.failed,
            success_rate = import.stats.success_rate(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Dispatch completed"
        );

        DispatchReport {
            outcome: DispatchOutcome::Completed,
            analysis_id: message.analysis_id,
            ecosystem: import.ecosystem.clone(),
            package_count: message.package_names.len(),
            entered,
            exited,
            import: Some(import),
            elapsed,
        }
    }
}
