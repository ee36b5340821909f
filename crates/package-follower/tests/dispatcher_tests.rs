//! Dispatcher integration tests
//!
//! Full dispatches against the in-memory status store and mock importers:
//! - Transition ordering around the import
//! - Batch-then-fallback routing per ecosystem
//! - Unknown and empty ecosystem tags
//! - Malformed payload policies
//! - Missing analysis records

use package_follower::{
    import::ImportPath,
    testing::{ImportCall, InMemoryStatusStore, MockImporter},
    AnalysisStatus, DispatchOutcome, Dispatcher, EcosystemRegistry, MalformedMessagePolicy,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct Harness {
    store: Arc<InMemoryStatusStore>,
    javascript: Arc<MockImporter>,
    php: Arc<MockImporter>,
    dispatcher: Dispatcher<Arc<InMemoryStatusStore>>,
}

fn harness_with(javascript: MockImporter, php: MockImporter) -> Harness {
    let store = Arc::new(InMemoryStatusStore::new());
    let javascript = Arc::new(javascript);
    let php = Arc::new(php);
    let registry = EcosystemRegistry::new("javascript")
        .with(javascript.clone())
        .with(php.clone());

    Harness {
        dispatcher: Dispatcher::new(store.clone(), Arc::new(registry)),
        store,
        javascript,
        php,
    }
}

fn harness() -> Harness {
    harness_with(MockImporter::new("javascript"), MockImporter::new("php"))
}

fn payload(analysis_id: Uuid, ecosystem: &str, names: &[&str]) -> Vec<u8> {
    json!({
        "analysisId": analysis_id,
        "ecosystem": ecosystem,
        "packageNames": names,
    })
    .to_string()
    .into_bytes()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_empty_tag_batch_imports_into_default_ecosystem() {
    let h = harness();
    let id = Uuid::new_v4();
    h.store.insert(id, "requested").await;

    let report = h.dispatcher.dispatch(&payload(id, "", &["left-pad"])).await;

    assert_eq!(report.outcome, DispatchOutcome::Completed);
    assert_eq!(report.ecosystem, "javascript");
    assert_eq!(h.javascript.calls().await, vec![ImportCall::Batch(strings(&["left-pad"]))]);
    assert!(h.php.calls().await.is_empty());
    assert_eq!(
        h.store.attempted_statuses(id).await,
        vec![AnalysisStatus::UpdatingDb, AnalysisStatus::Ongoing]
    );
    assert_eq!(h.store.status_of(id).await.as_deref(), Some("ongoing"));
}

#[tokio::test]
async fn test_unknown_ecosystem_still_transitions() {
    let h = harness();
    let id = Uuid::new_v4();
    h.store.insert(id, "started").await;

    let report = h
        .dispatcher
        .dispatch(&payload(id, "cobol-packages", &["a", "b"]))
        .await;

    assert_eq!(report.import.as_ref().map(|i| i.path.clone()), Some(ImportPath::UnknownEcosystem));
    assert_eq!(report.package_count, 2);
    assert!(h.javascript.calls().await.is_empty());
    assert!(h.php.calls().await.is_empty());
    assert_eq!(
        h.store.attempted_statuses(id).await,
        vec![AnalysisStatus::UpdatingDb, AnalysisStatus::Ongoing]
    );
    assert!(report.entered && report.exited);
}

#[tokio::test]
async fn test_php_batch_failure_falls_back_to_individual() {
    let h = harness_with(
        MockImporter::new("javascript"),
        MockImporter::new("php")
            .failing_batch("registry down")
            .with_delay(Duration::from_millis(5)),
    );
    let id = Uuid::new_v4();
    h.store.insert(id, "requested").await;

    let report = h.dispatcher.dispatch(&payload(id, "php", &["a/b"])).await;

    assert_eq!(
        h.php.calls().await,
        vec![
            ImportCall::Batch(strings(&["a/b"])),
            ImportCall::Individual(strings(&["a/b"])),
        ]
    );
    let import = report.import.as_ref().expect("import report");
    assert!(matches!(import.path, ImportPath::Fallback { .. }));
    assert_eq!(import.stats.imported, 1);
    assert!(report.elapsed > Duration::ZERO);
    assert!(report.elapsed >= Duration::from_millis(10));
    assert_eq!(h.store.status_of(id).await.as_deref(), Some("ongoing"));
}

// ============================================================================
// Routing and transition properties
// ============================================================================

#[tokio::test]
async fn test_empty_tag_routes_like_default_tag() {
    let h = harness();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    h.store.insert(first, "requested").await;
    h.store.insert(second, "requested").await;

    let by_default = h.dispatcher.dispatch(&payload(first, "", &["x", "y"])).await;
    let by_tag = h
        .dispatcher
        .dispatch(&payload(second, "javascript", &["x", "y"]))
        .await;

    assert_eq!(by_default.ecosystem, by_tag.ecosystem);
    assert_eq!(
        h.javascript.batch_calls().await,
        vec![strings(&["x", "y"]), strings(&["x", "y"])]
    );
}

#[tokio::test]
async fn test_batch_success_never_calls_individual() {
    let h = harness();
    let id = Uuid::new_v4();
    h.store.insert(id, "requested").await;

    h.dispatcher.dispatch(&payload(id, "php", &["a/b", "c/d"])).await;

    assert_eq!(h.php.batch_calls().await.len(), 1);
    assert!(h.php.individual_calls().await.is_empty());
}

#[tokio::test]
async fn test_individual_failures_do_not_change_transitions() {
    let h = harness_with(
        MockImporter::new("javascript")
            .failing_batch("timeout")
            .failing_packages(&["broken"]),
        MockImporter::new("php"),
    );
    let id = Uuid::new_v4();
    h.store.insert(id, "requested").await;

    let report = h
        .dispatcher
        .dispatch(&payload(id, "javascript", &["ok", "broken"]))
        .await;

    let stats = &report.import.as_ref().expect("import report").stats;
    assert_eq!((stats.imported, stats.failed), (1, 1));
    assert_eq!(
        h.store.attempted_statuses(id).await,
        vec![AnalysisStatus::UpdatingDb, AnalysisStatus::Ongoing]
    );
}

#[tokio::test]
async fn test_redelivery_is_idempotent() {
    let h = harness();
    let id = Uuid::new_v4();
    h.store.insert(id, "requested").await;
    let body = payload(id, "javascript", &["left-pad"]);

    h.dispatcher.dispatch(&body).await;
    let status_after_first = h.store.status_of(id).await;
    h.dispatcher.dispatch(&body).await;

    assert_eq!(h.store.status_of(id).await, status_after_first);
    assert_eq!(h.store.attempts().await.len(), 4);
}

#[tokio::test]
async fn test_missing_analysis_record_does_not_block_import() {
    let h = harness();
    let id = Uuid::new_v4();

    let report = h.dispatcher.dispatch(&payload(id, "php", &["a/b"])).await;

    assert_eq!(report.outcome, DispatchOutcome::Completed);
    assert!(!report.entered);
    assert!(!report.exited);
    assert_eq!(h.php.batch_calls().await, vec![strings(&["a/b"])]);
    assert_eq!(h.store.attempts().await.len(), 2);
    assert_eq!(h.store.status_of(id).await, None);
}

// ============================================================================
// Malformed payloads
// ============================================================================

#[tokio::test]
async fn test_tolerate_dispatches_zero_valued_message() {
    let h = harness();

    let report = h.dispatcher.dispatch(b"definitely not json").await;

    assert_eq!(report.outcome, DispatchOutcome::Completed);
    assert!(report.analysis_id.is_nil());
    assert_eq!(report.package_count, 0);
    assert_eq!(h.javascript.batch_calls().await, vec![Vec::<String>::new()]);
    assert_eq!(
        h.store.attempted_statuses(Uuid::nil()).await,
        vec![AnalysisStatus::UpdatingDb, AnalysisStatus::Ongoing]
    );
}

#[tokio::test]
async fn test_skip_and_reject_leave_everything_untouched() {
    for (policy, outcome) in [
        (MalformedMessagePolicy::Skip, DispatchOutcome::Skipped),
        (MalformedMessagePolicy::Reject, DispatchOutcome::Rejected),
    ] {
        let store = Arc::new(InMemoryStatusStore::new());
        let importer = Arc::new(MockImporter::new("javascript"));
        let dispatcher = Dispatcher::new(
            store.clone(),
            Arc::new(EcosystemRegistry::new("javascript").with(importer.clone())),
        )
        .with_malformed_policy(policy);

        let report = dispatcher.dispatch(br#"{"analysisId": 42}"#).await;

        assert_eq!(report.outcome, outcome);
        assert!(store.attempts().await.is_empty());
        assert!(importer.calls().await.is_empty());
    }
}

#[tokio::test]
async fn test_producer_field_spellings_are_accepted() {
    let h = harness();
    let id = Uuid::new_v4();
    h.store.insert(id, "requested").await;
    let body = json!({
        "analysis_id": id,
        "language": "php",
        "packagesNames": ["monolog/monolog"],
    })
    .to_string();

    let report = h.dispatcher.dispatch(body.as_bytes()).await;

    assert_eq!(report.analysis_id, id);
    assert_eq!(h.php.batch_calls().await, vec![strings(&["monolog/monolog"])]);
}

#[tokio::test]
async fn test_null_package_list_keeps_the_analysis() {
    let h = harness();
    let id = Uuid::new_v4();
    h.store.insert(id, "requested").await;
    let body = json!({
        "analysis_id": id,
        "language": "php",
        "packages_names": null,
    })
    .to_string();

    let report = h.dispatcher.dispatch(body.as_bytes()).await;

    assert_eq!(report.outcome, DispatchOutcome::Completed);
    assert_eq!(report.analysis_id, id);
    assert_eq!(report.package_count, 0);
    assert_eq!(h.php.batch_calls().await, vec![Vec::<String>::new()]);
    assert_eq!(h.store.status_of(id).await.as_deref(), Some("ongoing"));
}

#[tokio::test]
async fn test_null_ecosystem_routes_to_default() {
    let h = harness();
    let id = Uuid::new_v4();
    h.store.insert(id, "requested").await;
    let body = json!({
        "analysisId": id,
        "ecosystem": null,
        "packageNames": ["left-pad"],
    })
    .to_string();

    let report = h.dispatcher.dispatch(body.as_bytes()).await;

    assert_eq!(report.analysis_id, id);
    assert_eq!(h.javascript.batch_calls().await, vec![strings(&["left-pad"])]);
    assert!(h.php.calls().await.is_empty());
    assert_eq!(h.store.status_of(id).await.as_deref(), Some("ongoing"));
}

#[tokio::test]
async fn test_array_payload_is_malformed() {
    let h = harness();
    let id = Uuid::new_v4();
    let body = json!([id, "php", ["monolog/monolog"]]).to_string();

    let report = h.dispatcher.dispatch(body.as_bytes()).await;

    // Tolerated as a zero-valued message; the positional id is not picked up
    assert!(report.analysis_id.is_nil());
    assert!(h.php.calls().await.is_empty());
    assert_eq!(h.javascript.batch_calls().await, vec![Vec::<String>::new()]);
}
