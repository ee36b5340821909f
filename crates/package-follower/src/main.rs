//! Package Follower - Main entry point

use anyhow::{Context, Result};
use follower_common::logging::{init_logging, LogConfig};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use package_follower::{
    config::Config,
    mirrors::{build_registry, PgKnowledgeStore},
    Dispatcher, PgStatusStore, QueueConsumer,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::new("package-follower")
        .with_directives("sqlx=warn,lapin=warn")
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting package follower");

    let config = Config::load().context("Failed to load configuration")?;
    info!(
        queue = %config.broker.queue,
        broker = %config.broker.url_redacted(),
        default_ecosystem = %config.follower.default_ecosystem,
        on_malformed = %config.follower.on_malformed,
        "Configuration loaded"
    );

    let knowledge_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.knowledge_timeout())
        .connect(&config.database.knowledge_url())
        .await
        .with_context(|| {
            format!("Failed to connect to database '{}'", config.database.knowledge_database)
        })?;

    let results_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.results_timeout())
        .connect(&config.database.results_url())
        .await
        .with_context(|| {
            format!("Failed to connect to database '{}'", config.database.results_database)
        })?;

    info!("Database connection pools established");

    let registry = build_registry(
        &config.mirrors,
        &config.follower.default_ecosystem,
        Arc::new(PgKnowledgeStore::new(knowledge_pool.clone())),
    )?;
    registry.validate()?;
    info!(ecosystems = ?registry.ecosystems(), "Ecosystem registry ready");

    let dispatcher = Dispatcher::new(PgStatusStore::new(results_pool.clone()), Arc::new(registry))
        .with_malformed_policy(config.follower.on_malformed);

    let consumer = QueueConsumer::new(config.broker.clone(), Arc::new(dispatcher));
    let handle = tokio::spawn(consumer.run(shutdown_signal()));

    let outcome = handle.await.context("Consumer task panicked")?;

    knowledge_pool.close().await;
    results_pool.close().await;

    match outcome {
        Ok(()) => {
            info!("Package follower stopped");
            Ok(())
        },
        Err(e) => {
            error!(error = %e, "Consumer stopped with an error");
            Err(e)
        },
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, finishing current message");
        },
        _ = terminate => {
            info!("Received terminate signal, finishing current message");
        },
    }
}
