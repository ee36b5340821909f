//! Registry mirrors
//!
//! Each supported ecosystem is backed by a [`RegistryMirror`] that reads
//! package documents from its upstream registry over HTTP and writes a
//! [`PackageRecord`] per package into the knowledge database.

mod knowledge;
mod mirror;
mod source;

pub use knowledge::{PackageRecord, PackageSink, PgKnowledgeStore};
pub use mirror::RegistryMirror;
pub use source::RegistrySource;

use follower_common::{FollowerError, Result};
use reqwest::Client;
use std::sync::Arc;

use crate::config::MirrorConfig;
use crate::import::EcosystemRegistry;

/// Build the ecosystem registry with one mirror per supported registry
pub fn build_registry(
    config: &MirrorConfig,
    default_ecosystem: &str,
    sink: Arc<dyn PackageSink>,
) -> Result<EcosystemRegistry> {
    let client = Client::builder()
        .timeout(config.http_timeout())
        .user_agent(concat!("package-follower/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FollowerError::Network(format!("Failed to build HTTP client: {e}")))?;

    let npm = RegistryMirror::new(
        RegistrySource::Npm,
        client.clone(),
        config.npm_registry_url.clone(),
        sink.clone(),
    )
    .with_concurrency(config.concurrency);

    let packagist = RegistryMirror::new(
        RegistrySource::Packagist,
        client,
        config.packagist_url.clone(),
        sink,
    )
    .with_concurrency(config.concurrency);

    Ok(EcosystemRegistry::new(default_ecosystem)
        .with(Arc::new(npm))
        .with(Arc::new(packagist)))
}
