//! Package Follower
//!
//! Queue-driven worker that imports package metadata into the knowledge
//! database on behalf of analysis runs.
//!
//! Each message names an analysis, an ecosystem and a list of packages. The
//! follower marks the analysis `updating_db`, imports the packages through
//! the ecosystem's capability (batch first, one-by-one on failure), then
//! marks it `ongoing`.
//!
//! # Modules
//!
//! - **consumer**: AMQP subscription and acknowledgement
//! - **dispatcher**: per-message processing
//! - **import**: capability trait, ecosystem registry, fallback strategy
//! - **mirrors**: npm and Packagist registry mirrors
//! - **status**: analysis status transitions
//! - **testing**: in-memory doubles
//!
//! # Example
//!
//! ```no_run
//! use package_follower::{
//!     testing::{InMemoryStatusStore, MockImporter},
//!     Dispatcher, EcosystemRegistry,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let registry = EcosystemRegistry::new("javascript")
//!     .with(Arc::new(MockImporter::new("javascript")));
//! let dispatcher = Dispatcher::new(Arc::new(InMemoryStatusStore::new()), Arc::new(registry));
//!
//! let report = dispatcher
//!     .dispatch(br#"{"analysisId":"5f0c1d2e-3b4a-4c5d-8e6f-708192a3b4c5","packageNames":["left-pad"]}"#)
//!     .await;
//! println!("{} packages in {:?}", report.package_count, report.elapsed);
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod consumer;
pub mod dispatcher;
pub mod error;
pub mod import;
pub mod messages;
pub mod mirrors;
pub mod status;
pub mod testing;

pub use config::Config;
pub use consumer::QueueConsumer;
pub use dispatcher::{DispatchOutcome, DispatchReport, Dispatcher};
pub use error::{ImportError, StatusStoreError};
pub use import::{EcosystemRegistry, ImportCapability, ImportStats};
pub use messages::{MalformedMessagePolicy, WorkMessage};
pub use status::{AnalysisStatus, PgStatusStore, StatusStore};
