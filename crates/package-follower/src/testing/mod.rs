//! Testing utilities and in-memory implementations of the follower's seams.
//!
//! These doubles stand in for PostgreSQL and the registry mirrors so the
//! dispatcher can be exercised without infrastructure. They record every call
//! for assertions.
//!
//! # Example
//!
//! ```rust,ignore
//! use package_follower::testing::{InMemoryStatusStore, MockImporter};
//!
//! let store = Arc::new(InMemoryStatusStore::new());
//! store.insert(analysis_id, "requested").await;
//!
//! let php = Arc::new(MockImporter::new("php").failing_batch("registry down"));
//! let registry = EcosystemRegistry::new("javascript").with(php.clone());
//! ```

mod memory_sink;
mod memory_status_store;
mod mock_importer;

pub use memory_sink::InMemoryPackageSink;
pub use memory_status_store::InMemoryStatusStore;
pub use mock_importer::{ImportCall, MockImporter};
