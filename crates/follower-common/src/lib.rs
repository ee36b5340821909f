//! Package Follower Common Library
//!
//! Shared error handling and logging setup for the package follower workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`FollowerError`] and the [`Result`] alias
//! - **Logging**: environment-driven `tracing` subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use follower_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> follower_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!     tracing::info!("follower starting");
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{FollowerError, Result};
