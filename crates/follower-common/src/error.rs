//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for follower operations
pub type Result<T> = std::result::Result<T, FollowerError>;

/// Main error type for the package follower
#[derive(Error, Debug)]
pub enum FollowerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl FollowerError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
