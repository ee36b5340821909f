//! Follower-specific error types

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a status store transaction
#[derive(Error, Debug)]
pub enum StatusStoreError {
    #[error("Analysis {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors raised by an import capability
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid package name '{0}'")]
    InvalidName(String),

    #[error("Package '{name}' not found in the {ecosystem} registry")]
    NotFound { ecosystem: String, name: String },

    #[error("Registry request for '{name}' failed: {source}")]
    Fetch {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Registry answered {status} for '{name}'")]
    Status { name: String, status: u16 },

    #[error("Invalid registry document for '{name}': {reason}")]
    InvalidDocument { name: String, reason: String },

    #[error("Knowledge store error: {0}")]
    Store(String),

    #[error("Batch import failed: {0}")]
    Batch(String),
}

impl From<sqlx::Error> for ImportError {
    fn from(err: sqlx::Error) -> Self {
        ImportError::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_store_not_found_display() {
        let id = Uuid::nil();
        assert_eq!(
            StatusStoreError::NotFound(id).to_string(),
            "Analysis 00000000-0000-0000-0000-000000000000 not found"
        );
    }

    #[test]
    fn test_import_error_display() {
        let err = ImportError::NotFound {
            ecosystem: "php".to_string(),
            name: "a/b".to_string(),
        };
        assert_eq!(err.to_string(), "Package 'a/b' not found in the php registry");
        assert_eq!(
            ImportError::Batch("timeout".into()).to_string(),
            "Batch import failed: timeout"
        );
    }

    #[test]
    fn test_sqlx_error_maps_to_store() {
        let err: ImportError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, ImportError::Store(_)));
    }
}
