//! Error types for the engine and the collection registry.

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the embedded document engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Unique constraint [{fields}] on {collection} violated by {key}")]
    UniqueViolation {
        collection: String,
        fields: String,
        key: String,
    },

    #[error("Documents in {0} must be JSON objects")]
    NotAnObject(String),

    #[error("Document id {id} appears more than once in {collection}")]
    DuplicateDocumentId { collection: String, id: u64 },

    #[error("Collection {collection} has options {found}, expected {expected}")]
    OptionsMismatch {
        collection: String,
        expected: String,
        found: String,
    },

    #[error("Engine {0} has no save path (in-memory)")]
    NotPersistent(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot {path:?}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures surfaced by the persistence lifecycle and the collection registry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] EngineError),

    #[error("No active database: {0}")]
    NoActiveDatabase(&'static str),

    #[error("Id {id} is already registered to {existing}, refusing {requested}")]
    DuplicateId {
        id: String,
        existing: String,
        requested: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}
