// Persistence errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors of the collection store.
///
/// Annotation and indexing never fail; only reading and writing whole
/// collections can.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a collection file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that was accessed
        path: PathBuf,

        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A collection could not be (de)serialized
    #[error("Invalid {collection} collection: {source}")]
    Serialization {
        /// Collection name
        collection: String,

        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// The store lock was poisoned by a panicking writer
    #[error("Collection store lock poisoned")]
    Poisoned,
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
