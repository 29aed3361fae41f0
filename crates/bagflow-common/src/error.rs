//! Error types shared across the bagflow workspace
//!
//! One taxonomy for the whole pipeline core. Absence of a remote record is
//! never an error here: lookups return `Ok(None)` so callers can branch
//! create-vs-update without conflating "missing" with "failed".

use thiserror::Error;

/// Result type alias for bagflow operations
pub type Result<T> = std::result::Result<T, BagflowError>;

/// Error taxonomy for the ingest/sync core
#[derive(Error, Debug)]
pub enum BagflowError {
    /// An identifier could not be decomposed into institution/bag/path.
    /// Always carries the offending identifier; masking malformed data as
    /// "new file" or "unchanged" is disallowed.
    #[error("Malformed identifier: '{0}'. Expected '{{institution}}/{{bag-name}}[/data/{{relative-path}}]'.")]
    MalformedIdentifier(String),

    /// A checksum algorithm name outside the recognized set (md5, sha256)
    #[error("Unknown checksum algorithm: '{0}'. Recognized algorithms are 'md5' and 'sha256'.")]
    UnknownAlgorithm(String),

    /// A bulk request was driven past the per-request capacity limit
    #[error("Capacity exceeded: {actual} generic files submitted, limit is {limit} per request. Split into bulk batches.")]
    CapacityExceeded { limit: usize, actual: usize },

    /// Network or server failure on a registry call. Retryable on a later
    /// pipeline pass as long as the status record keeps retry = true.
    #[error("Registry sync failed: {0}. The attempt is retryable; stage and status were not advanced.")]
    TransientSync(String),

    /// BatchIterator end condition. Normal termination of a batching loop,
    /// surfaced as a distinguishable value so callers can stop looping.
    #[error("No more entries need saving; iteration is exhausted.")]
    ExhaustedIteration,

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables.")]
    Config(String),

    /// File system operation failed
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding failed
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for BagflowError {
    fn from(err: reqwest::Error) -> Self {
        BagflowError::TransientSync(err.to_string())
    }
}

impl BagflowError {
    /// Create a malformed-identifier error
    pub fn malformed_identifier(identifier: impl Into<String>) -> Self {
        Self::MalformedIdentifier(identifier.into())
    }

    /// Create a transient sync error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::TransientSync(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True if a later pipeline pass may safely retry the failed operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientSync(_))
    }
}
