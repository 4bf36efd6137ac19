//! Error types for host services and block registration.

use thiserror::Error;

/// Failures reported by host services (query, cache, content-type directory).
#[derive(Debug, Error)]
pub enum HostError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("cache backend error: {0}")]
    Cache(String),
}

/// Errors raised while loading or dispatching blocks.
#[derive(Debug, Error)]
pub enum BlockError {
    /// The plugin directory has no `block.json`.
    #[error("no block manifest found at {path}")]
    MissingManifest { path: String },

    /// `block.json` exists but could not be parsed.
    #[error("block manifest {path} is invalid: {details}")]
    InvalidManifest { path: String, details: String },

    /// A render was requested for a block name nobody registered.
    #[error("block '{name}' is not registered")]
    UnknownBlock { name: String },
}

/// Result alias for host service calls.
pub type HostResult<T> = Result<T, HostError>;
