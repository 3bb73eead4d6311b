//! Error types for Stirling
//!
//! Store failures are the only hard failure of the fix feed. Malformed
//! numeric fields and missing coordinates are soft conditions handled in the
//! transform stage and never surface here.

use thiserror::Error;

/// Result type alias using Stirling's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Stirling
#[derive(Error, Debug)]
pub enum Error {
    // Store Errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // Configuration Errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Caller supplied an unusable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // IO Errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal Errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of a single page request against the telemetry store.
///
/// Any of these aborts the whole fetch; already-fetched pages are discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Store returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Short label used for metrics and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::InvalidConnectionString(_) => "connection_string",
            StoreError::Transport(_) => "transport",
            StoreError::Status { .. } => "status",
            StoreError::Decode(_) => "decode",
        }
    }
}
