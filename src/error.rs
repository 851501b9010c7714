//! Error taxonomy for ProfNet.
//!
//! Expected business conditions (a pending duplicate, an out-of-range
//! target, an already-resolved request) are typed outcomes on the service
//! contracts, not errors. Only absent records, malformed requests, missing
//! rights, and store I/O surface here.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum ProfNetError {
    /// A referenced user, edge, or message does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request itself is malformed (self-connection, empty input).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The actor has no rights over the record they tried to act on.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The backing store failed. Retryable — the operation did not
    /// partially mutate state.
    #[error("store unavailable: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Interactive prompt failure in the CLI layer.
    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl ProfNetError {
    /// Whether the caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, ProfNetError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
