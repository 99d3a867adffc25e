//! Reaper error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that abort a reaper cycle.
///
/// The next cycle starts over, so a failed cycle only delays cleanup.
#[derive(Debug, Error)]
pub enum ReaperError {
    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for reaper operations.
pub type Result<T> = std::result::Result<T, ReaperError>;
