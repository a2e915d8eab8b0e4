//! Error types for scoring and record operations.
//!
//! `ScoringError` describes failures of a [`MatchEngine`](crate::traits::MatchEngine);
//! `AnalysisError` is what every service and store operation surfaces to callers.

use thiserror::Error;

/// Errors that can occur while asking a match engine for a score.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The scoring service did not answer in time.
    #[error("scoring request timed out after {0}s")]
    Timeout(u64),

    /// The scoring service could not be reached.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The scoring service answered with a non-success status.
    #[error("scoring API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The scoring service answered with a body we could not use.
    #[error("malformed scoring response: {0}")]
    MalformedResponse(String),
}

impl ScoringError {
    /// Returns `true` if repeating the same request could plausibly succeed.
    ///
    /// Nothing in this workspace retries automatically; callers decide.
    pub fn is_transient(&self) -> bool {
        match self {
            ScoringError::Timeout(_) | ScoringError::NetworkError(_) => true,
            ScoringError::ApiError { status, .. } => *status == 429 || *status >= 500,
            ScoringError::MalformedResponse(_) => false,
        }
    }
}

/// Errors surfaced by analysis, versioning and lifecycle operations.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The record, note or id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A required text was blank or otherwise unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The active match engine failed.
    #[error("scoring unavailable: {0}")]
    ScoringUnavailable(#[from] ScoringError),

    /// A version number could not be assigned without clashing with a concurrent writer.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl AnalysisError {
    pub fn not_found_record(id: i64) -> Self {
        AnalysisError::NotFound(format!("analysis record {id}"))
    }
}

/// Store implementations work with `anyhow` internally. An error chain that
/// already carries an `AnalysisError` keeps its kind; anything else is a
/// storage failure.
impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AnalysisError>() {
            Ok(kind) => kind,
            Err(other) => AnalysisError::Storage(format!("{other:#}")),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
