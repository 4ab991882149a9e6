//! Error types for session ingestion.
//!
//! All errors implement the `std::error::Error` trait and carry structured
//! context with `#[source]` chaining to the underlying failure.
//!
//! ## Error Categories
//!
//! - **Provider Errors**: the session data provider failed to deliver data
//! - **Persistence Errors**: an upsert or commit against the sink failed
//! - **Progress Errors**: the advisory progress sink rejected an update
//!
//! Missing or degenerate *input* (a lap without a compound, a telemetry trace
//! with too few samples) is never an error; each derivation component defines
//! a skip/omit policy for it instead.
//!
//! ## Recovery
//!
//! Ingestion is idempotent, so every external failure is safe to handle by
//! re-running the session from scratch:
//!
//! ```rust
//! use paddock::IngestError;
//!
//! let error = IngestError::provider_failed("timing service unreachable");
//! if error.is_retryable() {
//!     println!("Safe to re-run this session");
//! }
//! ```

use thiserror::Error;

/// Result type alias for ingestion operations.
pub type Result<T, E = IngestError> = std::result::Result<T, E>;

/// Main error type for session ingestion.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IngestError {
    #[error("Session data provider failed: {context}")]
    Provider {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Persistence sink failed during {operation}")]
    Persistence {
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Progress sink rejected update for job {job_id}")]
    Progress {
        job_id: i64,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl IngestError {
    /// Returns whether this error is safe to handle by re-running ingestion.
    ///
    /// All three variants are external failures and the upsert design makes
    /// re-ingestion converge, so this currently always returns true; it is
    /// kept as a method so future permanent variants classify themselves.
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestError::Provider { .. } => true,
            IngestError::Persistence { .. } => true,
            IngestError::Progress { .. } => true,
        }
    }

    /// Helper constructor for provider errors.
    pub fn provider_failed(context: impl Into<String>) -> Self {
        IngestError::Provider { context: context.into(), source: None }
    }

    /// Helper constructor for provider errors with an underlying cause.
    pub fn provider_failed_with_source(
        context: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        IngestError::Provider { context: context.into(), source: Some(source) }
    }

    /// Helper constructor for persistence errors.
    pub fn persistence_failed(operation: impl Into<String>) -> Self {
        IngestError::Persistence { operation: operation.into(), source: None }
    }

    /// Helper constructor for persistence errors with an underlying cause.
    pub fn persistence_failed_with_source(
        operation: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        IngestError::Persistence { operation: operation.into(), source: Some(source) }
    }

    /// Helper constructor for progress sink errors.
    pub fn progress_failed(
        job_id: i64,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        IngestError::Progress { job_id, source: Some(source) }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for IngestError {
    fn from(err: sqlx::Error) -> Self {
        IngestError::Persistence {
            operation: "database statement".to_string(),
            source: Some(Box::new(err)),
        }
    }
}
