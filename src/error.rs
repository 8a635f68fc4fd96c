//! Centralized error handling for driftwatch.
//!
//! Only genuine misconfiguration and data-access failures surface as errors.
//! Numerically degenerate inputs (empty samples, zero variance, all-missing
//! columns) never do: the affected statistic is reported as `NaN` and the
//! computation carries on.
//!
//! ```
//! use driftwatch::error::DriftwatchError;
//!
//! fn describe(err: &DriftwatchError) -> &'static str {
//!     match err {
//!         DriftwatchError::Config(_) => "fix the call options",
//!         DriftwatchError::DataProcessing(_) => "check the snapshot columns",
//!         _ => "unexpected failure",
//!     }
//! }
//! # let _ = describe(&DriftwatchError::Config("no model".to_owned()));
//! ```
//!
//! The [`ResultExt`] trait adds `.context()` to any `Result` whose error can be
//! converted into a [`DriftwatchError`].

use std::fmt;

/// Main error type for driftwatch operations.
#[derive(Debug)]
pub enum DriftwatchError {
    /// I/O errors (settings files, log directories)
    Io(std::io::Error),

    /// Data access errors (missing columns, failed casts)
    DataProcessing(String),

    /// Invalid options or a missing required collaborator
    Config(String),

    /// The externally supplied multivariate scorer failed or misbehaved
    Model(String),

    /// The artifact sink refused to persist a table
    Artifact(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for DriftwatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Model(msg) => write!(f, "Model scoring error: {msg}"),
            Self::Artifact(msg) => write!(f, "Artifact error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for DriftwatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DriftwatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for DriftwatchError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for DriftwatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for DriftwatchError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

/// Result type alias for driftwatch operations.
pub type Result<T> = std::result::Result<T, DriftwatchError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped with `msg`.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped with the closure's message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DriftwatchError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: DriftwatchError = e.into();
            DriftwatchError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: DriftwatchError = e.into();
            DriftwatchError::Other(format!("{}: {}", f(), err))
        })
    }
}
