//! Error types for the storeaudit pipeline.
//!
//! Errors are grouped by the stage that raised them so that the driver can
//! decide what is fatal:
//!
//! - [`StoreAuditError::Load`] and [`StoreAuditError::Export`] abort a run.
//! - [`StoreAuditError::ReportWrite`] is logged and the run still succeeds.
//!
//! Validation problems are never errors; they are reported as findings.
//!
//! ```
//! use storeaudit::error::StoreAuditError;
//!
//! fn describe(err: &StoreAuditError) -> &'static str {
//!     match err {
//!         StoreAuditError::Load { .. } => "loader",
//!         StoreAuditError::Export { .. } => "exporter",
//!         StoreAuditError::ReportWrite { .. } => "report",
//!         _ => "other",
//!     }
//! }
//! ```
//!
//! The [`ResultExt`] trait adds `.context()` to any result whose error
//! converts into [`StoreAuditError`]:
//!
//! ```no_run
//! use storeaudit::error::ResultExt as _;
//!
//! fn read_raw() -> storeaudit::error::Result<Vec<u8>> {
//!     std::fs::read("data/input.csv").context("Failed to read input")
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for storeaudit operations.
#[derive(Debug)]
pub enum StoreAuditError {
    /// The input table is missing or could not be decoded/parsed.
    Load { path: PathBuf, reason: String },

    /// Writing the enhanced table failed.
    Export { path: PathBuf, reason: String },

    /// Writing the text report failed.
    ReportWrite { path: PathBuf, reason: String },

    /// Data processing errors (Polars, casting, aggregation)
    DataProcessing(String),

    /// Configuration errors
    Config(String),

    /// I/O errors outside the load/export boundaries
    Io(std::io::Error),

    /// Generic error with context
    Other(String),
}

impl StoreAuditError {
    pub fn load(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn export(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Export {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn report_write(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::ReportWrite {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Whether the driver must stop the run on this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ReportWrite { .. })
    }
}

impl fmt::Display for StoreAuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { path, reason } => {
                write!(f, "Load failed for {}: {reason}", path.display())
            }
            Self::Export { path, reason } => {
                write!(f, "Export failed for {}: {reason}", path.display())
            }
            Self::ReportWrite { path, reason } => {
                write!(f, "Report write failed for {}: {reason}", path.display())
            }
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StoreAuditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreAuditError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for StoreAuditError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for StoreAuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for StoreAuditError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

/// Result type alias for storeaudit operations.
pub type Result<T> = std::result::Result<T, StoreAuditError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<StoreAuditError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: StoreAuditError = e.into();
            StoreAuditError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: StoreAuditError = e.into();
            StoreAuditError::Other(format!("{}: {}", f(), err))
        })
    }
}
