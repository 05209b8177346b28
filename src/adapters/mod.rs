//! Adapter interfaces for external tools.
//!
//! The pipeline only talks to the outside world through two seams: a schema
//! validator and a source of last-modified times. Both are trait objects so
//! tests can substitute stubs.

pub mod timestamps;
pub mod validator;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub use timestamps::{GitTimestamps, MtimeTimestamps, NoTimestamps};
pub use validator::BrewValidator;

/// Result of one validator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleReport {
    /// Whether the validator exited successfully
    pub passed: bool,

    /// Captured stdout and stderr, joined by a newline
    pub diagnostic: String,
}

impl OracleReport {
    pub fn pass() -> Self {
        Self {
            passed: true,
            diagnostic: String::new(),
        }
    }

    pub fn fail(diagnostic: impl Into<String>) -> Self {
        Self {
            passed: false,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Errors from invoking a validator
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Validator not found: {0}")]
    Unavailable(PathBuf),

    #[error("Failed to run validator: {0}")]
    Io(#[from] std::io::Error),
}

/// Schema validator for content files and bundles
#[async_trait]
pub trait ValidatorOracle: Send + Sync {
    /// Human-readable validator name
    fn name(&self) -> &str;

    /// Validate one file
    async fn validate(&self, path: &Path) -> Result<OracleReport, OracleError>;
}

/// Best-known last-modified time for a file
#[async_trait]
pub trait TimestampOracle: Send + Sync {
    /// Unix seconds, or `None` when nothing is known
    async fn last_modified(&self, path: &Path) -> Option<i64>;
}
