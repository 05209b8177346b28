//! Build errors.
//!
//! Every variant is fatal to the build. Non-fatal conditions (ignored
//! validation failures, a missing validator outside `full` mode) never
//! surface as errors; they are logged and the build continues.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::Artifact;

/// Fatal build conditions
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Malformed content file {path}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    #[error("Validator not found: {binary}")]
    ValidatorUnavailable { binary: PathBuf },

    #[error("Validation failed for {artifact}")]
    ValidationFailure { artifact: Artifact, diagnostic: String },

    #[error("Invalid ignore pattern '{token}': {source}")]
    InvalidIgnorePattern {
        token: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Full validator output, for failures that carry one
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            BuildError::ValidationFailure { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
