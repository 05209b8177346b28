//! Validation modes and outcomes.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How strictly validator failures are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidateMode {
    /// Every failure aborts the build
    #[default]
    Full,

    /// Known-safe failures are logged and skipped
    Relaxed,

    /// The validator is never run
    Off,
}

impl ValidateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidateMode::Full => "full",
            ValidateMode::Relaxed => "relaxed",
            ValidateMode::Off => "off",
        }
    }
}

impl std::fmt::Display for ValidateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(ValidateMode::Full),
            "relaxed" => Ok(ValidateMode::Relaxed),
            "off" => Ok(ValidateMode::Off),
            other => Err(format!(
                "unknown validate mode '{}' (expected full, relaxed or off)",
                other
            )),
        }
    }
}

/// Something that gets validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// One input content file
    File(PathBuf),

    /// The assembled bundle
    Bundle(PathBuf),
}

impl Artifact {
    pub fn path(&self) -> &Path {
        match self {
            Artifact::File(path) | Artifact::Bundle(path) => path,
        }
    }

    /// Short label used in log lines, e.g. `file` or `bundle`
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::File(_) => "file",
            Artifact::Bundle(_) => "bundle",
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.path().display())
    }
}

/// Classification of one validator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Ok,
    Ignored { reason: String },
    Fatal { diagnostic: String },
}

impl ValidationOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ValidationOutcome::Fatal { .. })
    }
}
