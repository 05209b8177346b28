//! Validator adapter for `test-json-brew`.
//!
//! Runs the validator as a subprocess with the file path as its only
//! argument. Exit status 0 is a pass; anything else is a failure whose
//! diagnostic is the combined stdout and stderr.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{OracleError, OracleReport, ValidatorOracle};

/// Name of the validator binary shipped by 5etools-utils
pub const VALIDATOR_BIN: &str = "test-json-brew";

/// `test-json-brew` adapter using subprocess mode
pub struct BrewValidator {
    /// Path to the validator binary
    binary_path: PathBuf,
}

impl BrewValidator {
    /// Use the validator installed under `<project>/node_modules/.bin`
    pub fn for_project(project_dir: &Path) -> Self {
        Self {
            binary_path: default_binary(project_dir),
        }
    }

    /// Use a validator at a custom path
    pub fn with_binary_path(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

/// Location of the validator inside a project's npm install
pub fn default_binary(project_dir: &Path) -> PathBuf {
    let name = if cfg!(windows) {
        format!("{}.cmd", VALIDATOR_BIN)
    } else {
        VALIDATOR_BIN.to_string()
    };
    project_dir.join("node_modules").join(".bin").join(name)
}

#[async_trait]
impl ValidatorOracle for BrewValidator {
    fn name(&self) -> &str {
        VALIDATOR_BIN
    }

    async fn validate(&self, path: &Path) -> Result<OracleReport, OracleError> {
        if !self.binary_path.exists() {
            return Err(OracleError::Unavailable(self.binary_path.clone()));
        }

        debug!(validator = %self.binary_path.display(), file = %path.display(), "running validator");

        let output = Command::new(&self.binary_path)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if output.status.success() {
            return Ok(OracleReport::pass());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(OracleReport::fail(format!("{}\n{}", stdout, stderr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binary_location() {
        let binary = default_binary(Path::new("/work/brew"));
        assert!(binary.starts_with("/work/brew/node_modules/.bin"));
        assert!(binary
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(VALIDATOR_BIN));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let validator = BrewValidator::with_binary_path("/definitely/not/here/test-json-brew");
        assert_eq!(validator.name(), "test-json-brew");

        let result = validator.validate(Path::new("a.json")).await;
        assert!(matches!(result, Err(OracleError::Unavailable(_))));
    }

    // Runs against a real subprocess: see tests/validator.rs
}
