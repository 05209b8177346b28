//! Validation gate: runs the validator and classifies its verdict.
//!
//! | mode    | pass | fail                          | validator missing |
//! |---------|------|-------------------------------|-------------------|
//! | full    | Ok   | Fatal                         | error             |
//! | relaxed | Ok   | Ignored if a rule matches, else Fatal | Ok + warning |
//! | off     | Ok   | (never runs)                  | (never runs)      |

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::adapters::{OracleError, ValidatorOracle};
use crate::domain::{Artifact, ValidateMode, ValidationOutcome};
use crate::error::{BuildError, BuildResult};

use super::ignore::IgnoreRules;
use super::side_log::{EntryTag, SideLog};

pub struct ValidationGate {
    mode: ValidateMode,
    rules: IgnoreRules,
    oracle: Arc<dyn ValidatorOracle>,
    side_log: SideLog,
}

impl ValidationGate {
    pub fn new(
        mode: ValidateMode,
        rules: IgnoreRules,
        oracle: Arc<dyn ValidatorOracle>,
        side_log: SideLog,
    ) -> Self {
        Self {
            mode,
            rules,
            oracle,
            side_log,
        }
    }

    pub fn mode(&self) -> ValidateMode {
        self.mode
    }

    /// Validate one content file
    pub async fn validate_file(&self, path: &Path) -> BuildResult<ValidationOutcome> {
        self.check(&Artifact::File(path.to_path_buf())).await
    }

    /// Validate the assembled bundle
    pub async fn validate_bundle(&self, path: &Path) -> BuildResult<ValidationOutcome> {
        self.check(&Artifact::Bundle(path.to_path_buf())).await
    }

    /// Returns `Err` only when the validator cannot run at all; a failing
    /// verdict is `Ok(ValidationOutcome::Fatal)`.
    async fn check(&self, artifact: &Artifact) -> BuildResult<ValidationOutcome> {
        if self.mode == ValidateMode::Off {
            debug!("[validate/off] skip {}", artifact);
            return Ok(ValidationOutcome::Ok);
        }

        let report = match self.oracle.validate(artifact.path()).await {
            Ok(report) => report,
            Err(OracleError::Unavailable(binary)) => {
                if self.mode == ValidateMode::Full {
                    return Err(BuildError::ValidatorUnavailable { binary });
                }
                warn!(
                    "[validate/{}] validator not found: {}, skipping {}",
                    self.mode,
                    binary.display(),
                    artifact
                );
                return Ok(ValidationOutcome::Ok);
            }
            Err(OracleError::Io(source)) => {
                return Err(BuildError::io(artifact.path(), source));
            }
        };

        if report.passed {
            debug!("[validate/{}] ok: {}", self.mode, artifact);
            return Ok(ValidationOutcome::Ok);
        }

        if self.mode == ValidateMode::Relaxed {
            if let Some(reason) = self.rules.reason(&report.diagnostic) {
                self.side_log
                    .append(EntryTag::Ignored, artifact, &report.diagnostic)
                    .await;
                warn!(
                    "[validate/relaxed] ignored known error on {} ({}; details in side log)",
                    artifact, reason
                );
                return Ok(ValidationOutcome::Ignored { reason });
            }
        }

        self.side_log
            .append(EntryTag::Fatal, artifact, &report.diagnostic)
            .await;
        error!("[validate/{}] failed: {}", self.mode, artifact);
        Ok(ValidationOutcome::Fatal {
            diagnostic: report.diagnostic,
        })
    }
}
