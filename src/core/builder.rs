//! Bundle build pipeline.
//!
//! Coordinates discovery, loading, validation, merging and writing. All
//! running state lives in one [`BundleAccumulator`] owned by the build; files
//! are processed strictly one at a time.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::adapters::{TimestampOracle, ValidatorOracle};
use crate::domain::{
    Artifact, Bundle, BundleMetadata, ContentKind, ContentUnit, PreviousMetadata, ValidateMode,
    ValidationOutcome, METADATA_KEY,
};
use crate::error::{BuildError, BuildResult};

use super::discovery::discover;
use super::gate::ValidationGate;
use super::ignore::IgnoreRules;
use super::loader::load_unit;
use super::merge::ContentMerger;
use super::reconcile::{load_previous_metadata, MetadataReconciler};
use super::side_log::SideLog;
use super::writer::BundleWriter;

/// Everything a build needs to know, already resolved
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Directory the category roots are relative to
    pub project_dir: PathBuf,

    /// Category roots, in merge order
    pub roots: Vec<String>,

    /// Bundle output path
    pub output: PathBuf,

    pub validate_mode: ValidateMode,

    /// Extra ignore patterns, `;;` or `||` separated
    pub ignore_patterns: String,

    /// Side log path; `None` disables it
    pub side_log: Option<PathBuf>,

    /// Key of the metadata block in the written bundle
    pub meta_key: String,
}

impl BuildSettings {
    /// Settings with the default roots and output under `project_dir`
    pub fn for_project(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        Self {
            output: project_dir.join(crate::config::DEFAULT_OUTPUT),
            project_dir,
            roots: crate::config::default_roots(),
            validate_mode: ValidateMode::default(),
            ignore_patterns: String::new(),
            side_log: Some(SideLog::default_path()),
            meta_key: METADATA_KEY.to_string(),
        }
    }
}

/// Running bundle state, threaded through every fold
#[derive(Debug, Default)]
pub struct BundleAccumulator {
    reconciler: MetadataReconciler,
    merger: ContentMerger,
    files_merged: usize,
}

impl BundleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one accepted unit and its externally known last-modified time
    pub fn fold_unit(&mut self, unit: &ContentUnit, last_modified: Option<i64>) {
        if let Some(meta) = unit.metadata() {
            self.reconciler.fold_unit_metadata(meta);
        }
        if let Some(ts) = last_modified {
            self.reconciler.fold_external_timestamp(ts);
        }
        self.merger.merge_unit(unit);
        self.files_merged += 1;
    }

    pub fn files_merged(&self) -> usize {
        self.files_merged
    }

    /// Finalize metadata and assemble the bundle
    pub fn finish(self, previous: Option<&PreviousMetadata>, now: i64) -> Bundle {
        Bundle {
            metadata: self.reconciler.finalize(previous, now),
            content: self.merger.into_content(),
        }
    }
}

/// Summary of a successful build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output: PathBuf,
    pub files_merged: usize,

    /// Files whose validation failure was ignored in relaxed mode
    pub files_ignored: usize,

    pub metadata: BundleMetadata,

    /// Record counts for every kind present in the bundle
    pub record_counts: Vec<(ContentKind, usize)>,
}

/// Drives one build
pub struct BundleBuilder {
    settings: BuildSettings,
    validator: Arc<dyn ValidatorOracle>,
    timestamps: Arc<dyn TimestampOracle>,
}

impl BundleBuilder {
    pub fn new(
        settings: BuildSettings,
        validator: Arc<dyn ValidatorOracle>,
        timestamps: Arc<dyn TimestampOracle>,
    ) -> Self {
        Self {
            settings,
            validator,
            timestamps,
        }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Run the whole pipeline. Nothing is written unless every step succeeds.
    #[instrument(skip(self), fields(mode = %self.settings.validate_mode, output = %self.settings.output.display()))]
    pub async fn build(&self) -> BuildResult<BuildReport> {
        let settings = &self.settings;
        // One clock reading per build
        let now = Utc::now().timestamp();

        let rules = IgnoreRules::parse(&settings.ignore_patterns)?;
        let side_log = settings
            .side_log
            .as_ref()
            .map_or_else(SideLog::disabled, |path| SideLog::new(path.clone()));
        let gate = ValidationGate::new(
            settings.validate_mode,
            rules,
            Arc::clone(&self.validator),
            side_log,
        );

        let previous = load_previous_metadata(&settings.output, &settings.meta_key).await;
        let files = discover(&settings.project_dir, &settings.roots)?;
        info!(files = files.len(), "Building bundle");

        let mut acc = BundleAccumulator::new();
        let mut files_ignored = 0;
        for path in files {
            let unit = load_unit(&path).await?;

            match gate.validate_file(&path).await? {
                ValidationOutcome::Ok => {}
                ValidationOutcome::Ignored { .. } => files_ignored += 1,
                ValidationOutcome::Fatal { diagnostic } => {
                    return Err(BuildError::ValidationFailure {
                        artifact: Artifact::File(path),
                        diagnostic,
                    });
                }
            }

            let last_modified = self.timestamps.last_modified(&path).await;
            acc.fold_unit(&unit, last_modified);
        }

        let files_merged = acc.files_merged();
        let bundle = acc.finish(previous.as_ref(), now);

        let writer = BundleWriter::new(settings.meta_key.as_str());
        let staged = writer.stage(&bundle, &settings.output).await?;
        let outcome = match gate.validate_bundle(staged.path()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                staged.discard().await;
                return Err(e);
            }
        };
        if let ValidationOutcome::Fatal { diagnostic } = outcome {
            staged.discard().await;
            return Err(BuildError::ValidationFailure {
                artifact: Artifact::Bundle(settings.output.clone()),
                diagnostic,
            });
        }
        staged.commit().await?;

        let record_counts = ContentKind::ALL
            .into_iter()
            .map(|kind| (kind, bundle.record_count(kind)))
            .filter(|(kind, _)| bundle.content.contains_key(kind.as_str()))
            .collect();

        info!(
            files_merged,
            files_ignored,
            edition = %bundle.metadata.edition,
            "Bundle written"
        );

        Ok(BuildReport {
            output: settings.output.clone(),
            files_merged,
            files_ignored,
            metadata: bundle.metadata,
            record_counts,
        })
    }
}
